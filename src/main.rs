use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use clap::Parser;
use fieldwatch::record::line_json::{LineJsonSink, LineJsonSource};
use fieldwatch::{dispatcher::EngineStats, metrics_http, Dispatcher, Engine, EngineConfig};

/// A low-latency streaming rule-evaluation engine.
#[derive(Parser, Debug)]
#[command(name = "fieldwatch", version, about)]
struct Cli {
    /// Rule-file path.
    #[arg(long, default_value = "textsearch.cfg")]
    config: PathBuf,

    /// Line-delimited JSON input path, or `-` for stdin.
    #[arg(long, default_value = "-")]
    input: String,

    /// Line-delimited JSON output path, or `-` for stdout.
    #[arg(long, default_value = "-")]
    output: String,

    /// Consumer group identifier, carried as pass-through metadata only.
    #[arg(long)]
    group: Option<String>,

    /// Port for the `/metrics` HTTP endpoint.
    #[arg(long, default_value_t = 9090)]
    metrics_port: u16,

    /// Suppress alarm emission and log the alarm payload instead.
    #[arg(long)]
    debug: bool,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = EngineConfig {
        config_path: cli.config,
        input: cli.input,
        output: cli.output,
        group: cli.group,
        metrics_port: cli.metrics_port,
        debug: cli.debug,
    };

    std::process::exit(run(config));
}

fn run(config: EngineConfig) -> i32 {
    tracing::info!(config_path = %config.config_path.display(), "loading configuration");
    let engine = match Engine::load(&config.config_path) {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!(error = %err, "fatal: failed to load configuration");
            return 1;
        }
    };
    tracing::info!(variables = engine.variables().len(), rules = engine.rules.len(), "configuration loaded");

    let source = match open_input(&config.input) {
        Ok(source) => source,
        Err(err) => {
            tracing::error!(error = %err, path = %config.input, "fatal: failed to open input");
            return 1;
        }
    };
    let sink = match open_output(&config.output) {
        Ok(sink) => sink,
        Err(err) => {
            tracing::error!(error = %err, path = %config.output, "fatal: failed to open output");
            return 1;
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    if let Err(err) = install_signal_handler(Arc::clone(&shutdown)) {
        tracing::warn!(error = %err, "failed to install signal handler, Ctrl-C will not drain cleanly");
    }

    let live_stats = Arc::new(Mutex::new(EngineStats {
        records_processed: 0,
        alarms_emitted: 0,
        elapsed: std::time::Duration::ZERO,
        per_rule: Vec::new(),
    }));

    let metrics_handle = match metrics_http::serve(config.metrics_port, Arc::clone(&live_stats), Arc::clone(&shutdown)) {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, port = config.metrics_port, "failed to bind metrics endpoint, continuing without it");
            None
        }
    };

    let mut dispatcher = Dispatcher::new(engine, source, sink, config.debug);
    let stats = dispatcher.run_with_live_stats(&shutdown, Some(&live_stats));

    tracing::info!(
        records_processed = stats.records_processed,
        alarms_emitted = stats.alarms_emitted,
        elapsed_secs = stats.elapsed.as_secs_f64(),
        "shutdown complete"
    );
    for (name, count, avg_micros) in &stats.per_rule {
        tracing::info!(rule = %name, exec_count = count, avg_exec_micros = avg_micros, "rule profile");
    }

    shutdown.store(true, Ordering::Relaxed);
    if let Some(handle) = metrics_handle {
        let _ = handle.join();
    }

    0
}

fn open_input(path: &str) -> io::Result<LineJsonSource<Box<dyn io::Read + Send>>> {
    let reader: Box<dyn io::Read + Send> =
        if path == "-" { Box::new(io::stdin()) } else { Box::new(File::open(path)?) };
    Ok(LineJsonSource::new(reader))
}

fn open_output(path: &str) -> io::Result<LineJsonSink<Box<dyn io::Write + Send>>> {
    let writer: Box<dyn io::Write + Send> =
        if path == "-" { Box::new(io::stdout()) } else { Box::new(File::create(path)?) };
    Ok(LineJsonSink::new(writer))
}

fn install_signal_handler(shutdown: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        tracing::info!("received interrupt, shutting down after the in-flight record");
        shutdown.store(true, Ordering::Relaxed);
    })
}
