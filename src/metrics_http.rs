//! A minimal `/metrics` HTTP endpoint.
//!
//! Mirrors `original_source/kafka.go`'s `/metrics/reader` and
//! `/metrics/writer` handlers (`SPEC_FULL.md` §4.8): a single route
//! returning a small JSON document. None of the five retrieved repos pull in
//! a web framework for a surface this small, so this is a hand-rolled
//! HTTP/1.1 responder over `TcpListener` rather than a dependency.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde::Serialize;

use crate::dispatcher::EngineStats;

/// Snapshot of dispatcher counters, updated by the steady-state loop and
/// read by the metrics thread. `Mutex` rather than atomics because
/// `per_rule` is a `Vec` — this is read at most a few times a second, so the
/// lock is never contended on the hot path.
pub type SharedStats = Arc<Mutex<EngineStats>>;

#[derive(Serialize)]
struct MetricsResponse<'a> {
    records_processed: u64,
    alarms_emitted: u64,
    elapsed_secs: f64,
    rules: Vec<RuleMetrics<'a>>,
}

#[derive(Serialize)]
struct RuleMetrics<'a> {
    name: &'a str,
    exec_count: u64,
    avg_exec_micros: u128,
}

/// Serve `/metrics` on `port` until `shutdown` is set. Runs on its own
/// thread; spawned from `main.rs` alongside the dispatch loop.
pub fn serve(port: u16, stats: SharedStats, shutdown: Arc<AtomicBool>) -> std::io::Result<thread::JoinHandle<()>> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    listener.set_nonblocking(true)?;

    Ok(thread::spawn(move || {
        while !shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, _)) => {
                    if let Err(err) = handle_connection(stream, &stats) {
                        tracing::warn!(error = %err, "metrics connection failed");
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(std::time::Duration::from_millis(50));
                }
                Err(err) => tracing::warn!(error = %err, "metrics listener accept failed"),
            }
        }
    }))
}

fn handle_connection(mut stream: TcpStream, stats: &SharedStats) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    // Drain remaining header lines; this endpoint has no request body to read.
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 || line == "\r\n" {
            break;
        }
    }

    let body = {
        let snapshot = stats.lock().expect("metrics mutex poisoned");
        render(&snapshot)
    };

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())
}

fn render(stats: &EngineStats) -> String {
    let response = MetricsResponse {
        records_processed: stats.records_processed,
        alarms_emitted: stats.alarms_emitted,
        elapsed_secs: stats.elapsed.as_secs_f64(),
        rules: stats
            .per_rule
            .iter()
            .map(|(name, count, avg)| RuleMetrics { name, exec_count: *count, avg_exec_micros: *avg })
            .collect(),
    };
    serde_json::to_string(&response).expect("metrics response is always serializable")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn render_produces_expected_json_shape() {
        let stats = EngineStats {
            records_processed: 3,
            alarms_emitted: 1,
            elapsed: Duration::from_secs(1),
            per_rule: vec![("r1".to_string(), 3, 42)],
        };
        let body = render(&stats);
        assert!(body.contains("\"records_processed\":3"));
        assert!(body.contains("\"name\":\"r1\""));
        assert!(body.contains("\"avg_exec_micros\":42"));
    }
}
