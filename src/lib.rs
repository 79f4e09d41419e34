//! `fieldwatch`: a low-latency streaming rule-evaluation engine.
//!
//! Records flow in from a [`record::RecordSource`], are matched against a
//! configured set of named variables (regex or Aho-Corasick), evaluated
//! through a short-circuiting RPN rule engine, and on fire produce an
//! [`record::AlarmEnvelope`] handed to a [`record::RecordSink`].
//! `src/main.rs` wires this library into a runnable binary.

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod metrics_http;
pub mod record;

pub use dispatcher::{Dispatcher, EngineStats};
pub use engine::Engine;
pub use error::EngineError;

use std::path::PathBuf;

/// Control-surface values assembled once at startup from CLI flags and
/// never mutated afterward.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub config_path: PathBuf,
    /// `-` means stdin.
    pub input: String,
    /// `-` means stdout.
    pub output: String,
    pub group: Option<String>,
    pub metrics_port: u16,
    pub debug: bool,
}
