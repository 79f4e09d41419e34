//! The per-record driver.
//!
//! Runs every rule against each inbound record in declaration order: a
//! single serial loop, no intra-record parallelism, rules and variables
//! read-only except for each rule's own profiling counters.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::engine::{evaluator, Engine};
use crate::record::{AlarmEnvelope, Record, RecordSink, RecordSource};

/// The shutdown report surfaced at process exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStats {
    pub records_processed: u64,
    pub alarms_emitted: u64,
    pub elapsed: Duration,
    /// `(rule name, invocation count, average microseconds)`, in rule
    /// declaration order.
    pub per_rule: Vec<(String, u64, u128)>,
}

/// Drives an [`Engine`] against a [`RecordSource`]/[`RecordSink`] pair.
pub struct Dispatcher<S, K> {
    engine: Engine,
    source: S,
    sink: K,
    debug: bool,
    records_processed: u64,
    alarms_emitted: u64,
    started: Instant,
}

impl<S: RecordSource, K: RecordSink> Dispatcher<S, K> {
    pub fn new(engine: Engine, source: S, sink: K, debug: bool) -> Self {
        Dispatcher { engine, source, sink, debug, records_processed: 0, alarms_emitted: 0, started: Instant::now() }
    }

    /// Run until the source signals end-of-stream or `shutdown` is set.
    /// `shutdown` is checked once per loop iteration, after the in-flight
    /// record finishes evaluating against every rule.
    pub fn run(&mut self, shutdown: &Arc<AtomicBool>) -> EngineStats {
        self.run_with_live_stats(shutdown, None)
    }

    /// Same as [`Dispatcher::run`], additionally publishing a stats snapshot
    /// into `live_stats` after every record so the metrics endpoint can serve
    /// up-to-date counters while the loop is still running.
    pub fn run_with_live_stats(&mut self, shutdown: &Arc<AtomicBool>, live_stats: Option<&Arc<Mutex<EngineStats>>>) -> EngineStats {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown signal observed, draining");
                break;
            }
            match self.source.recv() {
                Ok(Some(record)) => {
                    self.dispatch(&record);
                    if let Some(shared) = live_stats {
                        *shared.lock().expect("stats mutex poisoned") = self.stats();
                    }
                }
                Ok(None) => break,
                Err(err) => tracing::warn!(error = %err, "dropping record that failed to decode"),
            }
        }
        self.stats()
    }

    fn dispatch(&mut self, record: &Record) {
        self.records_processed += 1;
        let (rules, variables) = self.engine.rules_and_variables_mut();

        for rule in rules.iter_mut() {
            let start = Instant::now();
            let outcome = evaluator::evaluate(&rule.condition, record, variables);
            rule.record_invocation(start.elapsed());

            if !outcome.fired {
                continue;
            }
            self.alarms_emitted += 1;
            let alarm = AlarmEnvelope::new(record, &rule.name, &rule.alarm_text, &outcome.fragments);

            if self.debug {
                tracing::info!(?alarm, "debug mode: alarm suppressed from sink");
                continue;
            }
            if let Err(err) = self.sink.send(&alarm) {
                tracing::warn!(error = %err, rule = %rule.name, "downstream write failed");
            }
        }
    }

    fn stats(&self) -> EngineStats {
        let per_rule = self.engine.rules.iter().map(|r| (r.name.clone(), r.exec_count, r.avg_exec_micros())).collect();
        EngineStats {
            records_processed: self.records_processed,
            alarms_emitted: self.alarms_emitted,
            elapsed: self.started.elapsed(),
            per_rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::record::channel::{ChannelSink, ChannelSource};
    use serde_json::json;
    use std::path::Path;
    use std::sync::mpsc::channel;

    fn engine(cfg: &str) -> Engine {
        let raw = config::lex(cfg, Path::new("test.cfg")).unwrap();
        Engine::compile(raw).unwrap()
    }

    #[test]
    fn fired_rule_emits_alarm_with_expected_summary_and_fragments() {
        let cfg = "var\nip = \\d+\\.\\d+\\.\\d+\\.\\d+\nendvar\n\nrule r1\nif src=ip\nalarm suspicious source\nendrule\n";
        let (rec_tx, rec_rx) = channel();
        let (alarm_tx, alarm_rx) = channel();
        let mut dispatcher = Dispatcher::new(engine(cfg), ChannelSource::new(rec_rx), ChannelSink::new(alarm_tx), false);

        rec_tx.send(Record::from([("src".to_string(), json!("hit 10.0.0.1 here"))])).unwrap();
        drop(rec_tx);

        let shutdown = Arc::new(AtomicBool::new(false));
        let stats = dispatcher.run(&shutdown);

        assert_eq!(stats.records_processed, 1);
        assert_eq!(stats.alarms_emitted, 1);
        assert_eq!(stats.per_rule, vec![("r1".to_string(), 1, stats.per_rule[0].2)]);

        let alarm = alarm_rx.recv().unwrap();
        assert_eq!(alarm.summary, "rule r1 fired: suspicious source");
        assert_eq!(alarm.description, "10.0.0.1");
    }

    #[test]
    fn non_firing_record_still_updates_profiling_counters() {
        let cfg = "var\nip = \\d+\\.\\d+\\.\\d+\\.\\d+\nendvar\n\nrule r1\nif src=ip\nalarm x\nendrule\n";
        let (rec_tx, rec_rx) = channel();
        let (alarm_tx, alarm_rx) = channel();
        let mut dispatcher = Dispatcher::new(engine(cfg), ChannelSource::new(rec_rx), ChannelSink::new(alarm_tx), false);

        rec_tx.send(Record::from([("src".to_string(), json!("no address"))])).unwrap();
        drop(rec_tx);

        let shutdown = Arc::new(AtomicBool::new(false));
        let stats = dispatcher.run(&shutdown);

        assert_eq!(stats.alarms_emitted, 0);
        assert_eq!(stats.per_rule[0].1, 1);
        assert!(alarm_rx.try_recv().is_err());
    }

    #[test]
    fn debug_mode_suppresses_sink_delivery() {
        let cfg = "var\nip = \\d+\\.\\d+\\.\\d+\\.\\d+\nendvar\n\nrule r1\nif src=ip\nalarm x\nendrule\n";
        let (rec_tx, rec_rx) = channel();
        let (alarm_tx, alarm_rx) = channel();
        let mut dispatcher = Dispatcher::new(engine(cfg), ChannelSource::new(rec_rx), ChannelSink::new(alarm_tx), true);

        rec_tx.send(Record::from([("src".to_string(), json!("10.0.0.1"))])).unwrap();
        drop(rec_tx);

        let shutdown = Arc::new(AtomicBool::new(false));
        let stats = dispatcher.run(&shutdown);

        assert_eq!(stats.alarms_emitted, 1);
        assert!(alarm_rx.try_recv().is_err());
    }
}
