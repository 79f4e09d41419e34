//! The compiled [`Rule`]: a name, alarm text, condition, and the per-rule
//! profiling counters the dispatcher maintains (`SPEC_FULL.md` §3, §4.5).

use std::time::Duration;

use crate::engine::condition::Condition;

/// One compiled rule, ready for repeated evaluation against records.
///
/// `exec_count` and `exec_total_time` are owned exclusively by the
/// dispatcher's serial loop; nothing else in the engine touches them
/// (`SPEC_FULL.md` §5's shared-resource policy).
#[derive(Debug)]
pub struct Rule {
    pub name: String,
    pub alarm_text: String,
    pub condition: Condition,
    pub exec_count: u64,
    pub exec_total_time: Duration,
}

impl Rule {
    pub fn new(name: String, alarm_text: String, condition: Condition) -> Self {
        Rule { name, alarm_text, condition, exec_count: 0, exec_total_time: Duration::ZERO }
    }

    /// Record one invocation's cost, regardless of whether the rule fired.
    pub fn record_invocation(&mut self, elapsed: Duration) {
        self.exec_count += 1;
        self.exec_total_time += elapsed;
    }

    /// Average evaluation time in microseconds, or 0 if never invoked.
    pub fn avg_exec_micros(&self) -> u128 {
        if self.exec_count == 0 { 0 } else { self.exec_total_time.as_micros() / self.exec_count as u128 }
    }
}
