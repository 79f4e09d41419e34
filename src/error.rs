//! Error taxonomy for the rule engine.
//!
//! Errors are split by the phase in which they can occur: [`ConfigError`] and
//! [`CompileError`] are raised during load (before the steady-state loop
//! starts and are fatal), while [`EvalError`] is raised per-record and is
//! always recoverable — the dispatcher logs it and moves on to the next
//! rule. [`EngineError`] aggregates the load-time variants plus I/O for the
//! convenience of `main.rs`.

use std::path::PathBuf;

/// Errors produced while lexing the configuration file into blocks.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{path}:{line}: unclosed {block} block")]
    UnclosedBlock { path: PathBuf, line: usize, block: &'static str },

    #[error("{path}:{line}: malformed assignment (expected `name = value`)")]
    MalformedAssignment { path: PathBuf, line: usize },

    #[error("{path}:{line}: rule block is missing a name")]
    MissingRuleName { path: PathBuf, line: usize },

    #[error("{path}:{line}: unknown keyword `{keyword}` inside rule block")]
    UnknownRuleKeyword { path: PathBuf, line: usize, keyword: String },

    #[error("{path}:{line}: rule block is missing an `if` condition")]
    MissingCondition { path: PathBuf, line: usize },

    #[error("{path}:{line}: rule block is missing an `alarm` text")]
    MissingAlarmText { path: PathBuf, line: usize },

    #[error("failed to read config file {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
}

/// Errors produced while compiling variables and rule conditions.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("variable `{name}` has no patterns")]
    EmptyVariable { name: String },

    #[error("variable `{name}` has an invalid regular expression `{pattern}`: {source}")]
    PatternCompile { name: String, pattern: String, #[source] source: regex::Error },

    #[error("variable `{name}` has an invalid literal set: {source}")]
    AutomatonCompile { name: String, #[source] source: aho_corasick::BuildError },

    #[error("failed to read pattern list file {path}: {source}")]
    ListFile { path: PathBuf, #[source] source: std::io::Error },

    #[error("rule `{rule}`: malformed operand `{token}`")]
    MalformedOperand { rule: String, token: String },

    #[error("rule `{rule}`: unknown variable `{variable}`")]
    UnknownVariable { rule: String, variable: String },

    #[error("rule `{rule}`: unmatched parenthesis")]
    UnmatchedParenthesis { rule: String },

    #[error("rule `{rule}`: operator with nothing to apply to")]
    DanglingOperator { rule: String },

    #[error("rule `{rule}`: condition does not reduce to a single value ({remaining} left on the stack)")]
    MalformedExpression { rule: String, remaining: usize },
}

/// Errors produced while evaluating a rule's condition against a record.
///
/// These never abort the process: the dispatcher treats both variants as
/// "this operand does not match" and continues with the next rule.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum EvalError {
    #[error("field `{field}` referenced by the condition is not present in the record")]
    MissingField { field: String },

    #[error("field `{field}` is not a string value")]
    FieldTypeMismatch { field: String },
}

/// Errors produced by a [`crate::record::RecordSource`] or
/// [`crate::record::RecordSink`] at steady state.
///
/// Both variants are recoverable: the dispatcher logs and continues rather
/// than aborting the process.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("could not decode record: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("I/O error reading from the record source: {0}")]
    Io(#[source] std::io::Error),

    #[error("downstream write failed: {0}")]
    DownstreamWrite(#[source] std::io::Error),
}

/// Top-level error type surfaced by [`crate::Engine::load`] and `main`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
