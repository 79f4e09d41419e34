//! Operand parsing: the leaves of a rule condition.
//!
//! An operand token has the shape `field[!]=variable` (`SPEC_FULL.md` §4.3).
//! This module only *parses* that shape and resolves the variable name
//! against the compiled variable table that exists at parse time — the
//! `variable` field retained on [`Operand`] is purely for evaluation-time
//! lookups, never the compiled matcher itself, so operands stay cheap to
//! clone and carry around in a condition.

use std::collections::HashMap;

use crate::engine::variable::CompiledVariable;
use crate::error::CompileError;

/// The comparison an operand applies once its variable has been matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Fires when the variable matches somewhere in the field.
    Equal,
    /// Fires when the variable does *not* match anywhere in the field.
    NotEqual,
}

/// A single leaf of a rule condition: `field[!]=variable`.
#[derive(Debug, Clone)]
pub struct Operand {
    pub field: String,
    pub variable: String,
    pub operator: Operator,
}

impl Operand {
    /// Parse one whitespace-delimited token into an operand, validating that
    /// `variable` is a known name in `variables`.
    pub fn parse(
        token: &str,
        rule: &str,
        variables: &HashMap<String, CompiledVariable>,
    ) -> Result<Self, CompileError> {
        let (lhs, variable) = token.split_once('=').ok_or_else(|| CompileError::MalformedOperand {
            rule: rule.to_string(),
            token: token.to_string(),
        })?;

        let (field, operator) = match lhs.strip_suffix('!') {
            Some(field) => (field, Operator::NotEqual),
            None => (lhs, Operator::Equal),
        };

        if field.is_empty() || variable.is_empty() {
            return Err(CompileError::MalformedOperand { rule: rule.to_string(), token: token.to_string() });
        }

        if !variables.contains_key(variable) {
            return Err(CompileError::UnknownVariable { rule: rule.to_string(), variable: variable.to_string() });
        }

        Ok(Operand { field: field.to_string(), variable: variable.to_string(), operator })
    }
}
