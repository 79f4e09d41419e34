//! Rule compilation and evaluation.
//!
//! This module is the *public entry point* for the matching engine. The
//! pipeline from a loaded configuration to a ready-to-run [`Engine`] is:
//!
//! ```text
//! RawConfig (config::load)
//!   │
//!   ├─ variable::CompiledVariable::compile   (one per declared variable)
//!   │     Regex | MultiLiteral, decided by pattern count + var/list origin
//!   │
//!   └─ infix::parse                          (one per rule's `if` line)
//!         shunting-yard over operand::Operand tokens -> condition::Condition
//!               │
//!               v
//!         rule::Rule { name, alarm_text, condition, profiling }
//! ```
//!
//! At steady state, `evaluator::evaluate` walks a `Rule`'s `Condition`
//! against a decoded [`crate::record::Record`], short-circuiting `&`/`|` per
//! `SPEC_FULL.md` §4.4. The dispatcher (`crate::dispatcher`) drives this for
//! every rule, in declaration order, for every inbound record.
//!
//! ## Responsibilities by submodule
//!
//! - `variable.rs`: compiles a variable's raw patterns into a
//!   [`variable::CompiledVariable`] (regex or Aho-Corasick).
//! - `operand.rs`: parses a `field[!]=variable` token into an
//!   [`operand::Operand`], resolving the variable name against the compiled
//!   table at parse time.
//! - `infix.rs`: shunting-yard parse of a rule's infix condition into RPN.
//! - `condition.rs`: the RPN [`condition::Condition`] type and its
//!   well-formedness check.
//! - `evaluator.rs`: the short-circuiting RPN interpreter.
//! - `rule.rs`: the compiled [`rule::Rule`] plus its profiling counters.

pub mod condition;
pub mod evaluator;
pub mod infix;
pub mod operand;
pub mod rule;
pub mod variable;

use std::collections::HashMap;
use std::path::Path;

use crate::config::{self, RawConfig};
use crate::error::EngineError;

pub use condition::{Condition, ConditionToken};
pub use evaluator::EvalOutcome;
pub use operand::{Operand, Operator};
pub use rule::Rule;
pub use variable::CompiledVariable;

/// The compiled, immutable-after-load matching engine: a variable table and
/// a rule list, in declaration order.
///
/// `rules` is `mut` only so the dispatcher can update each rule's profiling
/// counters in place; nothing else about an `Engine` changes after
/// [`Engine::load`] returns (`SPEC_FULL.md` §5).
#[derive(Debug)]
pub struct Engine {
    variables: HashMap<String, CompiledVariable>,
    pub rules: Vec<Rule>,
}

impl Engine {
    /// Load a configuration file from `path`, lexing, compiling variables,
    /// and parsing every rule's condition to RPN. Any failure here is fatal
    /// (`SPEC_FULL.md` §7): the caller should abort startup.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = config::load(path)?;
        Self::compile(raw)
    }

    /// Compile an already-lexed [`RawConfig`]. Split out from [`Engine::load`]
    /// so tests can build a config in memory.
    pub fn compile(raw: RawConfig) -> Result<Self, EngineError> {
        let mut variables = HashMap::with_capacity(raw.variables.len());
        for (name, var) in &raw.variables {
            variables.insert(name.clone(), CompiledVariable::compile(name, var)?);
        }

        let mut rules = Vec::with_capacity(raw.rules.len());
        for raw_rule in &raw.rules {
            let condition = infix::parse(&raw_rule.condition, &raw_rule.name, &variables)?;
            rules.push(Rule::new(raw_rule.name.clone(), raw_rule.alarm.clone(), condition));
        }

        Ok(Engine { variables, rules })
    }

    /// The compiled variable table, keyed by declared name.
    pub fn variables(&self) -> &HashMap<String, CompiledVariable> {
        &self.variables
    }

    /// Split borrow used by the dispatcher: a mutable rule list (for
    /// profiling updates) alongside the read-only variable table, without
    /// the whole `Engine` being borrowed mutably for the loop's duration.
    pub fn rules_and_variables_mut(&mut self) -> (&mut [Rule], &HashMap<String, CompiledVariable>) {
        (&mut self.rules, &self.variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_scenario_6_unknown_variable_fails_load() {
        let raw = config::lex(
            "rule r\nif src=unknown\nalarm x\nendrule\n",
            Path::new("test.cfg"),
        )
        .unwrap();
        let err = Engine::compile(raw).unwrap_err();
        assert!(matches!(err, EngineError::Compile(crate::error::CompileError::UnknownVariable { .. })));
    }

    #[test]
    fn loads_variables_and_rules_in_declaration_order() {
        let raw = config::lex(
            "var\nip = \\d+\\.\\d+\\.\\d+\\.\\d+\nendvar\n\nrule first\nif src=ip\nalarm a\nendrule\n\nrule second\nif src=ip\nalarm b\nendrule\n",
            Path::new("test.cfg"),
        )
        .unwrap();
        let engine = Engine::compile(raw).unwrap();
        assert_eq!(engine.rules.len(), 2);
        assert_eq!(engine.rules[0].name, "first");
        assert_eq!(engine.rules[1].name, "second");
    }
}
