//! Short-circuiting RPN evaluator.
//!
//! Walks a [`Condition`] against a decoded [`Record`], using a stack whose
//! elements are either an unevaluated [`Operand`] or an already-computed
//! `bool` (`SPEC_FULL.md` §4.4, §9's "RPN stack polymorphism" note). This is
//! what lets `&`/`|` skip evaluating their right-hand side when the left-hand
//! side already decides the outcome — the matcher for the skipped operand is
//! never invoked.

use std::collections::HashMap;

use crate::engine::condition::{Condition, ConditionToken};
use crate::engine::operand::{Operand, Operator};
use crate::engine::variable::CompiledVariable;
use crate::record::Record;

/// An evaluation stack slot: either a leaf waiting to be evaluated, or the
/// already-computed result of a sub-expression.
enum StackElem<'a> {
    Pending(&'a Operand),
    Value(bool),
}

/// The outcome of evaluating a rule's condition against one record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EvalOutcome {
    pub fired: bool,
    /// Match fragments, in the order they were captured along the evaluated
    /// (non-short-circuited) path.
    pub fragments: Vec<String>,
}

/// Evaluate `condition` against `record`, consulting `variables` for each
/// operand it actually needs to touch.
pub fn evaluate(condition: &Condition, record: &Record, variables: &HashMap<String, CompiledVariable>) -> EvalOutcome {
    let mut stack: Vec<StackElem<'_>> = Vec::new();
    let mut fragments: Vec<String> = Vec::new();

    for token in condition.tokens() {
        match token {
            ConditionToken::Operand(operand) => stack.push(StackElem::Pending(operand)),
            ConditionToken::And => {
                let right = stack.pop().expect("Condition::new guarantees a right operand for &");
                let left = stack.pop().expect("Condition::new guarantees a left operand for &");
                let l = resolve(left, record, variables, &mut fragments);
                let outcome = if !l { false } else { resolve(right, record, variables, &mut fragments) };
                stack.push(StackElem::Value(outcome));
            }
            ConditionToken::Or => {
                let right = stack.pop().expect("Condition::new guarantees a right operand for |");
                let left = stack.pop().expect("Condition::new guarantees a left operand for |");
                let l = resolve(left, record, variables, &mut fragments);
                let outcome = if l { true } else { resolve(right, record, variables, &mut fragments) };
                stack.push(StackElem::Value(outcome));
            }
        }
    }

    // A single-operand condition (or the final reduction of any other shape)
    // leaves exactly one slot, possibly still Pending.
    let fired = match stack.pop() {
        Some(elem) => resolve(elem, record, variables, &mut fragments),
        None => false,
    };

    EvalOutcome { fired, fragments }
}

/// Resolve a stack slot to a `bool`, evaluating it against the record if it
/// was still a pending operand.
fn resolve(
    elem: StackElem<'_>,
    record: &Record,
    variables: &HashMap<String, CompiledVariable>,
    fragments: &mut Vec<String>,
) -> bool {
    match elem {
        StackElem::Value(v) => v,
        StackElem::Pending(operand) => {
            let (matched, fragment) = eval_operand(operand, record, variables);
            if matched {
                if let Some(fragment) = fragment {
                    fragments.push(fragment);
                }
            }
            matched
        }
    }
}

/// Evaluate a single operand against the record.
///
/// A missing field or a non-string field value are both silent non-matches
/// (`SPEC_FULL.md` §7's `FieldTypeMismatch` policy: "no log spam per
/// record"). `NotEqual` never reports a fragment, even when it fires.
fn eval_operand(operand: &Operand, record: &Record, variables: &HashMap<String, CompiledVariable>) -> (bool, Option<String>) {
    let Some(value) = record.get(&operand.field) else { return (false, None) };
    let Some(text) = value.as_str() else { return (false, None) };

    let Some(compiled) = variables.get(&operand.variable) else {
        tracing::error!(variable = %operand.variable, "operand variable missing from compiled table at eval time");
        return (false, None);
    };

    let fragment = compiled.find(text);
    let matched = fragment.is_some();

    match operand.operator {
        Operator::Equal => (matched, fragment),
        Operator::NotEqual => (!matched, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawVariable;
    use crate::engine::infix;
    use serde_json::json;

    fn variables() -> HashMap<String, CompiledVariable> {
        let mut map = HashMap::new();
        map.insert(
            "ip".to_string(),
            CompiledVariable::compile("ip", &RawVariable { patterns: vec![r"\d+\.\d+\.\d+\.\d+".to_string()], from_list: false }).unwrap(),
        );
        map.insert(
            "bad".to_string(),
            CompiledVariable::compile(
                "bad",
                &RawVariable { patterns: vec!["alpha".to_string(), "beta".to_string()], from_list: true },
            )
            .unwrap(),
        );
        map
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), json!(v))).collect()
    }

    #[test]
    fn seed_scenario_1_single_regex_fires() {
        let vars = variables();
        let cond = infix::parse("src=ip", "r1", &vars).unwrap();
        let rec = record(&[("src", "hit 10.0.0.1 here")]);
        let outcome = evaluate(&cond, &rec, &vars);
        assert!(outcome.fired);
        assert_eq!(outcome.fragments, vec!["10.0.0.1"]);
    }

    #[test]
    fn seed_scenario_2_no_match_does_not_fire() {
        let vars = variables();
        let cond = infix::parse("src=ip", "r1", &vars).unwrap();
        let rec = record(&[("src", "no address")]);
        assert!(!evaluate(&cond, &rec, &vars).fired);
    }

    #[test]
    fn seed_scenario_3_multi_literal_fires_with_verbatim_fragment() {
        let vars = variables();
        let cond = infix::parse("body=bad", "r1", &vars).unwrap();
        let rec = record(&[("body", "has beta inside")]);
        let outcome = evaluate(&cond, &rec, &vars);
        assert!(outcome.fired);
        assert_eq!(outcome.fragments, vec!["beta"]);
    }

    #[test]
    fn seed_scenario_4_and_short_circuits_right_operand() {
        let vars = variables();
        let cond = infix::parse("src=ip & body=bad", "r1", &vars).unwrap();
        let rec = record(&[("src", "no address"), ("body", "has beta inside")]);
        let outcome = evaluate(&cond, &rec, &vars);
        assert!(!outcome.fired);
        assert!(outcome.fragments.is_empty());
    }

    #[test]
    fn seed_scenario_5_not_equal_fires_with_empty_fragments() {
        let vars = variables();
        let cond = infix::parse("src!=ip", "r1", &vars).unwrap();
        let rec = record(&[("src", "no address")]);
        let outcome = evaluate(&cond, &rec, &vars);
        assert!(outcome.fired);
        assert!(outcome.fragments.is_empty());
    }

    #[test]
    fn missing_field_is_silent_non_match() {
        let vars = variables();
        let cond = infix::parse("src=ip", "r1", &vars).unwrap();
        let rec = record(&[("other", "value")]);
        assert!(!evaluate(&cond, &rec, &vars).fired);
    }

    #[test]
    fn non_string_field_is_silent_non_match() {
        let vars = variables();
        let cond = infix::parse("src=ip", "r1", &vars).unwrap();
        let mut rec = Record::new();
        rec.insert("src".to_string(), json!(42));
        assert!(!evaluate(&cond, &rec, &vars).fired);
    }

    #[test]
    fn or_short_circuits_when_left_is_true() {
        let vars = variables();
        let cond = infix::parse("src=ip | body=bad", "r1", &vars).unwrap();
        let rec = record(&[("src", "10.0.0.1"), ("body", "irrelevant")]);
        let outcome = evaluate(&cond, &rec, &vars);
        assert!(outcome.fired);
        assert_eq!(outcome.fragments, vec!["10.0.0.1"]);
    }

    /// Proves the right-hand operand of a short-circuited `&` is genuinely
    /// untouched rather than merely happening to return false: `body` here
    /// contains "beta", which `bad` would match and report as a fragment if
    /// it were evaluated.
    #[test]
    fn and_never_touches_right_matcher_when_left_is_false() {
        let vars = variables();
        let cond = infix::parse("src=ip & body=bad", "r1", &vars).unwrap();
        let rec = record(&[("src", "no address"), ("body", "beta")]);
        let outcome = evaluate(&cond, &rec, &vars);
        assert!(!outcome.fired);
        assert!(outcome.fragments.is_empty());
    }
}
