//! Infix-to-RPN parsing via shunting-yard.
//!
//! Converts a rule's `if <infix-expr>` text into a [`Condition`] using the
//! classical shunting-yard algorithm (`SPEC_FULL.md` §4.3): `&` binds
//! tighter than `|`, both are left-associative, and parentheses delimit
//! sub-expressions. There are no unary operators.

use std::collections::HashMap;

use crate::engine::condition::{Condition, ConditionToken};
use crate::engine::operand::Operand;
use crate::engine::variable::CompiledVariable;
use crate::error::CompileError;

/// Binding power: higher binds tighter. `&` > `|`.
fn precedence(op: &str) -> Option<u8> {
    match op {
        "&" => Some(4),
        "|" => Some(3),
        _ => None,
    }
}

/// Parse `expr` into a well-formed RPN [`Condition`], resolving each operand
/// against `variables`.
pub fn parse(expr: &str, rule: &str, variables: &HashMap<String, CompiledVariable>) -> Result<Condition, CompileError> {
    let mut output: Vec<ConditionToken> = Vec::new();
    let mut operators: Vec<&str> = Vec::new();

    for tok in expr.split_whitespace() {
        match tok {
            "(" => operators.push(tok),
            ")" => {
                loop {
                    let top = operators
                        .pop()
                        .ok_or_else(|| CompileError::UnmatchedParenthesis { rule: rule.to_string() })?;
                    if top == "(" {
                        break;
                    }
                    output.push(operator_token(top));
                }
            }
            _ if precedence(tok).is_some() => {
                let prec = precedence(tok).unwrap();
                while let Some(top) = operators.last() {
                    match precedence(top) {
                        Some(top_prec) if prec <= top_prec => {
                            output.push(operator_token(operators.pop().unwrap()));
                        }
                        _ => break,
                    }
                }
                operators.push(tok);
            }
            _ => {
                let operand = Operand::parse(tok, rule, variables)?;
                output.push(ConditionToken::Operand(operand));
            }
        }
    }

    while let Some(top) = operators.pop() {
        if top == "(" {
            return Err(CompileError::UnmatchedParenthesis { rule: rule.to_string() });
        }
        output.push(operator_token(top));
    }

    Condition::new(output, rule)
}

fn operator_token(op: &str) -> ConditionToken {
    match op {
        "&" => ConditionToken::And,
        "|" => ConditionToken::Or,
        _ => unreachable!("operator_token called with non-operator {op:?}"),
    }
}
