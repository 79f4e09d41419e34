//! Variable compilation.
//!
//! Turns a [`RawVariable`](crate::config::RawVariable)'s pattern list into a
//! [`CompiledVariable`]: either a single compiled [`regex::Regex`] or an
//! Aho-Corasick automaton over literal patterns. This is the "heterogeneous
//! matcher dispatch" of `SPEC_FULL.md` §9 — modeled here as a closed sum type
//! with one evaluation entry point ([`CompiledVariable::find`]) rather than a
//! runtime type check on a bare handle.

use aho_corasick::AhoCorasick;
use regex::Regex;

use crate::config::RawVariable;
use crate::error::CompileError;

/// A compiled matcher for one configuration variable.
#[derive(Debug)]
pub enum CompiledVariable {
    /// Exactly one pattern, declared in a `var` block: a compiled regex.
    Regex(Regex),
    /// Two or more patterns, or any pattern sourced from a `list` block: an
    /// Aho-Corasick automaton plus the literals it was built from, so a hit
    /// index can be resolved back to the source pattern.
    MultiLiteral { automaton: AhoCorasick, patterns: Vec<String> },
}

impl CompiledVariable {
    /// Compile `raw` under `name`, choosing the matcher kind per
    /// `SPEC_FULL.md` §4.2.
    pub fn compile(name: &str, raw: &RawVariable) -> Result<Self, CompileError> {
        if raw.patterns.is_empty() {
            return Err(CompileError::EmptyVariable { name: name.to_string() });
        }

        if !raw.from_list && raw.patterns.len() == 1 {
            let pattern = &raw.patterns[0];
            let regex = Regex::new(pattern).map_err(|source| CompileError::PatternCompile {
                name: name.to_string(),
                pattern: pattern.clone(),
                source,
            })?;
            return Ok(CompiledVariable::Regex(regex));
        }

        let automaton = AhoCorasick::new(&raw.patterns)
            .map_err(|source| CompileError::AutomatonCompile { name: name.to_string(), source })?;
        Ok(CompiledVariable::MultiLiteral { automaton, patterns: raw.patterns.clone() })
    }

    /// Find the first match of this variable's pattern(s) in `haystack`.
    ///
    /// Returns the matched fragment, or `None` if nothing matched. An empty
    /// regex match (zero-width) counts as no match, mirroring
    /// `SPEC_FULL.md` §4.4.
    pub fn find(&self, haystack: &str) -> Option<String> {
        match self {
            CompiledVariable::Regex(re) => {
                let m = re.find(haystack)?;
                if m.is_empty() { None } else { Some(m.as_str().to_string()) }
            }
            CompiledVariable::MultiLiteral { automaton, patterns } => {
                let hit = automaton.find(haystack)?;
                patterns.get(hit.pattern().as_usize()).cloned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(patterns: &[&str], from_list: bool) -> RawVariable {
        RawVariable { patterns: patterns.iter().map(|s| s.to_string()).collect(), from_list }
    }

    #[test]
    fn single_var_pattern_compiles_to_regex() {
        let compiled = CompiledVariable::compile("ip", &var(&[r"\d+\.\d+\.\d+\.\d+"], false)).unwrap();
        assert!(matches!(compiled, CompiledVariable::Regex(_)));
        assert_eq!(compiled.find("hit 10.0.0.1 here"), Some("10.0.0.1".to_string()));
        assert_eq!(compiled.find("no address"), None);
    }

    #[test]
    fn multi_pattern_var_compiles_to_multi_literal() {
        let compiled = CompiledVariable::compile("bad", &var(&["alpha", "beta"], false)).unwrap();
        assert!(matches!(compiled, CompiledVariable::MultiLiteral { .. }));
        assert_eq!(compiled.find("has beta inside"), Some("beta".to_string()));
    }

    #[test]
    fn single_list_pattern_is_still_multi_literal() {
        let compiled = CompiledVariable::compile("bad", &var(&["alpha"], true)).unwrap();
        assert!(matches!(compiled, CompiledVariable::MultiLiteral { .. }));
        assert_eq!(compiled.find("has alpha inside"), Some("alpha".to_string()));
    }

    #[test]
    fn empty_variable_is_rejected() {
        let err = CompiledVariable::compile("empty", &var(&[], false)).unwrap_err();
        assert!(matches!(err, CompileError::EmptyVariable { .. }));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = CompiledVariable::compile("bad", &var(&["("], false)).unwrap_err();
        assert!(matches!(err, CompileError::PatternCompile { .. }));
    }
}
