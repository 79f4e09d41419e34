//! Configuration lexer.
//!
//! Turns the line-oriented rule-file grammar into a [`RawConfig`]: a map of
//! variable name to its raw pattern strings, and a
//! list of [`RawRule`]s in declaration order. Nothing here is compiled yet —
//! that is [`crate::engine::variable`] and [`crate::engine::infix`]'s job.
//!
//! The grammar is intentionally simple (blank-line tolerant, keyword-led
//! blocks) so this module stays a straightforward line scanner rather than a
//! general-purpose parser.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// A variable as declared in the configuration, before compilation.
#[derive(Debug, Clone, Default)]
pub struct RawVariable {
    /// Raw pattern strings, in declaration order. `var` blocks contribute
    /// regex source text; `list` blocks contribute literal pattern lines
    /// read from a file.
    pub patterns: Vec<String>,
    /// Whether any contribution to this variable came from a `list` block.
    /// A variable touched by `list` always compiles to the multi-literal
    /// matcher, even with one pattern.
    pub from_list: bool,
}

/// A rule as declared in the configuration, before its condition is parsed.
#[derive(Debug, Clone)]
pub struct RawRule {
    pub name: String,
    pub condition: String,
    pub alarm: String,
    /// 1-based line number of the `rule` keyword, for error reporting.
    pub line: usize,
}

/// The result of lexing a configuration file.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub variables: HashMap<String, RawVariable>,
    pub rules: Vec<RawRule>,
}

/// Load and lex a configuration file from `path`.
pub fn load(path: &Path) -> Result<RawConfig, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    lex(&text, path)
}

/// Lex already-read configuration text. Split out from [`load`] so tests can
/// exercise the grammar without touching the filesystem.
pub fn lex(text: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    let mut config = RawConfig::default();
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0usize;

    while i < lines.len() {
        let line_no = i + 1;
        let trimmed = lines[i].trim();
        i += 1;

        if trimmed.is_empty() {
            continue;
        }

        match trimmed {
            "var" => {
                i = lex_patterns_block(&lines, i, path, "var", "endvar", false, &mut config)?;
            }
            "list" => {
                i = lex_patterns_block(&lines, i, path, "list", "endlist", true, &mut config)?;
            }
            _ => {
                let mut tokens = trimmed.split_whitespace();
                if tokens.next() != Some("rule") {
                    continue;
                }
                let name = tokens
                    .next()
                    .ok_or_else(|| ConfigError::MissingRuleName { path: path.to_path_buf(), line: line_no })?
                    .to_string();
                let (next_i, rule) = lex_rule_block(&lines, i, path, name, line_no)?;
                i = next_i;
                config.rules.push(rule);
            }
        }
    }

    Ok(config)
}

/// Shared scanner for `var`/`list` blocks: both are `name = value` pairs
/// terminated by an `end...` keyword, differing only in whether the value is
/// a regex literal (`var`) or a file path to read literals from (`list`).
fn lex_patterns_block(
    lines: &[&str],
    mut i: usize,
    path: &Path,
    block: &'static str,
    end_keyword: &str,
    is_list: bool,
    config: &mut RawConfig,
) -> Result<usize, ConfigError> {
    loop {
        let Some(raw) = lines.get(i) else {
            return Err(ConfigError::UnclosedBlock { path: path.to_path_buf(), line: i, block });
        };
        let line_no = i + 1;
        let trimmed = raw.trim();
        i += 1;

        if trimmed.is_empty() {
            continue;
        }
        if trimmed == end_keyword {
            return Ok(i);
        }

        let (name, value) = trimmed
            .split_once('=')
            .ok_or(ConfigError::MalformedAssignment { path: path.to_path_buf(), line: line_no })?;
        let name = name.trim().to_string();
        let value = value.trim().to_string();

        let entry = config.variables.entry(name).or_default();
        if is_list {
            entry.from_list = true;
            entry.patterns.extend(load_pattern_file(Path::new(&value), path)?);
        } else {
            entry.patterns.push(value);
        }
    }
}

/// Read literal pattern lines from a `list`-referenced file, dropping blanks.
fn load_pattern_file(list_path: &Path, config_path: &Path) -> Result<Vec<String>, ConfigError> {
    // Resolve relative to the config file's directory, matching the
    // original tool's behavior of reading list files from the working
    // directory the config itself was loaded from.
    let resolved = if list_path.is_absolute() {
        list_path.to_path_buf()
    } else {
        config_path.parent().map(|dir| dir.join(list_path)).unwrap_or_else(|| list_path.to_path_buf())
    };

    let text = fs::read_to_string(&resolved)
        .map_err(|source| ConfigError::Io { path: resolved.clone(), source })?;

    Ok(text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect())
}

fn lex_rule_block(
    lines: &[&str],
    mut i: usize,
    path: &Path,
    name: String,
    start_line: usize,
) -> Result<(usize, RawRule), ConfigError> {
    let mut condition: Option<String> = None;
    let mut alarm: Option<String> = None;

    loop {
        let Some(raw) = lines.get(i) else {
            return Err(ConfigError::UnclosedBlock { path: path.to_path_buf(), line: i, block: "rule" });
        };
        let line_no = i + 1;
        let trimmed = raw.trim();
        i += 1;

        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "endrule" {
            break;
        }

        let (keyword, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
        match keyword {
            "if" => condition = Some(rest.trim().to_string()),
            "alarm" => alarm = Some(rest.trim().to_string()),
            other => {
                return Err(ConfigError::UnknownRuleKeyword {
                    path: path.to_path_buf(),
                    line: line_no,
                    keyword: other.to_string(),
                });
            }
        }
    }

    let condition = condition
        .ok_or_else(|| ConfigError::MissingCondition { path: path.to_path_buf(), line: start_line })?;
    let alarm =
        alarm.ok_or_else(|| ConfigError::MissingAlarmText { path: path.to_path_buf(), line: start_line })?;

    Ok((i, RawRule { name, condition, alarm, line: start_line }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_str(text: &str) -> RawConfig {
        lex(text, Path::new("test.cfg")).expect("lex should succeed")
    }

    #[test]
    fn skips_blank_lines() {
        let cfg = lex_str("\n\nvar\n\nip = \\d+\n\nendvar\n\n");
        assert_eq!(cfg.variables["ip"].patterns, vec!["\\d+"]);
    }

    #[test]
    fn var_block_unions_duplicate_names() {
        let cfg = lex_str("var\nbad = alpha\nbad = beta\nendvar\n");
        assert_eq!(cfg.variables["bad"].patterns, vec!["alpha", "beta"]);
        assert!(!cfg.variables["bad"].from_list);
    }

    #[test]
    fn rule_block_order_of_if_and_alarm_is_free() {
        let cfg = lex_str("rule r1\nalarm got it\nif src=ip\nendrule\n");
        assert_eq!(cfg.rules.len(), 1);
        assert_eq!(cfg.rules[0].name, "r1");
        assert_eq!(cfg.rules[0].condition, "src=ip");
        assert_eq!(cfg.rules[0].alarm, "got it");
    }

    #[test]
    fn rejects_unknown_rule_keyword() {
        let err = lex("rule r1\nfoo bar\nendrule\n", Path::new("test.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRuleKeyword { keyword, .. } if keyword == "foo"));
    }

    #[test]
    fn rejects_unclosed_block() {
        let err = lex("var\nip = \\d+\n", Path::new("test.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::UnclosedBlock { block: "var", .. }));
    }

    #[test]
    fn rejects_malformed_assignment() {
        let err = lex("var\nnotanassignment\nendvar\n", Path::new("test.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedAssignment { .. }));
    }

    #[test]
    fn rejects_missing_rule_name() {
        let err = lex("rule\nif src=ip\nalarm x\nendrule\n", Path::new("test.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRuleName { .. }));
    }

    #[test]
    fn rejects_missing_condition() {
        let err = lex("rule r1\nalarm x\nendrule\n", Path::new("test.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCondition { .. }));
    }

    #[test]
    fn top_level_token_merely_prefixed_with_rule_is_ignored() {
        let cfg = lex_str("ruleset\n\nrule r1\nif src=ip\nalarm x\nendrule\n");
        assert_eq!(cfg.rules.len(), 1);
        assert_eq!(cfg.rules[0].name, "r1");
    }
}
