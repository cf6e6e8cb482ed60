//! Line, argument-list, array-literal and call-syntax parsing.
//!
//! Each script line is parsed independently; nothing here looks at variables
//! or touches the scope. Callers run the substitution engine over the raw
//! pieces afterwards.

use anyhow::{Result, anyhow};
use regex::Regex;
use std::sync::LazyLock;

/// Tokens inside an argument list or array literal: a double-quoted run is one
/// token (quotes stripped, no escape processing), otherwise a maximal run of
/// non-comma, non-space characters. Leftmost-first alternation makes quoting
/// win over the bare-token rule.
static ARGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)"|([^, ]+)"#).expect("argument token pattern"));

/// Call syntax: optional `$` external marker, a target name (possibly
/// dot-qualified or a program path), and an optional parenthesized argument
/// list. A call without parentheses is a zero-argument call.
static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\$?)\s*([\w./-]+?)\s*(?:\((.*)\))?\s*$").expect("call pattern"));

/// Split one raw script line into `(keyword, raw argument string)`.
///
/// Leading/trailing whitespace is trimmed; a blank line yields `None`. The
/// remainder is left un-tokenized, quotes and all.
pub fn split_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => Some((keyword, rest.trim_start())),
        None => Some((line, "")),
    }
}

/// Split the text inside a call's parentheses (or an array literal) into
/// ordered tokens. Empty input yields an empty list.
pub fn parse_arguments(raw: &str) -> Vec<String> {
    ARGS_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

/// Strip the outer brackets of `[e1, e2, ...]` and return the trimmed raw
/// elements. `[]` yields an empty list. Substitution over each element is the
/// caller's job.
pub fn split_array_literal(raw: &str) -> Vec<String> {
    let interior = raw
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    if interior.is_empty() {
        return Vec::new();
    }
    interior.split(',').map(|e| e.trim().to_string()).collect()
}

/// A parsed `invoke` statement, before argument substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// `$`-prefixed calls run as a child process.
    pub external: bool,
    /// Target name, still dot-qualified if the author wrote `module.function`.
    pub target: String,
    /// Raw argument tokens in left-to-right order.
    pub args: Vec<String>,
}

/// Parse the argument text of an `invoke` statement.
pub fn parse_call(raw: &str) -> Result<Call> {
    let caps = CALL_RE
        .captures(raw)
        .ok_or_else(|| anyhow!("invalid call syntax: '{}'", raw.trim()))?;
    let external = !caps[1].is_empty();
    let target = caps[2].to_string();
    let args = caps
        .get(3)
        .map(|m| parse_arguments(m.as_str()))
        .unwrap_or_default();
    Ok(Call {
        external,
        target,
        args,
    })
}
