//! The substitution engine: placeholder expansion inside strings.
//!
//! Five placeholder forms are recognized, expanded in a fixed order:
//!
//! 1. `{name}`            — scalar value of a variable (lists render as `[a, b, c]`)
//! 2. `{$NAME}`           — environment variable
//! 3. `{name[]}`          — list elements joined by a single space
//! 4. `{name[i]}`         — 0-based list element, bounds-checked
//! 5. `{mod.fn(a, b)}`    — textual result of a native module function
//!
//! Every pass matches against the *original* input string; replacements are
//! collected as span edits and spliced in a single reconstruction, so text
//! produced by one pass is never re-expanded by a later one. Anything that
//! fails to resolve — unknown variable, unset environment variable, wrong
//! value type, index out of range, failing module call — is left in place
//! verbatim. Partial expansion beats aborting for a tool that mostly glues
//! shell commands together.

use crate::env::Environment;
use crate::functions::NativeModules;
use crate::parser;
use crate::value::{Scope, Value};
use regex::Regex;
use std::sync::LazyLock;

static SCALAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("scalar placeholder pattern"));
static ENV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\$([A-Za-z_][A-Za-z0-9_]*)\}").expect("env placeholder pattern")
});
static JOIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\[\]\}").expect("join placeholder pattern"));
static INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\[(\d+)\]\}").expect("index placeholder pattern"));
static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\.(\w+)\(([^)]*)\)\}").expect("call placeholder pattern"));

/// Everything the engine consults while expanding.
pub struct ExpandCtx<'a> {
    pub scope: &'a Scope,
    pub env: &'a Environment,
    pub modules: &'a NativeModules,
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

fn claim(edits: &mut Vec<Edit>, start: usize, end: usize, replacement: String) {
    // First pass to touch a span wins; the patterns are disjoint in practice,
    // but the pass order is the documented precedence.
    if edits.iter().any(|e| start < e.end && e.start < end) {
        return;
    }
    edits.push(Edit {
        start,
        end,
        replacement,
    });
}

/// Expand all recognized placeholders in `text`.
pub fn expand(text: &str, ctx: &ExpandCtx) -> String {
    let mut edits: Vec<Edit> = Vec::new();

    for caps in SCALAR_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        if let Some(value) = ctx.scope.get(&caps[1]) {
            claim(&mut edits, m.start(), m.end(), value.to_string());
        }
    }

    for caps in ENV_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        if let Some(value) = ctx.env.get_var(&caps[1]) {
            claim(&mut edits, m.start(), m.end(), value);
        }
    }

    for caps in JOIN_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        if let Some(Value::List(items)) = ctx.scope.get(&caps[1]) {
            claim(&mut edits, m.start(), m.end(), items.join(" "));
        }
    }

    for caps in INDEX_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let Some(Value::List(items)) = ctx.scope.get(&caps[1]) else {
            continue;
        };
        let Ok(index) = caps[2].parse::<usize>() else {
            continue;
        };
        if let Some(item) = items.get(index) {
            claim(&mut edits, m.start(), m.end(), item.clone());
        }
    }

    for caps in CALL_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let args = parser::parse_arguments(&caps[3]);
        if let Ok(result) = ctx.modules.call(&caps[1], &caps[2], &args) {
            claim(&mut edits, m.start(), m.end(), result);
        }
    }

    if edits.is_empty() {
        return text.to_string();
    }

    edits.sort_by_key(|e| e.start);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for edit in edits {
        out.push_str(&text[last..edit.start]);
        out.push_str(&edit.replacement);
        last = edit.end;
    }
    out.push_str(&text[last..]);
    out
}
