//! Line-level classification of Fortran source.
//!
//! Both collection passes consume the same classifier, so a line means the
//! same thing in pass one and pass two. Classification is per line; all
//! block and context state lives in the collectors.

use crate::core::CallKind;
use once_cell::sync::Lazy;
use regex::Regex;

static PROGRAM_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*program\s+([a-z_][a-z0-9_]*)").unwrap());
static PROGRAM_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*end\s+program\s+([a-z_][a-z0-9_]*)").unwrap());
// Unanchored on purpose: type-prefixed definitions like
// `integer function f(x)` are still definitions.
static FUNCTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"function\s+([a-z_][a-z0-9_]*)").unwrap());
static FUNCTION_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*end\s+function\s+([a-z_][a-z0-9_]*)").unwrap());
// Anchored, so attribute-prefixed subroutines (`pure subroutine s`) are
// not recognized. Known limitation.
static SUBROUTINE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*subroutine\s+([a-z_][a-z0-9_]*)").unwrap());
static SUBROUTINE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*end\s+subroutine\s+([a-z_][a-z0-9_]*)").unwrap());
static INTERFACE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*interface\s+([a-z_][a-z0-9_]*)").unwrap());
static INTERFACE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*end\s+interface\b").unwrap());
static MODULE_PROCEDURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*module\s+procedure\s+([a-z_][a-z0-9_]*.*)").unwrap());
static CALL_STATEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"call\s+([a-z_][a-z0-9_]*)\s*\(").unwrap());
static CALL_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z_][a-z0-9_]*)\s*\(").unwrap());

/// Everything one source line can mean to the collectors. At most one
/// event is produced per line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEvent {
    ProgramStart(String),
    ProgramEnd(String),
    FunctionStart(String),
    FunctionEnd(String),
    SubroutineStart(String),
    SubroutineEnd(String),
    InterfaceStart(String),
    InterfaceEnd,
    /// `module procedure a, b, ...` member names, trimmed.
    ModuleProcedure(Vec<String>),
    CallCandidate {
        callee: String,
        kind: CallKind,
    },
}

/// Lowercase a raw source line and strip comment text. Returns `None` for
/// blank lines and full-line comments.
///
/// Comment stripping is quote-blind: a `!` inside a string literal still
/// truncates the line. Documented heuristic, kept because eliminating it
/// requires real lexing.
pub fn normalize_line(raw: &str) -> Option<String> {
    let mut line = raw.to_ascii_lowercase();
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('!') {
        return None;
    }
    if let Some(i) = line.find('!') {
        line.truncate(i);
    }
    Some(line)
}

/// Classify one normalized line. End markers win over start markers, and
/// block markers win over call candidates, so a definition line never
/// doubles as a call site.
pub fn classify(line: &str) -> Option<LineEvent> {
    if let Some(c) = PROGRAM_END.captures(line) {
        return Some(LineEvent::ProgramEnd(c[1].to_string()));
    }
    if let Some(c) = FUNCTION_END.captures(line) {
        return Some(LineEvent::FunctionEnd(c[1].to_string()));
    }
    if let Some(c) = SUBROUTINE_END.captures(line) {
        return Some(LineEvent::SubroutineEnd(c[1].to_string()));
    }
    // `end interface operator(+)` is a generic block end, not ours.
    if INTERFACE_END.is_match(line) && !line.contains('(') {
        return Some(LineEvent::InterfaceEnd);
    }
    if let Some(c) = PROGRAM_START.captures(line) {
        return Some(LineEvent::ProgramStart(c[1].to_string()));
    }
    // Named interface blocks only; `interface operator(+)` and friends
    // carry a paren and are skipped entirely.
    if !line.contains('(') {
        if let Some(c) = INTERFACE_START.captures(line) {
            return Some(LineEvent::InterfaceStart(c[1].to_string()));
        }
    }
    if let Some(c) = MODULE_PROCEDURE.captures(line) {
        let members = c[1]
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        return Some(LineEvent::ModuleProcedure(members));
    }
    if let Some(m) = FUNCTION_START.captures(line) {
        // A quote before the keyword means the "definition" sits inside a
        // string literal. Consume the line without an event so the string
        // contents cannot produce a call candidate either.
        let start = m.get(0).map(|g| g.start()).unwrap_or(0);
        if line[..start].contains('\'') || line[..start].contains('"') {
            return None;
        }
        return Some(LineEvent::FunctionStart(m[1].to_string()));
    }
    if let Some(c) = SUBROUTINE_START.captures(line) {
        return Some(LineEvent::SubroutineStart(c[1].to_string()));
    }
    if let Some(c) = CALL_STATEMENT.captures(line) {
        return Some(LineEvent::CallCandidate {
            callee: c[1].to_string(),
            kind: CallKind::Subroutine,
        });
    }
    // First identifier followed by `(` on the line. Indexing into an array
    // looks identical; the collector filters against the valid-name set.
    if let Some(c) = CALL_CANDIDATE.captures(line) {
        return Some(LineEvent::CallCandidate {
            callee: c[1].to_string(),
            kind: CallKind::Function,
        });
    }
    None
}

/// Normalize and classify a raw line in one step.
pub fn scan_line(raw: &str) -> Option<LineEvent> {
    normalize_line(raw).and_then(|line| classify(&line))
}

/// Nameless block terminators: `end`, `end function`, `end subroutine`.
/// These close the active call-collection context but are not block events.
pub fn is_bare_end(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("end") {
        return false;
    }
    match tokens.next() {
        None => true,
        Some(kw) => kw == "function" || kw == "subroutine",
    }
}
