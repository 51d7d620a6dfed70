pub mod errors;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy)]
pub enum CallableKind {
    Program,
    Function,
    Subroutine,
    Interface,
}

impl std::fmt::Display for CallableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(CallableKind, &str)] = &[
            (CallableKind::Program, "program"),
            (CallableKind::Function, "function"),
            (CallableKind::Subroutine, "subroutine"),
            (CallableKind::Interface, "interface"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(k, _)| k == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown");

        write!(f, "{display_str}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy)]
pub enum CallKind {
    /// Explicit `call name(...)` statement
    #[serde(rename = "subroutine-call")]
    Subroutine,
    /// Bare `name(...)` reference, validated against the callable set
    #[serde(rename = "function-call")]
    Function,
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(CallKind, &str)] = &[
            (CallKind::Subroutine, "subroutine-call"),
            (CallKind::Function, "function-call"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(k, _)| k == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown");

        write!(f, "{display_str}")
    }
}

/// A named definition found during the definitions pass. Names are
/// canonical lowercase.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Callable {
    pub name: String,
    pub kind: CallableKind,
    pub file: PathBuf,
}

impl Callable {
    pub fn new(name: impl Into<String>, kind: CallableKind, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            file: file.into(),
        }
    }
}

/// A named interface block and the procedure names it declares.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub members: Vec<String>,
    pub file: PathBuf,
}

/// One recorded invocation. The caller is implied by the record the edge
/// lives in; edges keep source order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallEdge {
    pub callee: String,
    pub kind: CallKind,
}

impl CallEdge {
    pub fn new(callee: impl Into<String>, kind: CallKind) -> Self {
        Self {
            callee: callee.into(),
            kind,
        }
    }
}

/// All invocations collected for one caller body within one file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallerRecord {
    pub name: String,
    pub edges: Vec<CallEdge>,
}

impl CallerRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            edges: Vec::new(),
        }
    }
}

/// Definitions pass output for a single file, in encounter order.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FileDefinitions {
    pub path: PathBuf,
    pub callables: Vec<Callable>,
    pub interfaces: Vec<Interface>,
    pub programs: Vec<Callable>,
}

impl FileDefinitions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Call-site pass output for a single file, callers in context-opening order.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FileCalls {
    pub path: PathBuf,
    pub callers: Vec<CallerRecord>,
}

impl FileCalls {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            callers: Vec::new(),
        }
    }
}

/// Recovered conditions worth surfacing but never fatal.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    UnreadableFile {
        path: PathBuf,
        detail: String,
    },
    DuplicateDefinition {
        name: String,
        kept: PathBuf,
        discarded: PathBuf,
    },
    MultipleEntryPoints {
        kept: String,
        kept_file: PathBuf,
        discarded: String,
        discarded_file: PathBuf,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::UnreadableFile { path, detail } => {
                write!(f, "skipping unreadable file {}: {detail}", path.display())
            }
            Warning::DuplicateDefinition {
                name,
                kept,
                discarded,
            } => write!(
                f,
                "duplicate definition of '{name}' in {} ignored, keeping {}",
                discarded.display(),
                kept.display()
            ),
            Warning::MultipleEntryPoints {
                kept,
                kept_file,
                discarded,
                discarded_file,
            } => write!(
                f,
                "multiple program units: keeping '{kept}' ({}), ignoring '{discarded}' ({})",
                kept_file.display(),
                discarded_file.display()
            ),
        }
    }
}

/// The program unit traversal starts from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub file: PathBuf,
}

/// One occurrence in a flattened call sequence. Nesting depth is not part
/// of the sequence; order is pre-order over the expansion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceEntry {
    pub name: String,
    /// True when the name was already on the active expansion path and
    /// descent stopped here.
    pub cycle: bool,
}

impl TraceEntry {
    pub fn new(name: impl Into<String>, cycle: bool) -> Self {
        Self {
            name: name.into(),
            cycle,
        }
    }
}

/// Everything transitively reachable below one direct callee of the entry
/// point, flattened. The root itself is not part of the sequence.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallBranch {
    pub root: String,
    pub kind: CallKind,
    pub sequence: Vec<TraceEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub project_path: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub entry_point: EntryPoint,
    pub files_scanned: usize,
    pub branches: Vec<CallBranch>,
    pub interfaces: Vec<Interface>,
    pub call_counts: BTreeMap<String, usize>,
    pub warnings: Vec<Warning>,
}
