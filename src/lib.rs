// Export modules for library usage
pub mod analyzers;
pub mod builders;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod graph;
pub mod io;
pub mod progress;

// Re-export commonly used types
pub use crate::core::{
    AnalysisReport, CallBranch, CallEdge, CallKind, Callable, CallableKind, CallerRecord,
    EntryPoint, FileCalls, FileDefinitions, Interface, TraceEntry, Warning,
};

pub use crate::analyzers::{collect_calls, collect_definitions};

pub use crate::builders::call_graph::{CallGraphBuilder, ExtractionResult};

pub use crate::graph::{CallGraph, TreeBuilder};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
