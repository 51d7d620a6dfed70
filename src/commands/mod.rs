//! CLI command implementations.
//!
//! Each submodule handles one command. Configuration resolution, the
//! extraction pipeline, and report writing live behind `analyze`;
//! config scaffolding lives behind `init`.

pub mod analyze;
pub mod init;

pub use analyze::{handle_analyze, AnalyzeConfig};
pub use init::init_config;
