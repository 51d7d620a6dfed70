//! Per-file analysis passes.
//!
//! `scanner` classifies single lines; `definitions` and `calls` fold the
//! classifier's events into per-file results. Everything here is pure and
//! file-local, which is what makes the passes safe to parallelize.

pub mod calls;
pub mod definitions;
pub mod scanner;

pub use calls::collect_calls;
pub use definitions::collect_definitions;
pub use scanner::{classify, is_bare_end, normalize_line, LineEvent};
