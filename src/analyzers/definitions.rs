//! First pass over a file: every definition it contains.
//!
//! Pure per-file fold; no global state. Merging across files, duplicate
//! policy and entry-point selection all happen in the aggregation step,
//! which needs every file's output before it can decide anything.

use crate::analyzers::scanner::{classify, normalize_line, LineEvent};
use crate::core::{Callable, CallableKind, FileDefinitions, Interface};
use std::path::Path;

/// Collect every program, function, subroutine and named interface defined
/// in one file, in encounter order.
pub fn collect_definitions(path: &Path, content: &str) -> FileDefinitions {
    let mut defs = FileDefinitions::new(path);
    let mut interface_mode = false;
    let mut current_interface: Option<usize> = None;

    for raw in content.lines() {
        let Some(line) = normalize_line(raw) else {
            continue;
        };
        match classify(&line) {
            Some(LineEvent::ProgramStart(name)) => {
                defs.programs
                    .push(Callable::new(name, CallableKind::Program, path));
            }
            Some(LineEvent::InterfaceStart(name)) => {
                interface_mode = true;
                defs.interfaces.push(Interface {
                    name,
                    members: Vec::new(),
                    file: path.to_path_buf(),
                });
                current_interface = Some(defs.interfaces.len() - 1);
            }
            Some(LineEvent::ModuleProcedure(members)) if interface_mode => {
                if let Some(i) = current_interface {
                    defs.interfaces[i].members.extend(members);
                }
            }
            Some(LineEvent::InterfaceEnd) => {
                interface_mode = false;
            }
            // Signature lines inside interface bodies fall through here,
            // so interface-declared procedures count as definitions.
            Some(LineEvent::FunctionStart(name)) => {
                defs.callables
                    .push(Callable::new(name, CallableKind::Function, path));
            }
            Some(LineEvent::SubroutineStart(name)) => {
                defs.callables
                    .push(Callable::new(name, CallableKind::Subroutine, path));
            }
            _ => {}
        }
    }
    defs
}
