//! Second pass over a file: who calls what.
//!
//! Requires the global valid-name set, so it can only run after the
//! definitions pass has been aggregated for the whole corpus.

use crate::analyzers::scanner::{classify, is_bare_end, normalize_line, LineEvent};
use crate::core::{CallEdge, CallKind, CallerRecord, FileCalls};
use im::HashSet;
use std::path::Path;

/// Collect the ordered call edges for every caller body in one file.
///
/// A program unit always opens a collection context. A function or
/// subroutine opens one only when its name is in the valid set and no
/// record for it exists yet in this file; a definition that does not open
/// still closes the active context, so the skipped body is dark until the
/// next definition. Lines outside any open context are not attributed to
/// anyone.
pub fn collect_calls(path: &Path, content: &str, valid_names: &HashSet<String>) -> FileCalls {
    let mut calls = FileCalls::new(path);
    let mut active: Option<usize> = None;

    for raw in content.lines() {
        let Some(line) = normalize_line(raw) else {
            continue;
        };
        match classify(&line) {
            Some(LineEvent::ProgramStart(name)) => {
                let existing = calls.callers.iter().position(|r| r.name == name);
                active = match existing {
                    Some(i) => Some(i),
                    None => {
                        calls.callers.push(CallerRecord::new(&name));
                        Some(calls.callers.len() - 1)
                    }
                };
            }
            Some(LineEvent::FunctionStart(name)) | Some(LineEvent::SubroutineStart(name)) => {
                let already_recorded = calls.callers.iter().any(|r| r.name == name);
                if !already_recorded && valid_names.contains(&name) {
                    calls.callers.push(CallerRecord::new(&name));
                    active = Some(calls.callers.len() - 1);
                } else {
                    // A body that is not collected must not leak its calls
                    // into the enclosing context.
                    active = None;
                }
            }
            Some(LineEvent::ProgramEnd(_))
            | Some(LineEvent::FunctionEnd(_))
            | Some(LineEvent::SubroutineEnd(_)) => {
                active = None;
            }
            Some(LineEvent::CallCandidate { callee, kind }) => {
                if let Some(i) = active {
                    let record = match kind {
                        // Explicit call syntax is trusted as written, even
                        // when the target is not a known callable.
                        CallKind::Subroutine => true,
                        // A bare `name(` may be array indexing; only names
                        // from the valid set count.
                        CallKind::Function => valid_names.contains(&callee),
                    };
                    if record {
                        calls.callers[i].edges.push(CallEdge::new(callee, kind));
                    }
                }
            }
            Some(LineEvent::InterfaceStart(_))
            | Some(LineEvent::InterfaceEnd)
            | Some(LineEvent::ModuleProcedure(_)) => {}
            None => {
                if is_bare_end(&line) {
                    active = None;
                }
            }
        }
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn collect(content: &str, names: &[&str]) -> FileCalls {
        collect_calls(Path::new("main.f90"), content, &valid(names))
    }

    fn edges_of(calls: &FileCalls, name: &str) -> Vec<CallEdge> {
        calls
            .callers
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.edges.clone())
            .unwrap_or_default()
    }

    #[test]
    fn program_context_opens_unconditionally() {
        // The program name is never in the valid set.
        let src = "program driver\n    call sweep(a)\nend program driver\n";
        let calls = collect(src, &["sweep"]);
        assert_eq!(calls.callers.len(), 1);
        assert_eq!(calls.callers[0].name, "driver");
        assert_eq!(
            edges_of(&calls, "driver"),
            vec![CallEdge::new("sweep", CallKind::Subroutine)]
        );
    }

    #[test]
    fn a_program_with_no_calls_still_gets_a_record() {
        let src = "program idle\nend program idle\n";
        let calls = collect(src, &[]);
        assert_eq!(calls.callers.len(), 1);
        assert!(calls.callers[0].edges.is_empty());
    }

    #[test]
    fn explicit_calls_are_recorded_even_for_unknown_names() {
        let src = "program driver\n    call mpi_init(ierr)\nend program driver\n";
        let calls = collect(src, &[]);
        assert_eq!(
            edges_of(&calls, "driver"),
            vec![CallEdge::new("mpi_init", CallKind::Subroutine)]
        );
    }

    #[test]
    fn bare_candidates_need_a_valid_name() {
        let src = r#"
program driver
    x = area(r)
    y = values(i)
end program driver
"#;
        let calls = collect(src, &["area"]);
        // `values(i)` is indistinguishable from indexing and is not valid.
        assert_eq!(
            edges_of(&calls, "driver"),
            vec![CallEdge::new("area", CallKind::Function)]
        );
    }

    #[test]
    fn source_order_is_preserved() {
        let src = r#"
subroutine pipeline(x)
    call stage_two(x)
    y = stage_three(x)
    call stage_one(x)
end subroutine pipeline
"#;
        let calls = collect(src, &["pipeline", "stage_one", "stage_two", "stage_three"]);
        let edges = edges_of(&calls, "pipeline");
        let callees: Vec<&str> = edges.iter().map(|e| e.callee.as_str()).collect();
        assert_eq!(callees, vec!["stage_two", "stage_three", "stage_one"]);
    }

    #[test]
    fn invalid_definitions_do_not_open_a_context() {
        // `secret` is not valid (ignored), so its body is dark.
        let src = r#"
subroutine secret(x)
    call hidden_work(x)
end subroutine secret
"#;
        let calls = collect(src, &["hidden_work"]);
        assert!(calls.callers.is_empty());
    }

    #[test]
    fn uncollected_bodies_do_not_leak_into_the_enclosing_context() {
        // `secret` is not valid, so its start closes the program context
        // instead of leaving it open over the hidden body.
        let src = r#"
program driver
    call setup(x)
contains
    subroutine secret(x)
        call hidden_work(x)
    end subroutine secret
end program driver
"#;
        let calls = collect(src, &["setup"]);
        assert_eq!(calls.callers.len(), 1);
        assert_eq!(
            edges_of(&calls, "driver"),
            vec![CallEdge::new("setup", CallKind::Subroutine)]
        );
    }

    #[test]
    fn lines_outside_any_context_are_dropped() {
        let src = "call orphan(x)\nprogram driver\nend program driver\ncall late(x)\n";
        let calls = collect(src, &[]);
        assert_eq!(calls.callers.len(), 1);
        assert!(calls.callers[0].edges.is_empty());
    }

    #[test]
    fn bare_end_closes_the_context() {
        let src = r#"
subroutine alpha(x)
    call before(x)
end
call after(x)
"#;
        let calls = collect(src, &["alpha"]);
        let edges = edges_of(&calls, "alpha");
        let callees: Vec<&str> = edges.iter().map(|e| e.callee.as_str()).collect();
        assert_eq!(callees, vec!["before"]);
    }

    #[test]
    fn first_body_wins_within_a_file() {
        let src = r#"
subroutine twice(a)
    call first_body(a)
end subroutine twice
subroutine twice(b)
    call second_body(b)
end subroutine twice
"#;
        let calls = collect(src, &["twice"]);
        assert_eq!(calls.callers.len(), 1);
        let edges = edges_of(&calls, "twice");
        let callees: Vec<&str> = edges.iter().map(|e| e.callee.as_str()).collect();
        // The repeated definition line does not reopen the record, and its
        // body lines fall outside any context.
        assert_eq!(callees, vec!["first_body"]);
    }

    #[test]
    fn self_calls_are_recorded() {
        let src = "subroutine loop(n)\n    if (n > 0) call loop(n - 1)\nend subroutine loop\n";
        let calls = collect(src, &["loop"]);
        assert_eq!(
            edges_of(&calls, "loop"),
            vec![CallEdge::new("loop", CallKind::Subroutine)]
        );
    }

    #[test]
    fn interface_lines_are_inert_in_this_pass() {
        let src = r#"
subroutine holder(x)
    interface swap
        module procedure sw_int
    end interface
    call real_work(x)
end subroutine holder
"#;
        let calls = collect(src, &["holder", "swap"]);
        let edges = edges_of(&calls, "holder");
        let callees: Vec<&str> = edges.iter().map(|e| e.callee.as_str()).collect();
        assert_eq!(callees, vec!["real_work"]);
    }

    #[test]
    fn one_candidate_per_line() {
        let src = "program driver\n    x = outer(inner(1))\nend program driver\n";
        let calls = collect(src, &["outer", "inner"]);
        let edges = edges_of(&calls, "driver");
        let callees: Vec<&str> = edges.iter().map(|e| e.callee.as_str()).collect();
        assert_eq!(callees, vec!["outer"]);
    }
}
