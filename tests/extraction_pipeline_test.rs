use callmap::io::FileWalker;
use callmap::{CallGraphBuilder, CallKind, ExtractionResult, TraceEntry, TreeBuilder, Warning};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn extract_corpus(files: &[(&str, &str)], ignored: &[&str]) -> ExtractionResult {
    let dir = TempDir::new().expect("temp dir");
    for (name, content) in files {
        fs::write(dir.path().join(name), content).expect("write fixture");
    }
    let paths = FileWalker::new(dir.path().to_path_buf())
        .walk()
        .expect("walk fixture tree");
    let ignored: Vec<String> = ignored.iter().map(|s| s.to_string()).collect();
    CallGraphBuilder::new(paths)
        .with_ignored(&ignored)
        .extract(|_| {})
        .expect("extraction succeeds")
}

fn edge_pairs(result: &ExtractionResult, caller: &str) -> Vec<(String, CallKind)> {
    result
        .graph
        .edges(caller)
        .iter()
        .map(|e| (e.callee.clone(), e.kind))
        .collect()
}

const WORKED_EXAMPLE: &str = r#"
PROGRAM MAIN
    CALL A(1)
END PROGRAM MAIN

SUBROUTINE A(X)
    CALL B(X)
    Y = C(X)
END SUBROUTINE A

SUBROUTINE B(X)
END SUBROUTINE B

FUNCTION C(X)
    C = X
END FUNCTION C
"#;

#[test]
fn worked_example_produces_the_expected_graph_and_sequences() {
    let result = extract_corpus(&[("main.f90", WORKED_EXAMPLE)], &[]);

    assert_eq!(result.entry_point.name, "main");
    assert_eq!(
        edge_pairs(&result, "main"),
        vec![("a".to_string(), CallKind::Subroutine)]
    );
    assert_eq!(
        edge_pairs(&result, "a"),
        vec![
            ("b".to_string(), CallKind::Subroutine),
            ("c".to_string(), CallKind::Function),
        ]
    );
    assert_eq!(edge_pairs(&result, "b"), vec![]);
    assert_eq!(edge_pairs(&result, "c"), vec![]);

    let branches = TreeBuilder::new(&result.graph).build_branches("main");
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].root, "a");
    assert_eq!(branches[0].kind, CallKind::Subroutine);
    assert_eq!(
        branches[0].sequence,
        vec![TraceEntry::new("b", false), TraceEntry::new("c", false)]
    );
}

#[test]
fn ignore_list_keeps_explicit_calls_and_drops_bare_references() {
    let corpus = r#"
program main
    call a(1)
    call d(2)
end program main

subroutine a(x)
end subroutine a

subroutine d(x)
    y = a(x)
end subroutine d
"#;
    let result = extract_corpus(&[("main.f90", corpus)], &["a"]);

    // The explicit call statement stays an edge even though 'a' is ignored.
    assert_eq!(
        edge_pairs(&result, "main"),
        vec![
            ("a".to_string(), CallKind::Subroutine),
            ("d".to_string(), CallKind::Subroutine),
        ]
    );
    // The bare function-shaped reference to the ignored name is dropped.
    assert_eq!(edge_pairs(&result, "d"), vec![]);
    // The ignored definition never opens a context, so 'a' has no node and
    // its branch is a terminal leaf.
    assert!(!result.graph.contains("a"));
    let branches = TreeBuilder::new(&result.graph).build_branches("main");
    assert_eq!(branches[0].root, "a");
    assert_eq!(branches[0].sequence, vec![]);
}

#[test]
fn recursive_corpora_terminate_with_cycle_markers() {
    let corpus = r#"
program main
    call ping(1)
end program main

subroutine ping(x)
    call pong(x)
end subroutine ping

subroutine pong(x)
    call ping(x)
end subroutine pong
"#;
    let result = extract_corpus(&[("main.f90", corpus)], &[]);
    let branches = TreeBuilder::new(&result.graph).build_branches("main");

    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].root, "ping");
    assert_eq!(
        branches[0].sequence,
        vec![TraceEntry::new("pong", false), TraceEntry::new("ping", true)]
    );
}

#[test]
fn extraction_is_idempotent_on_an_unchanged_corpus() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("main.f90"), WORKED_EXAMPLE).expect("write fixture");
    let paths = FileWalker::new(dir.path().to_path_buf())
        .walk()
        .expect("walk");

    let first = CallGraphBuilder::new(paths.clone())
        .extract(|_| {})
        .expect("first run");
    let second = CallGraphBuilder::new(paths).extract(|_| {}).expect("second run");

    assert_eq!(first.entry_point, second.entry_point);
    assert_eq!(first.graph.call_counts(), second.graph.call_counts());
    let first_branches = TreeBuilder::new(&first.graph).build_branches("main");
    let second_branches = TreeBuilder::new(&second.graph).build_branches("main");
    assert_eq!(first_branches, second_branches);
}

#[test]
fn duplicate_definitions_resolve_in_sorted_file_order() {
    let result = extract_corpus(
        &[
            (
                "b.f90",
                "subroutine work(x)\n    call early(x)\nend subroutine work\nsubroutine early(x)\nend subroutine early\n",
            ),
            (
                "z.f90",
                "subroutine work(x)\n    call late(x)\nend subroutine work\n",
            ),
            ("a.f90", "program main\n    call work(1)\nend program main\n"),
        ],
        &[],
    );

    // b.f90 sorts before z.f90, so its body owns the record.
    assert_eq!(
        edge_pairs(&result, "work"),
        vec![("early".to_string(), CallKind::Subroutine)]
    );
    assert!(result.warnings.iter().any(|w| matches!(
        w,
        Warning::DuplicateDefinition { name, .. } if name == "work"
    )));
}

#[test]
fn interfaces_stay_opaque_during_traversal() {
    let corpus = r#"
program main
    x = swap(1, 2)
end program main

interface swap
    module procedure swap_int
end interface

subroutine swap_int(a, b)
    call helper(a)
end subroutine swap_int

subroutine helper(a)
end subroutine helper
"#;
    let result = extract_corpus(&[("main.f90", corpus)], &[]);
    let branches = TreeBuilder::new(&result.graph).build_branches("main");

    // The interface is a terminal node; its member's body is not expanded
    // through it.
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].root, "swap");
    assert_eq!(branches[0].kind, CallKind::Function);
    assert_eq!(branches[0].sequence, vec![]);
    assert_eq!(result.graph.call_count("swap"), 0);
    // The member still has its own record in the graph.
    assert_eq!(
        edge_pairs(&result, "swap_int"),
        vec![("helper".to_string(), CallKind::Subroutine)]
    );
}

#[test]
fn depth_cap_limits_branch_expansion() {
    let corpus = r#"
program main
    call c1(0)
end program main

subroutine c1(x)
    call c2(x)
end subroutine c1

subroutine c2(x)
    call c3(x)
end subroutine c2

subroutine c3(x)
    call c4(x)
end subroutine c3

subroutine c4(x)
end subroutine c4
"#;
    let result = extract_corpus(&[("main.f90", corpus)], &[]);

    let capped = TreeBuilder::new(&result.graph)
        .with_max_depth(Some(2))
        .build_branches("main");
    assert_eq!(
        capped[0].sequence,
        vec![TraceEntry::new("c2", false), TraceEntry::new("c3", false)]
    );

    let uncapped = TreeBuilder::new(&result.graph).build_branches("main");
    assert_eq!(
        uncapped[0].sequence,
        vec![
            TraceEntry::new("c2", false),
            TraceEntry::new("c3", false),
            TraceEntry::new("c4", false),
        ]
    );
}

#[test]
fn unreadable_files_do_not_abort_extraction() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("main.f90"),
        "program main\n    call lib_routine(1)\nend program main\n",
    )
    .expect("write fixture");
    fs::write(
        dir.path().join("lib.f90"),
        "subroutine lib_routine(x)\nend subroutine lib_routine\n",
    )
    .expect("write fixture");
    let mut paths = FileWalker::new(dir.path().to_path_buf())
        .walk()
        .expect("walk");
    // Simulate a file that disappears between discovery and scanning.
    let ghost = dir.path().join("ghost.f90");
    paths.push(ghost);

    let result = CallGraphBuilder::new(paths)
        .extract(|_| {})
        .expect("extraction succeeds");
    assert_eq!(result.entry_point.name, "main");
    assert_eq!(
        edge_pairs(&result, "main"),
        vec![("lib_routine".to_string(), CallKind::Subroutine)]
    );
    assert!(result
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::UnreadableFile { .. })));
}
