//! Flattened reachability below the entry point.

use crate::core::{CallBranch, CallEdge, TraceEntry};
use crate::graph::CallGraph;
use im::{HashSet, Vector};

/// Depth-first expansion with explicit bookkeeping instead of recursion,
/// so a cyclic graph can never overflow the stack.
pub struct TreeBuilder<'a> {
    graph: &'a CallGraph,
    max_depth: Option<usize>,
}

enum WalkStep {
    Enter { name: String, depth: usize },
    Exit(String),
}

impl<'a> TreeBuilder<'a> {
    pub fn new(graph: &'a CallGraph) -> Self {
        Self {
            graph,
            max_depth: None,
        }
    }

    /// Bound expansion to `depth` levels below each branch root. Cyclic
    /// graphs terminate without a bound; this guards very deep acyclic
    /// chains.
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// One branch per recorded call of the entry point, in source order.
    /// Duplicate direct callees expand to duplicate branches, as written.
    pub fn build_branches(&self, entry: &str) -> Vec<CallBranch> {
        self.graph
            .edges(entry)
            .iter()
            .map(|edge| CallBranch {
                root: edge.callee.clone(),
                kind: edge.kind,
                sequence: self.expand(&edge.callee),
            })
            .collect()
    }

    /// Everything transitively reachable below `root`, flattened pre-order.
    /// The root itself is not part of the sequence.
    pub fn expand(&self, root: &str) -> Vec<TraceEntry> {
        let mut sequence = Vec::new();
        if !self.graph.contains(root) {
            // External or ignored target: a terminal leaf, not a defect.
            return sequence;
        }

        let mut on_path: HashSet<String> = HashSet::new();
        on_path.insert(root.to_string());
        let mut stack: Vec<WalkStep> = Vec::new();
        self.push_callees(&mut stack, &self.graph.edges(root), 0);

        while let Some(step) = stack.pop() {
            match step {
                WalkStep::Enter { name, depth } => {
                    let cycle = on_path.contains(&name);
                    sequence.push(TraceEntry::new(&name, cycle));
                    if cycle {
                        // Emitted once as a cycle marker; expanding again
                        // would never terminate.
                        continue;
                    }
                    if !self.graph.contains(&name) {
                        log::debug!("'{name}' has no definition in the corpus, treating as a leaf");
                        continue;
                    }
                    let callees = self.graph.edges(&name);
                    if callees.is_empty() {
                        continue;
                    }
                    on_path.insert(name.clone());
                    stack.push(WalkStep::Exit(name));
                    self.push_callees(&mut stack, &callees, depth + 1);
                }
                WalkStep::Exit(name) => {
                    on_path.remove(&name);
                }
            }
        }
        sequence
    }

    fn push_callees(&self, stack: &mut Vec<WalkStep>, callees: &Vector<CallEdge>, depth: usize) {
        if let Some(cap) = self.max_depth {
            if depth >= cap {
                return;
            }
        }
        // Reversed so the explicit stack pops them in source order.
        for edge in callees.iter().rev() {
            stack.push(WalkStep::Enter {
                name: edge.callee.clone(),
                depth,
            });
        }
    }
}
