use crate::{
    analyzers::{collect_calls, collect_definitions},
    core::{
        errors::{Error, Result},
        Callable, CallableKind, EntryPoint, FileCalls, FileDefinitions, Interface, Warning,
    },
    graph::CallGraph,
};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Pipeline phases, for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionPhase {
    CollectingDefinitions,
    Aggregating,
    CollectingCalls,
    MergingGraph,
}

/// Progress event handed to the caller's callback.
#[derive(Clone, Copy, Debug)]
pub struct ExtractionProgress {
    pub phase: ExtractionPhase,
    pub current: usize,
    pub total: usize,
}

/// Everything the pipeline produces for the reporting layer.
#[derive(Debug)]
pub struct ExtractionResult {
    pub graph: CallGraph,
    pub entry_point: EntryPoint,
    pub interfaces: Vec<Interface>,
    pub warnings: Vec<Warning>,
    pub files_scanned: usize,
}

/// Global definition index built from every file's definitions pass.
///
/// The first definition of a name in corpus order owns it; later ones are
/// reported, never silently merged. Program names live outside the
/// callable namespace and never enter the valid set.
pub struct DefinitionIndex {
    callables: HashMap<String, Callable>,
    interfaces: Vec<Interface>,
    interface_slots: HashMap<String, usize>,
    entry: Option<Callable>,
    program_names: HashSet<String>,
    warnings: Vec<Warning>,
}

impl DefinitionIndex {
    /// Fold per-file definitions, in the given order, into one index.
    pub fn aggregate(all_definitions: &[FileDefinitions]) -> Self {
        let mut index = Self {
            callables: HashMap::new(),
            interfaces: Vec::new(),
            interface_slots: HashMap::new(),
            entry: None,
            program_names: HashSet::new(),
            warnings: Vec::new(),
        };
        for defs in all_definitions {
            for program in &defs.programs {
                index.record_program(program);
            }
            for interface in &defs.interfaces {
                index.record_interface(interface);
            }
            for callable in &defs.callables {
                index.record_callable(callable);
            }
        }
        index
    }

    fn record_program(&mut self, program: &Callable) {
        self.program_names.insert(program.name.clone());
        match &self.entry {
            None => self.entry = Some(program.clone()),
            Some(kept) => self.warnings.push(Warning::MultipleEntryPoints {
                kept: kept.name.clone(),
                kept_file: kept.file.clone(),
                discarded: program.name.clone(),
                discarded_file: program.file.clone(),
            }),
        }
    }

    fn record_interface(&mut self, interface: &Interface) {
        if let Some(kept) = self.first_definition_file(&interface.name) {
            self.warnings.push(Warning::DuplicateDefinition {
                name: interface.name.clone(),
                kept,
                discarded: interface.file.clone(),
            });
            return;
        }
        self.interface_slots
            .insert(interface.name.clone(), self.interfaces.len());
        self.interfaces.push(interface.clone());
    }

    fn record_callable(&mut self, callable: &Callable) {
        if let Some(kept) = self.first_definition_file(&callable.name) {
            self.warnings.push(Warning::DuplicateDefinition {
                name: callable.name.clone(),
                kept,
                discarded: callable.file.clone(),
            });
            return;
        }
        self.callables
            .insert(callable.name.clone(), callable.clone());
    }

    /// The file holding the winning definition of `name`, if any.
    fn first_definition_file(&self, name: &str) -> Option<PathBuf> {
        if let Some(winner) = self.callables.get(name) {
            return Some(winner.file.clone());
        }
        self.interface_slots
            .get(name)
            .map(|&i| self.interfaces[i].file.clone())
    }

    pub fn entry_point(&self) -> Option<&Callable> {
        self.entry.as_ref()
    }

    /// Functions, subroutines and interfaces, minus ignored names. The
    /// entry point's own name is deliberately not a member.
    pub fn valid_names(&self, ignored: &[String]) -> im::HashSet<String> {
        let mut valid: im::HashSet<String> = self.callables.keys().cloned().collect();
        for interface in &self.interfaces {
            valid.insert(interface.name.clone());
        }
        for name in ignored {
            valid.remove(name);
        }
        valid
    }

    pub fn kind_of(&self, name: &str) -> Option<CallableKind> {
        if self.program_names.contains(name) {
            return Some(CallableKind::Program);
        }
        if let Some(callable) = self.callables.get(name) {
            return Some(callable.kind);
        }
        if self.interface_slots.contains_key(name) {
            return Some(CallableKind::Interface);
        }
        None
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn callable_count(&self) -> usize {
        self.callables.len()
    }
}

/// Two-pass extraction over a fixed file list.
pub struct CallGraphBuilder {
    files: Vec<PathBuf>,
    ignored: Vec<String>,
    parallel: bool,
    jobs: Option<usize>,
}

impl CallGraphBuilder {
    /// `files` must already be deterministic and duplicate-free; the
    /// walker guarantees that. Their order fixes every first-wins choice.
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            ignored: Vec::new(),
            parallel: true,
            jobs: None,
        }
    }

    /// Names to drop from the valid set. Compared case-insensitively.
    pub fn with_ignored(mut self, ignored: &[String]) -> Self {
        self.ignored = ignored.iter().map(|s| s.to_ascii_lowercase()).collect();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Run the full pipeline.
    pub fn extract<F>(&self, mut progress_callback: F) -> Result<ExtractionResult>
    where
        F: FnMut(ExtractionProgress),
    {
        if let Some(jobs) = self.jobs {
            if jobs > 0 {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build_global()
                    .ok(); // Ignore if already configured
            }
        }
        let total = self.files.len();
        if self.parallel {
            log::debug!(
                "scanning {} files with {} worker threads",
                total,
                self.jobs.filter(|&j| j > 0).unwrap_or_else(num_cpus::get)
            );
        }

        // Phase 1: definitions for every file. Must fully complete before
        // call collection; the valid-name set is global.
        progress_callback(ExtractionProgress {
            phase: ExtractionPhase::CollectingDefinitions,
            current: 0,
            total,
        });
        let outcomes = self.run_pass(|path, content| collect_definitions(path, content));
        let (definitions, mut warnings) = split_outcomes(outcomes);
        progress_callback(ExtractionProgress {
            phase: ExtractionPhase::CollectingDefinitions,
            current: total,
            total,
        });

        // Phase 2: aggregate and pick the entry point.
        progress_callback(ExtractionProgress {
            phase: ExtractionPhase::Aggregating,
            current: 0,
            total: 0,
        });
        let index = DefinitionIndex::aggregate(&definitions);
        for warning in index.warnings() {
            log::warn!("{warning}");
        }
        warnings.extend(index.warnings().to_vec());
        log::info!(
            "definitions pass: {} files, {} callables, {} interfaces",
            definitions.len(),
            index.callable_count(),
            index.interfaces().len()
        );
        let entry = index.entry_point().cloned().ok_or_else(|| {
            Error::UnresolvedEntryPoint(format!(
                "no program block found in {} matching files",
                self.files.len()
            ))
        })?;

        // Phase 3: call sites, now that the valid set exists.
        progress_callback(ExtractionProgress {
            phase: ExtractionPhase::CollectingCalls,
            current: 0,
            total,
        });
        let valid = index.valid_names(&self.ignored);
        let outcomes = self.run_pass(|path, content| collect_calls(path, content, &valid));
        let (calls, more_warnings) = split_outcomes(outcomes);
        warnings.extend(more_warnings);
        progress_callback(ExtractionProgress {
            phase: ExtractionPhase::CollectingCalls,
            current: total,
            total,
        });

        // Phase 4: merge everything into the read-only graph.
        progress_callback(ExtractionProgress {
            phase: ExtractionPhase::MergingGraph,
            current: 0,
            total: 0,
        });
        let graph = merge_graph(&calls, &index, &entry);
        log::info!(
            "call graph: {} nodes, {} edges, entry point '{}'",
            graph.node_count(),
            graph.edge_count(),
            entry.name
        );

        Ok(ExtractionResult {
            graph,
            entry_point: EntryPoint {
                name: entry.name,
                file: entry.file,
            },
            interfaces: index.interfaces().to_vec(),
            warnings,
            files_scanned: self.files.len(),
        })
    }

    /// Run one per-file pass over the whole corpus, collecting results in
    /// input order so every later step is deterministic.
    fn run_pass<T, C>(&self, collect: C) -> Vec<std::result::Result<T, Warning>>
    where
        T: Send,
        C: Fn(&Path, &str) -> T + Sync,
    {
        if self.parallel {
            self.files
                .par_iter()
                .map(|path| scan_file(path, &collect))
                .collect()
        } else {
            self.files
                .iter()
                .map(|path| scan_file(path, &collect))
                .collect()
        }
    }
}

/// Read one file and apply a collector. Unreadable files (missing, no
/// permission, not valid UTF-8) become warnings, never errors.
fn scan_file<T, C>(path: &Path, collect: &C) -> std::result::Result<T, Warning>
where
    C: Fn(&Path, &str) -> T,
{
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(collect(path, &content)),
        Err(e) => Err(Warning::UnreadableFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

fn split_outcomes<T>(outcomes: Vec<std::result::Result<T, Warning>>) -> (Vec<T>, Vec<Warning>) {
    let mut values = Vec::with_capacity(outcomes.len());
    let mut warnings = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(value) => values.push(value),
            Err(warning) => {
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    }
    (values, warnings)
}

/// Merge per-file caller records into the global graph. The first record
/// for a name wins, matching the duplicate-definition policy; interface
/// nodes are added with no edges; the entry node is guaranteed to exist.
fn merge_graph(calls: &[FileCalls], index: &DefinitionIndex, entry: &Callable) -> CallGraph {
    let mut graph = CallGraph::new();
    let mut merged: HashSet<String> = HashSet::new();
    for file in calls {
        for record in &file.callers {
            if !merged.insert(record.name.clone()) {
                log::debug!(
                    "dropping caller record for '{}' from {}, an earlier file owns it",
                    record.name,
                    file.path.display()
                );
                continue;
            }
            let kind = index.kind_of(&record.name).unwrap_or(CallableKind::Function);
            if kind == CallableKind::Interface {
                // The body belongs to a discarded duplicate definition;
                // interface nodes stay zero out-degree.
                log::debug!(
                    "dropping caller record for interface '{}' from {}",
                    record.name,
                    file.path.display()
                );
                continue;
            }
            graph.ensure_node(&record.name, kind);
            for edge in &record.edges {
                graph.add_call(&record.name, edge.clone());
            }
        }
    }
    for interface in index.interfaces() {
        graph.ensure_node(&interface.name, CallableKind::Interface);
    }
    // The entry node must exist even if its file vanished between passes,
    // so traversal never hits the unknown-name path.
    graph.ensure_node(&entry.name, CallableKind::Program);
    graph
}
