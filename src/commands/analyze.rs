use crate::{
    builders::call_graph::{CallGraphBuilder, ExtractionPhase, ExtractionProgress},
    config,
    core::{
        errors::{Error, Result},
        AnalysisReport,
    },
    graph::TreeBuilder,
    io::{create_writer, FileWalker, OutputFormat},
    progress::{ProgressConfig, ProgressManager},
};
use anyhow::Context;
use chrono::Utc;
use indicatif::ProgressBar;
use std::path::PathBuf;

pub struct AnalyzeConfig {
    pub path: PathBuf,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub extensions: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub max_depth: Option<usize>,
    pub jobs: usize,
    pub parallel: bool,
    pub quiet: bool,
    pub verbosity: u8,
}

pub fn handle_analyze(config: AnalyzeConfig) -> Result<()> {
    let project = config::get_config();
    ProgressManager::init_global(ProgressConfig::from_env(config.quiet, config.verbosity));
    let manager = ProgressManager::global()
        .unwrap_or_else(|| ProgressManager::new(ProgressConfig::default()));

    let extensions = resolve_extensions(config.extensions, &project.files.extensions);
    let exclude = resolve_exclude(config.exclude, &project.files.exclude);
    let ignore = resolve_ignore(config.ignore, &project.analysis.ignore);
    let max_depth = config.max_depth.or(project.analysis.max_depth);
    let format = resolve_format(config.format, project.output.default_format);

    let spinner = manager.discovery_spinner();
    let files = FileWalker::new(config.path.clone())
        .with_extensions(&extensions)
        .with_exclude_patterns(exclude)
        .walk()?;
    spinner.finish_and_clear();
    if files.is_empty() {
        return Err(Error::Configuration(format!(
            "no source files matching [{}] under {}",
            extensions.join(", "),
            config.path.display()
        )));
    }
    log::info!("discovered {} source files", files.len());

    let mut active_bar: Option<ProgressBar> = None;
    let extraction = CallGraphBuilder::new(files)
        .with_ignored(&ignore)
        .with_parallel(config.parallel)
        .with_jobs(resolve_jobs(config.jobs))
        .extract(|progress| update_progress(&manager, &mut active_bar, progress))?;

    let branches = TreeBuilder::new(&extraction.graph)
        .with_max_depth(max_depth)
        .build_branches(&extraction.entry_point.name);

    let report = AnalysisReport {
        project_path: config.path,
        timestamp: Utc::now(),
        entry_point: extraction.entry_point,
        files_scanned: extraction.files_scanned,
        branches,
        interfaces: extraction.interfaces,
        call_counts: extraction.graph.call_counts(),
        warnings: extraction.warnings,
    };

    manager.clear().ok();
    let mut writer = create_writer(format, config.output.as_deref())
        .context("Failed to create report writer")?;
    writer
        .write_report(&report)
        .context("Failed to write report")?;
    Ok(())
}

/// Drive the phase bars from pipeline progress events.
fn update_progress(
    manager: &ProgressManager,
    active: &mut Option<ProgressBar>,
    progress: ExtractionProgress,
) {
    match progress.phase {
        ExtractionPhase::CollectingDefinitions | ExtractionPhase::CollectingCalls => {
            if progress.current == 0 {
                let bar = match progress.phase {
                    ExtractionPhase::CollectingDefinitions => {
                        manager.definitions_bar(progress.total as u64)
                    }
                    _ => manager.calls_bar(progress.total as u64),
                };
                *active = Some(bar);
            } else if progress.current >= progress.total {
                if let Some(bar) = active.take() {
                    bar.set_position(progress.total as u64);
                    bar.finish_and_clear();
                }
            }
        }
        ExtractionPhase::Aggregating | ExtractionPhase::MergingGraph => {
            if let Some(bar) = active.take() {
                bar.finish_and_clear();
            }
        }
    }
}

// Pure function to pick CLI extensions over configured ones
fn resolve_extensions(cli: Option<Vec<String>>, configured: &[String]) -> Vec<String> {
    cli.filter(|v| !v.is_empty())
        .unwrap_or_else(|| configured.to_vec())
}

// Pure function to pick CLI exclude patterns over configured ones
fn resolve_exclude(cli: Option<Vec<String>>, configured: &[String]) -> Vec<String> {
    cli.filter(|v| !v.is_empty())
        .unwrap_or_else(|| configured.to_vec())
}

/// The ignore list is additive: configured names and CLI names combine,
/// so the project baseline survives ad hoc additions.
fn resolve_ignore(cli: Option<Vec<String>>, configured: &[String]) -> Vec<String> {
    let mut ignore = configured.to_vec();
    ignore.extend(cli.unwrap_or_default());
    ignore.sort();
    ignore.dedup();
    ignore
}

// Pure function to settle the output format
fn resolve_format(cli: Option<OutputFormat>, configured: Option<OutputFormat>) -> OutputFormat {
    cli.or(configured).unwrap_or(OutputFormat::Terminal)
}

// Pure function to map the --jobs flag onto the builder setting
fn resolve_jobs(jobs: usize) -> Option<usize> {
    if jobs == 0 {
        None
    } else {
        Some(jobs)
    }
}
