use crate::core::{AnalysisReport, CallBranch};
use clap::ValueEnum;
use colored::*;
use comfy_table::{presets, CellAlignment, ContentArrangement, Table};
use html_escape::encode_text;
use serde::{Deserialize, Serialize};
use serde_json;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Terminal,
    Json,
    Html,
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct HtmlWriter<W: Write> {
    writer: W,
}

impl<W: Write> HtmlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for HtmlWriter<W> {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        self.write_header(report)?;
        self.write_summary(report)?;
        self.write_branches(report)?;
        self.write_interfaces(report)?;
        self.write_warnings(report)?;
        self.write_footer()?;
        Ok(())
    }
}

impl<W: Write> HtmlWriter<W> {
    fn write_header(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        writeln!(self.writer, "<!DOCTYPE html>")?;
        writeln!(self.writer, "<html lang=\"en\">")?;
        writeln!(self.writer, "<head>")?;
        writeln!(self.writer, "<meta charset=\"utf-8\">")?;
        writeln!(
            self.writer,
            "<title>Callmap Report: {}</title>",
            encode_text(&report.entry_point.name)
        )?;
        writeln!(self.writer, "<style>")?;
        writeln!(
            self.writer,
            "body {{ font-family: monospace; margin: 2em; }}"
        )?;
        writeln!(
            self.writer,
            "summary {{ cursor: pointer; font-weight: bold; }}"
        )?;
        writeln!(
            self.writer,
            ".kind {{ color: #666; font-weight: normal; }}"
        )?;
        writeln!(self.writer, ".cycle {{ color: #b00; }}")?;
        writeln!(self.writer, "</style>")?;
        writeln!(self.writer, "</head>")?;
        writeln!(self.writer, "<body>")?;
        writeln!(self.writer, "<h1>Callmap Analysis Report</h1>")?;
        writeln!(
            self.writer,
            "<p>Generated: {}</p>",
            report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        Ok(())
    }

    fn write_summary(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        writeln!(self.writer, "<h2>Summary</h2>")?;
        writeln!(self.writer, "<dl>")?;
        writeln!(
            self.writer,
            "<dt>Entry point</dt><dd>{} ({})</dd>",
            encode_text(&report.entry_point.name),
            encode_text(&report.entry_point.file.display().to_string())
        )?;
        writeln!(
            self.writer,
            "<dt>Files scanned</dt><dd>{}</dd>",
            report.files_scanned
        )?;
        writeln!(
            self.writer,
            "<dt>Call branches</dt><dd>{}</dd>",
            report.branches.len()
        )?;
        writeln!(
            self.writer,
            "<dt>Calls recorded</dt><dd>{}</dd>",
            total_calls(report)
        )?;
        writeln!(self.writer, "</dl>")?;
        Ok(())
    }

    fn write_branches(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        writeln!(self.writer, "<h2>Call Tree</h2>")?;
        if report.branches.is_empty() {
            writeln!(self.writer, "<p>The entry point makes no calls.</p>")?;
            return Ok(());
        }
        for branch in &report.branches {
            writeln!(
                self.writer,
                "<details open><summary>{} <span class=\"kind\">[{}]</span></summary>",
                encode_text(&branch.root),
                branch.kind
            )?;
            if branch.sequence.is_empty() {
                writeln!(self.writer, "<p>No further calls.</p>")?;
            } else {
                writeln!(self.writer, "<ol>")?;
                for entry in &branch.sequence {
                    if entry.cycle {
                        writeln!(
                            self.writer,
                            "<li>{} <span class=\"cycle\">(cycle)</span></li>",
                            encode_text(&entry.name)
                        )?;
                    } else {
                        writeln!(self.writer, "<li>{}</li>", encode_text(&entry.name))?;
                    }
                }
                writeln!(self.writer, "</ol>")?;
            }
            writeln!(self.writer, "</details>")?;
        }
        Ok(())
    }

    fn write_interfaces(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        if report.interfaces.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "<h2>Interfaces</h2>")?;
        writeln!(self.writer, "<ul>")?;
        for interface in &report.interfaces {
            writeln!(
                self.writer,
                "<li>{}: {}</li>",
                encode_text(&interface.name),
                encode_text(&interface.members.join(", "))
            )?;
        }
        writeln!(self.writer, "</ul>")?;
        Ok(())
    }

    fn write_warnings(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        if report.warnings.is_empty() {
            return Ok(());
        }
        writeln!(
            self.writer,
            "<h2>Warnings ({})</h2>",
            report.warnings.len()
        )?;
        writeln!(self.writer, "<ul>")?;
        for warning in &report.warnings {
            writeln!(
                self.writer,
                "<li>{}</li>",
                encode_text(&warning.to_string())
            )?;
        }
        writeln!(self.writer, "</ul>")?;
        Ok(())
    }

    fn write_footer(&mut self) -> anyhow::Result<()> {
        writeln!(self.writer, "</body>")?;
        writeln!(self.writer, "</html>")?;
        Ok(())
    }
}

pub struct TerminalWriter;

impl Default for TerminalWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalWriter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputWriter for TerminalWriter {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        print_header(report);
        print_summary(report);
        print_branches(report);
        print_interfaces(report);
        print_call_counts(report);
        print_warnings(report);
        Ok(())
    }
}

fn print_header(report: &AnalysisReport) {
    println!("{}", "Callmap Analysis Report".bold().blue());
    println!("{}", "=======================".blue());
    println!(
        "Generated: {}",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
}

fn print_summary(report: &AnalysisReport) {
    println!("{}", "Summary:".bold());
    println!(
        "  Entry point: {} ({})",
        report.entry_point.name.yellow(),
        report.entry_point.file.display()
    );
    println!("  Files scanned: {}", report.files_scanned);
    println!("  Call branches: {}", report.branches.len());
    println!("  Interfaces: {}", report.interfaces.len());
    println!("  Calls recorded: {}", total_calls(report));
    println!(
        "  Mean calls per callable: {:.1}",
        mean_calls(report).unwrap_or(0.0)
    );
    println!(
        "  Median calls per callable: {:.1}",
        median_calls(report).unwrap_or(0.0)
    );
    if let Some((name, count)) = busiest_caller(report) {
        println!("  Busiest caller: {name} ({count} calls)");
    }
    println!();
}

fn print_branches(report: &AnalysisReport) {
    println!(
        "{} (calls from '{}'):",
        "Call tree".bold(),
        report.entry_point.name
    );
    if report.branches.is_empty() {
        println!("  {}", "(the entry point makes no calls)".dimmed());
        println!();
        return;
    }
    for branch in &report.branches {
        print_branch(branch);
    }
    println!();
}

fn print_branch(branch: &CallBranch) {
    println!("  {} [{}]", branch.root.yellow(), branch.kind);
    if branch.sequence.is_empty() {
        println!("      {}", "(no further calls)".dimmed());
        return;
    }
    for entry in &branch.sequence {
        if entry.cycle {
            println!("      {} {}", entry.name, "(cycle)".red());
        } else {
            println!("      {}", entry.name);
        }
    }
}

fn print_interfaces(report: &AnalysisReport) {
    if report.interfaces.is_empty() {
        return;
    }
    println!("{}", "Interfaces:".bold());
    for interface in &report.interfaces {
        println!(
            "  {} -> {}",
            interface.name.yellow(),
            interface.members.join(", ")
        );
    }
    println!();
}

fn print_call_counts(report: &AnalysisReport) {
    let top = busiest_callers(report, 10);
    if top.is_empty() {
        return;
    }

    println!("{}", "Busiest callers (top 10):".bold());
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Callable", "Direct calls"]);
    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }
    for (name, count) in top {
        table.add_row(vec![name, count.to_string()]);
    }
    for line in table.to_string().lines() {
        println!("  {}", line.trim_end());
    }
    println!();
}

fn print_warnings(report: &AnalysisReport) {
    if report.warnings.is_empty() {
        return;
    }
    println!(
        "{} {} warning(s):",
        "⚠".yellow().bold(),
        report.warnings.len()
    );
    for warning in &report.warnings {
        println!("  {}", warning.to_string().yellow());
    }
    println!();
}

fn total_calls(report: &AnalysisReport) -> usize {
    report.call_counts.values().sum()
}

fn mean_calls(report: &AnalysisReport) -> Option<f64> {
    if report.call_counts.is_empty() {
        return None;
    }
    Some(total_calls(report) as f64 / report.call_counts.len() as f64)
}

fn median_calls(report: &AnalysisReport) -> Option<f64> {
    if report.call_counts.is_empty() {
        return None;
    }
    let mut counts: Vec<usize> = report.call_counts.values().copied().collect();
    counts.sort_unstable();
    let mid = counts.len() / 2;
    if counts.len() % 2 == 1 {
        Some(counts[mid] as f64)
    } else {
        Some((counts[mid - 1] + counts[mid]) as f64 / 2.0)
    }
}

/// Names with the most outgoing calls, ties broken alphabetically.
fn busiest_callers(report: &AnalysisReport, limit: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = report
        .call_counts
        .iter()
        .filter(|(_, &count)| count > 0)
        .map(|(name, &count)| (name.clone(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(limit);
    counts
}

fn busiest_caller(report: &AnalysisReport) -> Option<(String, usize)> {
    busiest_callers(report, 1).into_iter().next()
}

pub fn create_writer(
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<Box<dyn OutputWriter>> {
    match (format, output) {
        (OutputFormat::Terminal, None) => Ok(Box::new(TerminalWriter::new())),
        (OutputFormat::Terminal, Some(_)) => {
            anyhow::bail!("terminal format writes to stdout only, use --format json or html")
        }
        (OutputFormat::Json, None) => Ok(Box::new(JsonWriter::new(std::io::stdout()))),
        (OutputFormat::Json, Some(path)) => {
            Ok(Box::new(JsonWriter::new(std::fs::File::create(path)?)))
        }
        (OutputFormat::Html, None) => Ok(Box::new(HtmlWriter::new(std::io::stdout()))),
        (OutputFormat::Html, Some(path)) => {
            Ok(Box::new(HtmlWriter::new(std::fs::File::create(path)?)))
        }
    }
}
