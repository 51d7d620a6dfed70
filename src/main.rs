use anyhow::Result;
use callmap::cli::{parse_args, Commands};
use callmap::commands::{handle_analyze, init_config, AnalyzeConfig};

// Main orchestrator function
fn main() -> Result<()> {
    let cli = parse_args();

    match cli.command {
        Commands::Analyze {
            path,
            format,
            output,
            extensions,
            exclude,
            ignore,
            max_depth,
            jobs,
            no_parallel,
            quiet,
            verbosity,
        } => {
            init_logging(verbosity);
            let config = AnalyzeConfig {
                path,
                format,
                output,
                extensions,
                exclude,
                ignore,
                max_depth,
                jobs,
                parallel: should_use_parallel(no_parallel),
                quiet,
                verbosity,
            };
            handle_analyze(config)?;
        }
        Commands::Init { force } => {
            init_logging(0);
            init_config(force)?;
        }
    }
    Ok(())
}

/// Warnings are always visible; -v raises the filter for this crate and
/// RUST_LOG still overrides everything.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_module("callmap", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}

// Pure function to determine parallel mode
fn should_use_parallel(no_parallel: bool) -> bool {
    !no_parallel
}
