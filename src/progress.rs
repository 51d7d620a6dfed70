//! Progress feedback for the extraction pipeline.
//!
//! Built on `indicatif`. The two per-file passes get counted bars and file
//! discovery gets a spinner; everything shares one draw target so parallel
//! scanning cannot interleave bar redraws.
//!
//! # Progress Behavior
//!
//! - **Quiet Mode**: no progress output (respects `CALLMAP_QUIET` and the
//!   `--quiet` flag)
//! - **Non-TTY**: bars are disabled in CI and piped output
//!
//! # Examples
//!
//! ```rust,no_run
//! use callmap::progress::{ProgressConfig, ProgressManager};
//!
//! let manager = ProgressManager::new(ProgressConfig::from_env(false, 0));
//! let bar = manager.definitions_bar(100);
//! for _ in 0..100 {
//!     // Scan a file...
//!     bar.inc(1);
//! }
//! bar.finish_and_clear();
//! ```

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

const TEMPLATE_DEFINITIONS: &str = "📖 {msg} {pos}/{len} files ({percent}%) - {eta}";
const TEMPLATE_CALLS: &str = "🔗 {msg} {pos}/{len} files ({percent}%) - {eta}";
const TEMPLATE_SPINNER: &str = "{spinner} {msg}";

/// Configuration for progress display behavior
#[derive(Debug, Clone, Default)]
pub struct ProgressConfig {
    /// Whether to suppress all progress output
    pub quiet_mode: bool,
    /// Verbosity level from repeated -v flags
    pub verbosity: u8,
}

impl ProgressConfig {
    /// Combine the CLI quiet flag with the `CALLMAP_QUIET` variable.
    pub fn from_env(quiet: bool, verbosity: u8) -> Self {
        Self {
            quiet_mode: quiet || std::env::var("CALLMAP_QUIET").is_ok(),
            verbosity,
        }
    }

    /// Bars are drawn only on an interactive stderr.
    pub fn should_show_progress(&self) -> bool {
        use std::io::IsTerminal;
        !self.quiet_mode && std::io::stderr().is_terminal()
    }
}

/// Global progress manager instance
static GLOBAL_PROGRESS: Lazy<Arc<Mutex<Option<ProgressManager>>>> =
    Lazy::new(|| Arc::new(Mutex::new(None)));

/// Hands out the pipeline's bars, all attached to one `MultiProgress`.
#[derive(Clone)]
pub struct ProgressManager {
    multi: Arc<MultiProgress>,
    config: ProgressConfig,
}

impl ProgressManager {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            config,
        }
    }

    /// Initialize the global progress manager
    pub fn init_global(config: ProgressConfig) {
        *GLOBAL_PROGRESS.lock().unwrap() = Some(Self::new(config));
    }

    /// Get a reference to the global progress manager
    pub fn global() -> Option<Self> {
        GLOBAL_PROGRESS.lock().unwrap().clone()
    }

    /// Counted bar for the definitions pass over `total` files.
    pub fn definitions_bar(&self, total: u64) -> ProgressBar {
        self.pass_bar(total, TEMPLATE_DEFINITIONS, "Collecting definitions")
    }

    /// Counted bar for the call-site pass over `total` files.
    pub fn calls_bar(&self, total: u64) -> ProgressBar {
        self.pass_bar(total, TEMPLATE_CALLS, "Collecting call sites")
    }

    fn pass_bar(&self, total: u64, template: &str, message: &'static str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::default_bar()
                .template(template)
                .expect("Invalid progress bar template")
                .progress_chars("█▓▒░  "),
        );
        bar.set_message(message);
        bar
    }

    /// Spinner shown while the walker enumerates source files.
    pub fn discovery_spinner(&self) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }
        let spinner = self.multi.add(ProgressBar::new_spinner());
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template(TEMPLATE_SPINNER)
                .expect("Invalid spinner template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        spinner.set_message("Discovering source files");
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        spinner
    }

    /// Clear all progress bars from the display
    ///
    /// Call before printing the final report so bars do not interleave
    /// with it.
    pub fn clear(&self) -> std::io::Result<()> {
        self.multi.clear()
    }
}
