//! Global output configuration and status reporting.
//!
//! ## Design Principles
//!
//! - Subtitle output goes to files, never to stdout
//! - Status messages, progress, and logs go to stderr
//! - Quiet mode suppresses everything except warnings and errors
//! - Verbose mode adds per-sentence detail
//! - While a progress bar is active, status lines are printed above it

use indicatif::ProgressBar;
use std::fmt;
use std::sync::{OnceLock, RwLock};

/// Global output configuration.
static OUTPUT_CONFIG: OnceLock<OutputConfig> = OnceLock::new();

/// Progress bar currently drawn on stderr, if any.
static ACTIVE_PROGRESS: RwLock<Option<ProgressBar>> = RwLock::new(None);

/// Output configuration settings.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Show detail lines (dropped sentences, cache hits).
    pub verbose: bool,
    /// Disable colored output.
    pub no_color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            verbose: false,
            // Check NO_COLOR environment variable (https://no-color.org/)
            no_color: std::env::var("NO_COLOR").is_ok(),
        }
    }
}

/// Initialize the global output configuration.
///
/// This should be called once at startup with the CLI flags.
/// If called multiple times, subsequent calls are ignored.
pub fn init(config: OutputConfig) {
    let _ = OUTPUT_CONFIG.set(config);
}

/// Get the current output configuration.
pub fn config() -> &'static OutputConfig {
    OUTPUT_CONFIG.get_or_init(OutputConfig::default)
}

/// Check if quiet mode is enabled.
pub fn is_quiet() -> bool {
    config().quiet
}

/// Check if verbose mode is enabled.
pub fn is_verbose() -> bool {
    config().verbose && !config().quiet
}

/// Check if colors are disabled.
pub fn is_no_color() -> bool {
    config().no_color
}

/// Routes status lines above `bar` until [`clear_progress`] is called.
pub fn set_progress(bar: ProgressBar) {
    if let Ok(mut active) = ACTIVE_PROGRESS.write() {
        *active = Some(bar);
    }
}

pub fn clear_progress() {
    if let Ok(mut active) = ACTIVE_PROGRESS.write() {
        *active = None;
    }
}

/// Writes one line to stderr without tearing an active progress bar.
pub fn emit(args: fmt::Arguments<'_>) {
    let bar = ACTIVE_PROGRESS.read().ok().and_then(|active| active.clone());
    match bar {
        Some(bar) => bar.suspend(|| eprintln!("{args}")),
        None => eprintln!("{args}"),
    }
}

/// Print a status message to stderr (respects quiet mode).
///
/// Use this for batch progress, retries, skips, and the final summary.
#[macro_export]
macro_rules! status {
    ($($arg:tt)*) => {
        if !$crate::output::is_quiet() {
            $crate::output::emit(format_args!($($arg)*));
        }
    };
}

/// Print a detail message to stderr (verbose mode only).
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        if $crate::output::is_verbose() {
            $crate::output::emit(format_args!($($arg)*));
        }
    };
}

/// Print a warning message to stderr (always shown, even in quiet mode).
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        $crate::output::emit(format_args!($($arg)*));
    }};
}
