use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::output;

/// A batch counter drawn on stderr.
///
/// While it lives, status lines are printed above the bar. Clears itself
/// when dropped (RAII pattern).
pub struct BatchProgress {
    progress_bar: ProgressBar,
    visible: bool,
}

impl BatchProgress {
    /// Creates a bar over `total` batches; hidden when `visible` is false.
    #[allow(clippy::unwrap_used)]
    pub fn new(total: usize, visible: bool) -> Self {
        let progress_bar = if visible {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };
        // unwrap is safe: template string is a compile-time constant
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:30.cyan/blue} {pos}/{len} batches {msg}")
                .unwrap()
                .progress_chars("=> "),
        );

        if visible {
            output::set_progress(progress_bar.clone());
        }

        Self {
            progress_bar,
            visible,
        }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.progress_bar.set_message(message.into());
    }

    pub fn advance(&self) {
        self.progress_bar.inc(1);
    }
}

impl Drop for BatchProgress {
    fn drop(&mut self) {
        if self.visible {
            output::clear_progress();
        }
        self.progress_bar.finish_and_clear();
    }
}
