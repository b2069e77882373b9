//! indicatif progress bars for batch transfers

use indicatif::{ProgressBar, ProgressStyle};
use nexus3_core::TransferProgress;

use super::Formatter;

const TEMPLATE: &str = "{prefix:>11.bold} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";

/// Progress bar driven by the transfer executor
///
/// Hidden in JSON and quiet modes.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(formatter: &Formatter) -> Self {
        let bar = if formatter.is_json() || formatter.is_quiet() {
            ProgressBar::hidden()
        } else {
            let style = ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
            ProgressBar::new(0).with_style(style)
        };
        Self { bar }
    }
}

impl TransferProgress for ProgressReporter {
    fn start(&self, label: &str, total: u64) {
        self.bar.set_prefix(label.to_string());
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn advance(&self, item: &str) {
        self.bar.set_message(item.to_string());
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
