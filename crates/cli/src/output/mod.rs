//! Output formatting and progress display

mod formatter;
mod progress;

pub use formatter::{Formatter, plural_files};
pub use progress::ProgressReporter;

/// Output settings shared by every command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Strict JSON on stdout, no colors or progress
    pub json: bool,
    pub no_color: bool,
    /// Only errors are printed
    pub quiet: bool,
}
