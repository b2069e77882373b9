//! download command - Fetch artifacts into the local filesystem

use clap::Args;
use nexus3_core::{DownloadOptions, TransferExecutor};
use serde::Serialize;

use super::{connect, report_count, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressReporter};

/// Arguments for the `download` command
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Repository path of a file or a directory (ending with `/`)
    pub source: String,

    /// Local file or directory
    pub destination: String,

    /// Do not reproduce the remote directory structure locally
    #[arg(long)]
    pub flatten: bool,

    /// Download even when the local copy is up-to-date
    #[arg(long)]
    pub nocache: bool,
}

#[derive(Serialize)]
struct DownloadOutput {
    source: String,
    destination: String,
    downloaded: usize,
    skipped: usize,
    failed: usize,
    bytes: u64,
    size_human: String,
}

/// Execute the download command
///
/// Files that failed individually are reported but do not change the exit
/// code unless nothing at all was retrieved.
pub async fn execute(args: DownloadArgs, formatter: &Formatter) -> ExitCode {
    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    formatter.info(&format!("Downloading {} to {}", args.source, args.destination));

    let options = DownloadOptions {
        flatten: args.flatten,
        no_cache: args.nocache,
    };
    let progress = ProgressReporter::new(formatter);
    let executor = TransferExecutor::new(&client).with_progress(&progress);
    let summary = match executor
        .download(&args.source, &args.destination, options)
        .await
    {
        Ok(summary) => summary,
        Err(e) => return report_error(formatter, &e),
    };

    let size_human = humansize::format_size(summary.bytes, humansize::BINARY);
    if formatter.is_json() {
        formatter.json(&DownloadOutput {
            source: args.source.clone(),
            destination: args.destination.clone(),
            downloaded: summary.downloaded,
            skipped: summary.skipped,
            failed: summary.failed,
            bytes: summary.bytes,
            size_human: size_human.clone(),
        });
    }

    if summary.failed > 0 {
        formatter.warning(&format!(
            "{} could not be downloaded; run with -v for details",
            crate::output::plural_files(summary.failed)
        ));
    }

    let done = format!(
        " to {} ({size_human}, {} up-to-date)",
        args.destination, summary.skipped
    );
    report_count(formatter, "download", Some(summary.count()), &done)
}
