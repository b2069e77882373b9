//! delete command - Remove artifacts under a repository path

use clap::Args;
use nexus3_core::{DeleteSummary, TransferExecutor};
use serde::Serialize;

use super::{connect, report_count, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressReporter};

/// Arguments for the `delete` command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Repository path of a file or a directory (ending with `/`)
    pub repository_path: String,
}

#[derive(Serialize)]
struct DeleteOutput {
    path: String,
    /// -1 when the service rejected a deletion
    deleted: i64,
}

/// Execute the delete command
pub async fn execute(args: DeleteArgs, formatter: &Formatter) -> ExitCode {
    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let progress = ProgressReporter::new(formatter);
    let executor = TransferExecutor::new(&client).with_progress(&progress);
    let summary = match executor.delete(&args.repository_path).await {
        Ok(summary) => summary,
        Err(e) => return report_error(formatter, &e),
    };

    if formatter.is_json() {
        formatter.json(&DeleteOutput {
            path: args.repository_path.clone(),
            deleted: summary.as_count(),
        });
    }

    let count = match summary {
        DeleteSummary::Deleted(count) => Some(count),
        DeleteSummary::Aborted => None,
    };
    report_count(formatter, "delete", count, "")
}
