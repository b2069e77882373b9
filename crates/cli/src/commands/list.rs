//! list command - Print the artifact paths under a repository path

use clap::Args;
use futures::TryStreamExt;
use nexus3_core::TransferExecutor;

use super::{connect, report_error};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Arguments for the `list` command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Repository path, e.g. `myrepo/dir/` or `myrepo/dir/file`
    pub repository_path: String,
}

/// Execute the list command
///
/// Paths are printed as pages arrive; in JSON mode they are collected into
/// a single array.
pub async fn execute(args: ListArgs, formatter: &Formatter) -> ExitCode {
    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };
    let executor = TransferExecutor::new(&client);

    let mut artifacts = match executor.list(&args.repository_path).await {
        Ok(artifacts) => artifacts,
        Err(e) => return report_error(formatter, &e),
    };

    let mut paths = Vec::new();
    loop {
        match artifacts.try_next().await {
            Ok(Some(artifact)) => {
                if formatter.is_json() {
                    paths.push(artifact.path);
                } else {
                    formatter.println(&formatter.style_path(&artifact.path));
                }
            }
            Ok(None) => break,
            Err(e) => return report_error(formatter, &e),
        }
    }

    if formatter.is_json() {
        formatter.json(&paths);
    }
    ExitCode::Success
}
