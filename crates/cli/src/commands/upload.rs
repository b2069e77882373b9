//! upload command - Send a local file or directory to a repository

use std::path::PathBuf;

use clap::Args;
use nexus3_core::{TransferExecutor, UploadOptions};
use serde::Serialize;

use super::{connect, report_count, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressReporter};

/// Arguments for the `upload` command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file or directory
    pub source: PathBuf,

    /// Destination repository path; raw repositories need a directory,
    /// e.g. `myrepo/dir/`
    pub destination: String,

    /// Do not reproduce the local directory structure remotely
    #[arg(long)]
    pub flatten: bool,

    /// Only upload the files at the top of a source directory
    #[arg(long)]
    pub norecurse: bool,
}

impl UploadArgs {
    fn options(&self) -> UploadOptions {
        UploadOptions {
            recurse: !self.norecurse,
            flatten: self.flatten,
        }
    }
}

#[derive(Serialize)]
struct UploadOutput {
    source: String,
    destination: String,
    uploaded: usize,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, formatter: &Formatter) -> ExitCode {
    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    formatter.info(&format!(
        "Uploading {} to {}",
        args.source.display(),
        args.destination
    ));

    let progress = ProgressReporter::new(formatter);
    let executor = TransferExecutor::new(&client).with_progress(&progress);
    let uploaded = match executor
        .upload(&args.source, &args.destination, args.options())
        .await
    {
        Ok(count) => count,
        Err(e) => return report_error(formatter, &e),
    };

    if formatter.is_json() {
        formatter.json(&UploadOutput {
            source: args.source.display().to_string(),
            destination: args.destination.clone(),
            uploaded,
        });
    }
    report_count(formatter, "upload", Some(uploaded), &format!(" to {}", args.destination))
}
