//! cleanup_policy commands - Manage cleanup policies

use clap::{Args, Subcommand};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL_CONDENSED};
use nexus3_core::admin::{CleanupCriteria, CleanupPolicy, create_or_update_policy, list_policies};

use super::{connect, report_error};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Cleanup policy subcommands
#[derive(Subcommand, Debug)]
pub enum CleanupPolicyCommands {
    /// Create a cleanup policy, or replace the one with the same name
    Create(CreateArgs),

    /// List cleanup policies
    #[command(visible_alias = "ls")]
    List,
}

/// Arguments for `cleanup_policy create`
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Policy name
    pub name: String,

    /// Repository format the policy applies to
    #[arg(long, default_value = "all")]
    pub format: String,

    /// Free-form description
    #[arg(long)]
    pub notes: Option<String>,

    /// Clean up components not downloaded for this many days
    #[arg(long)]
    pub downloaded: Option<u64>,

    /// Clean up components not updated for this many days
    #[arg(long)]
    pub updated: Option<u64>,

    /// Clean up only assets whose path matches this expression
    #[arg(long)]
    pub regex: Option<String>,
}

impl CreateArgs {
    fn policy(self) -> CleanupPolicy {
        let mut policy = CleanupPolicy::new(
            self.name,
            CleanupCriteria {
                last_downloaded: self.downloaded,
                last_blob_updated: self.updated,
                regex: self.regex,
            },
        );
        policy.format = self.format;
        policy.notes = self.notes;
        policy
    }
}

/// Execute a cleanup policy subcommand
pub async fn execute(cmd: CleanupPolicyCommands, formatter: &Formatter) -> ExitCode {
    match cmd {
        CleanupPolicyCommands::Create(args) => execute_create(args.policy(), formatter).await,
        CleanupPolicyCommands::List => execute_list(formatter).await,
    }
}

async fn execute_create(policy: CleanupPolicy, formatter: &Formatter) -> ExitCode {
    if let Err(e) = policy.validate() {
        return report_error(formatter, &e);
    }

    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    match create_or_update_policy(&client, &policy).await {
        Ok(stored) => {
            if formatter.is_json() {
                formatter.json(&stored);
            } else {
                formatter.success(&format!(
                    "Saved cleanup policy {}",
                    formatter.style_path(&stored.name)
                ));
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, &e),
    }
}

async fn execute_list(formatter: &Formatter) -> ExitCode {
    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let policies = match list_policies(&client).await {
        Ok(policies) => policies,
        Err(e) => return report_error(formatter, &e),
    };

    if policies.is_empty() {
        formatter.warning("No cleanup policies found");
        return ExitCode::PolicyNotFound;
    }

    if formatter.is_json() {
        formatter.json(&policies);
    } else {
        formatter.println(&render_table(&policies, formatter).to_string());
    }
    ExitCode::Success
}

fn days(value: Option<u64>) -> String {
    value.map(|days| days.to_string()).unwrap_or_default()
}

fn render_table(policies: &[CleanupPolicy], formatter: &Formatter) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    if !formatter.colors_enabled() {
        table.force_no_tty();
    }

    table.set_header(
        ["Name", "Format", "Downloaded", "Updated", "Regex"]
            .into_iter()
            .map(|header| Cell::new(header).fg(Color::Cyan)),
    );
    for policy in policies {
        table.add_row(vec![
            Cell::new(&policy.name).add_attribute(Attribute::Bold),
            Cell::new(&policy.format),
            Cell::new(days(policy.criteria.last_downloaded)),
            Cell::new(days(policy.criteria.last_blob_updated)),
            Cell::new(policy.criteria.regex.as_deref().unwrap_or_default()),
        ]);
    }
    table
}
