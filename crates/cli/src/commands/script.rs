//! script commands - Manage scripts stored on the service

use std::path::PathBuf;

use clap::{Args, Subcommand};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL_CONDENSED};
use nexus3_core::NexusApi as _;
use nexus3_core::admin::ScriptInfo;
use serde::Serialize;

use super::{connect, report_error};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Characters of script content shown in the list table
const CONTENT_PREVIEW: usize = 40;

/// Script subcommands
#[derive(Subcommand, Debug)]
pub enum ScriptCommands {
    /// Store a script read from a local file
    Create(CreateArgs),

    /// List stored scripts
    #[command(visible_alias = "ls")]
    List,

    /// Run a stored script and print its result
    Run(RunArgs),

    /// Delete a stored script
    #[command(visible_alias = "del")]
    Delete(DeleteArgs),
}

/// Arguments for `script create`
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Script name
    pub name: String,

    /// Local file holding the script content
    pub path: PathBuf,

    /// Script language
    #[arg(long = "script-type", default_value = "groovy")]
    pub script_type: String,
}

/// Arguments for `script run`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Script name
    pub name: String,

    /// Text passed to the script as its argument
    #[arg(default_value = "")]
    pub args: String,
}

/// Arguments for `script delete`
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Script name
    pub name: String,
}

#[derive(Serialize)]
struct ScriptOutput<'a> {
    name: &'a str,
    status: &'static str,
}

/// Execute a script subcommand
pub async fn execute(cmd: ScriptCommands, formatter: &Formatter) -> ExitCode {
    match cmd {
        ScriptCommands::Create(args) => execute_create(args, formatter).await,
        ScriptCommands::List => execute_list(formatter).await,
        ScriptCommands::Run(args) => execute_run(args, formatter).await,
        ScriptCommands::Delete(args) => execute_delete(args, formatter).await,
    }
}

async fn execute_create(args: CreateArgs, formatter: &Formatter) -> ExitCode {
    let content = match tokio::fs::read_to_string(&args.path).await {
        Ok(content) => content,
        Err(e) => {
            formatter.error(&format!("Failed to read {}: {e}", args.path.display()));
            return ExitCode::UsageError;
        }
    };

    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let script = ScriptInfo {
        name: args.name,
        script_type: args.script_type,
        content,
    };
    if let Err(e) = client.create_script(&script).await {
        return report_error(formatter, &e);
    }

    if formatter.is_json() {
        formatter.json(&ScriptOutput {
            name: &script.name,
            status: "created",
        });
    } else {
        formatter.success(&format!("Created script {}", formatter.style_path(&script.name)));
    }
    ExitCode::Success
}

async fn execute_list(formatter: &Formatter) -> ExitCode {
    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let scripts = match client.list_scripts().await {
        Ok(scripts) => scripts,
        Err(e) => return report_error(formatter, &e),
    };

    if formatter.is_json() {
        formatter.json(&scripts);
    } else if scripts.is_empty() {
        formatter.println("No scripts found.");
    } else {
        formatter.println(&render_table(&scripts, formatter).to_string());
    }
    ExitCode::Success
}

async fn execute_run(args: RunArgs, formatter: &Formatter) -> ExitCode {
    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    match client.run_script(&args.name, &args.args).await {
        Ok(run) => {
            if formatter.is_json() {
                formatter.json(&run);
            } else {
                formatter.println(run.result());
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, &e),
    }
}

async fn execute_delete(args: DeleteArgs, formatter: &Formatter) -> ExitCode {
    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    if let Err(e) = client.delete_script(&args.name).await {
        return report_error(formatter, &e);
    }

    if formatter.is_json() {
        formatter.json(&ScriptOutput {
            name: &args.name,
            status: "deleted",
        });
    } else {
        formatter.success(&format!("Deleted script {}", formatter.style_path(&args.name)));
    }
    ExitCode::Success
}

/// First line of `content`, cut to [`CONTENT_PREVIEW`] characters
fn preview(content: &str) -> String {
    let line = content.lines().next().unwrap_or_default();
    if content.chars().count() <= CONTENT_PREVIEW && !content.contains('\n') {
        return line.to_string();
    }
    let cut: String = line.chars().take(CONTENT_PREVIEW).collect();
    format!("{cut}...")
}

fn render_table(scripts: &[ScriptInfo], formatter: &Formatter) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    if !formatter.colors_enabled() {
        table.force_no_tty();
    }

    table.set_header(
        ["Name", "Type", "Content"]
            .into_iter()
            .map(|header| Cell::new(header).fg(Color::Cyan)),
    );
    for script in scripts {
        table.add_row(vec![
            Cell::new(&script.name).add_attribute(Attribute::Bold),
            Cell::new(&script.script_type),
            Cell::new(preview(&script.content)),
        ]);
    }
    table
}
