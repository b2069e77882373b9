//! repository commands - Inspect, create and delete the repositories of the service

use clap::{Args, Subcommand};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL_CONDENSED};
use nexus3_core::admin::{
    LayoutPolicy, Recipe, RecipeKey, RecipeOptions, RepositoryBase, RepositoryDefinition,
    RepositoryType, VersionPolicy, WritePolicy, create_repository, delete_repository,
    show_repository,
};
use nexus3_core::{NexusApi as _, RepositoryInfo};
use serde::Serialize;

use super::{connect, report_error};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Repository subcommands
#[derive(Subcommand, Debug)]
pub enum RepositoryCommands {
    /// List all repositories
    List,

    /// Create a repository
    #[command(subcommand)]
    Create(CreateCommands),

    /// Show the configuration of a repository
    Show(ShowArgs),

    /// Delete a repository and everything stored in it
    #[command(visible_alias = "del")]
    Delete(DeleteArgs),
}

/// Repository types that can be created
#[derive(Subcommand, Debug)]
pub enum CreateCommands {
    /// Create a repository that stores its own artifacts
    Hosted(HostedArgs),

    /// Create a repository that caches a remote one
    Proxy(ProxyArgs),
}

/// Options shared by every created repository
#[derive(Args, Debug)]
pub struct CommonCreateArgs {
    /// Repository format (bower, maven, npm, nuget, pypi, raw, rubygems, yum)
    pub format: Recipe,

    /// Repository name
    pub name: String,

    /// Blob store holding the repository content
    #[arg(long = "blob", default_value = "default")]
    pub blob_store_name: String,

    /// Validate that uploaded content matches its MIME type
    #[arg(long = "strict-content")]
    pub strict_content: bool,

    /// Cleanup policy applied to the repository
    #[arg(long)]
    pub cleanup: Option<String>,

    /// Maven version policy (release, snapshot, mixed)
    #[arg(long = "version-policy", default_value = "release")]
    pub version_policy: VersionPolicy,

    /// Maven layout policy (strict, permissive)
    #[arg(long = "layout-policy", default_value = "strict")]
    pub layout_policy: LayoutPolicy,
}

/// Arguments for `repository create hosted`
#[derive(Args, Debug)]
pub struct HostedArgs {
    #[command(flatten)]
    pub common: CommonCreateArgs,

    /// Write policy (allow, allow_once, deny)
    #[arg(long = "write-policy", default_value = "allow_once")]
    pub write_policy: WritePolicy,

    /// Yum repodata depth, 0 to 5
    #[arg(long, default_value_t = 0)]
    pub depth: u8,
}

/// Arguments for `repository create proxy`
#[derive(Args, Debug)]
pub struct ProxyArgs {
    #[command(flatten)]
    pub common: CommonCreateArgs,

    /// URL of the proxied repository
    pub remote_url: String,
}

/// Arguments for `repository show`
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Repository name
    pub name: String,
}

/// Arguments for `repository delete`
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Repository name
    pub name: String,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Serialize)]
struct RepositoryOutput<'a> {
    name: &'a str,
    recipe: String,
    status: &'static str,
}

impl CreateCommands {
    fn definition(self) -> RepositoryDefinition {
        let (common, repository_type, options) = match self {
            CreateCommands::Hosted(args) => (
                args.common,
                RepositoryType::Hosted,
                RecipeOptions {
                    write_policy: args.write_policy,
                    depth: args.depth,
                    ..Default::default()
                },
            ),
            CreateCommands::Proxy(args) => (
                args.common,
                RepositoryType::Proxy,
                RecipeOptions {
                    remote_url: Some(args.remote_url),
                    ..Default::default()
                },
            ),
        };

        RepositoryDefinition {
            base: RepositoryBase {
                name: common.name,
                blob_store_name: common.blob_store_name,
                strict_content_type_validation: common.strict_content,
                cleanup_policy: common.cleanup,
            },
            key: RecipeKey::new(common.format, repository_type),
            options: RecipeOptions {
                version_policy: common.version_policy,
                layout_policy: common.layout_policy,
                ..options
            },
        }
    }
}

/// Execute a repository subcommand
pub async fn execute(cmd: RepositoryCommands, formatter: &Formatter) -> ExitCode {
    match cmd {
        RepositoryCommands::List => execute_list(formatter).await,
        RepositoryCommands::Create(cmd) => execute_create(cmd.definition(), formatter).await,
        RepositoryCommands::Show(args) => execute_show(args, formatter).await,
        RepositoryCommands::Delete(args) => execute_delete(args, formatter).await,
    }
}

async fn execute_list(formatter: &Formatter) -> ExitCode {
    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let repositories = match client.list_repositories().await {
        Ok(repositories) => repositories,
        Err(e) => return report_error(formatter, &e),
    };

    if formatter.is_json() {
        formatter.json(&repositories);
    } else if repositories.is_empty() {
        formatter.println("No repositories found.");
    } else {
        formatter.println(&render_table(&repositories, formatter).to_string());
    }
    ExitCode::Success
}

async fn execute_create(definition: RepositoryDefinition, formatter: &Formatter) -> ExitCode {
    if let Err(e) = definition.validate() {
        return report_error(formatter, &e);
    }

    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    if let Err(e) = create_repository(&client, &definition).await {
        return report_error(formatter, &e);
    }

    if formatter.is_json() {
        formatter.json(&RepositoryOutput {
            name: &definition.base.name,
            recipe: definition.key.to_string(),
            status: "created",
        });
    } else {
        formatter.success(&format!(
            "Created {} repository {}",
            definition.key,
            formatter.style_path(&definition.base.name)
        ));
    }
    ExitCode::Success
}

async fn execute_show(args: ShowArgs, formatter: &Formatter) -> ExitCode {
    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    match show_repository(&client, &args.name).await {
        Ok(configuration) => {
            formatter.json(&configuration);
            ExitCode::Success
        }
        Err(e) => report_error(formatter, &e),
    }
}

async fn execute_delete(args: DeleteArgs, formatter: &Formatter) -> ExitCode {
    if !args.force && !confirm_deletion(&args.name) {
        formatter.error(&format!(
            "Not deleting repository {} without confirmation; pass --force to skip it",
            args.name
        ));
        return ExitCode::UsageError;
    }

    let client = match connect(formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    if let Err(e) = delete_repository(&client, &args.name).await {
        return report_error(formatter, &e);
    }

    if formatter.is_json() {
        formatter.json(&serde_json::json!({"name": args.name, "status": "deleted"}));
    } else {
        formatter.success(&format!(
            "Deleted repository {}",
            formatter.style_path(&args.name)
        ));
    }
    ExitCode::Success
}

/// Ask on the terminal before deleting; never confirms without one
fn confirm_deletion(name: &str) -> bool {
    if !console::user_attended_stderr() {
        return false;
    }

    let term = console::Term::stderr();
    let prompt = format!(
        "Deleting repository {name} removes all of its content. Type its name to confirm: "
    );
    if term.write_str(&prompt).is_err() {
        return false;
    }
    term.read_line()
        .is_ok_and(|answer| answer.trim() == name)
}

fn render_table(repositories: &[RepositoryInfo], formatter: &Formatter) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    if !formatter.colors_enabled() {
        table.force_no_tty();
    }

    table.set_header(
        ["Name", "Format", "Type", "URL"]
            .into_iter()
            .map(|header| Cell::new(header).fg(Color::Cyan)),
    );
    for repository in repositories {
        table.add_row(vec![
            Cell::new(&repository.name).add_attribute(Attribute::Bold),
            Cell::new(&repository.format),
            Cell::new(&repository.repository_type),
            Cell::new(&repository.url),
        ]);
    }
    table
}
