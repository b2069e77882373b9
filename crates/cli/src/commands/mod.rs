//! Command tree and shared command helpers

mod cleanup_policy;
mod completions;
mod delete;
mod download;
mod list;
mod login;
mod repository;
mod script;
mod upload;

use clap::Subcommand;
use nexus3_core::{Config, ConfigManager, Error};
use nexus3_rest::NexusClient;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, plural_files};

pub use cleanup_policy::CleanupPolicyCommands;
pub use completions::CompletionsArgs;
pub use delete::DeleteArgs;
pub use download::DownloadArgs;
pub use list::ListArgs;
pub use login::LoginArgs;
pub use repository::RepositoryCommands;
#[cfg(test)]
pub use repository::CreateCommands;
pub use script::ScriptCommands;
pub use upload::UploadArgs;

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check connection settings and save them
    Login(LoginArgs),

    /// List all files within a path in the repository
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Upload a local file or directory to a repository
    #[command(visible_alias = "up")]
    Upload(UploadArgs),

    /// Download files from a repository to the local filesystem
    #[command(visible_alias = "dl")]
    Download(DownloadArgs),

    /// Recursively delete all files under a repository path
    #[command(visible_alias = "del")]
    Delete(DeleteArgs),

    /// List, create, show and delete repositories
    #[command(subcommand)]
    Repository(RepositoryCommands),

    /// Manage scripts stored on the service
    #[command(subcommand)]
    Script(ScriptCommands),

    /// Manage cleanup policies
    #[command(subcommand, name = "cleanup_policy", visible_alias = "cleanup-policy")]
    CleanupPolicy(CleanupPolicyCommands),

    /// Generate a shell completion script
    Completions(CompletionsArgs),
}

/// Execute a command
pub async fn execute(command: Commands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match command {
        Commands::Login(args) => login::execute(args, &formatter).await,
        Commands::List(args) => list::execute(args, &formatter).await,
        Commands::Upload(args) => upload::execute(args, &formatter).await,
        Commands::Download(args) => download::execute(args, &formatter).await,
        Commands::Delete(args) => delete::execute(args, &formatter).await,
        Commands::Repository(cmd) => repository::execute(cmd, &formatter).await,
        Commands::Script(cmd) => script::execute(cmd, &formatter).await,
        Commands::CleanupPolicy(cmd) => cleanup_policy::execute(cmd, &formatter).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Load the saved configuration, using defaults when there is none yet
fn load_config(formatter: &Formatter) -> Result<Config, ExitCode> {
    let manager = ConfigManager::new().map_err(|e| report_error(formatter, &e))?;

    match manager.load() {
        Ok(config) => Ok(config),
        Err(e) if e.is_config_missing() => {
            formatter.warning(&format!(
                "Configuration not found at {}; proceeding with defaults. Run `nexus3 login` to create it.",
                manager.path().display()
            ));
            Ok(Config::default())
        }
        Err(e) => Err(report_error(formatter, &e)),
    }
}

/// Build a REST client from the saved configuration
fn connect(formatter: &Formatter) -> Result<NexusClient, ExitCode> {
    let config = load_config(formatter)?;
    tracing::debug!(url = %config.url, api_version = %config.api_version, "Connecting");
    NexusClient::new(&config).map_err(|e| report_error(formatter, &e))
}

/// Print an error and return the matching exit code
fn report_error(formatter: &Formatter, error: &Error) -> ExitCode {
    formatter.error(&error.to_string());
    ExitCode::from_error(error)
}

/// Outcome of a batch transfer as seen by the user
///
/// `None` stands for an aborted batch.
fn report_count(formatter: &Formatter, action: &str, count: Option<usize>, done: &str) -> ExitCode {
    let participle = past_participle(action);
    match count {
        Some(0) => {
            formatter.warning(&format!("no files were {participle}"));
            ExitCode::NoFiles
        }
        Some(count) => {
            formatter.success(&format!("{} {}{done}", capitalize(&participle), plural_files(count)));
            ExitCode::Success
        }
        None => {
            formatter.error(&format!("error during {action} operation"));
            ExitCode::ApiError
        }
    }
}

fn past_participle(action: &str) -> String {
    if action.ends_with('e') {
        format!("{action}d")
    } else {
        format!("{action}ed")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
