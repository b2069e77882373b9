//! login command - Verify connection settings and save them

use clap::Args;
use nexus3_core::{ApiVersion, Config, ConfigManager, NexusApi as _};
use nexus3_rest::NexusClient;
use serde::Serialize;

use super::report_error;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Arguments for the `login` command
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Nexus OSS URL
    #[arg(long, env = "NEXUS3_URL", default_value = "http://localhost:8081")]
    pub url: String,

    /// Nexus admin username
    #[arg(long, env = "NEXUS3_USERNAME", default_value = "admin")]
    pub username: String,

    /// Nexus admin password
    #[arg(long, env = "NEXUS3_PASSWORD", default_value = "admin123", hide_env_values = true)]
    pub password: String,

    /// Do not verify the server certificate
    #[arg(long)]
    pub no_verify: bool,

    /// REST API version: v1, or beta for servers older than 3.18
    #[arg(long, default_value = "v1")]
    pub api_version: ApiVersion,
}

impl LoginArgs {
    fn to_config(&self) -> Config {
        Config {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            x509_verify: !self.no_verify,
            api_version: self.api_version,
        }
    }
}

#[derive(Serialize)]
struct LoginOutput {
    url: String,
    username: String,
    config_file: String,
}

/// Execute the login command
pub async fn execute(args: LoginArgs, formatter: &Formatter) -> ExitCode {
    let config = args.to_config();

    let client = match NexusClient::new(&config) {
        Ok(client) => client,
        Err(e) => return report_error(formatter, &e),
    };

    // make sure the settings work before saving them
    if let Err(e) = client.list_repositories().await {
        return report_error(formatter, &e);
    }

    let manager = match ConfigManager::new() {
        Ok(manager) => manager,
        Err(e) => return report_error(formatter, &e),
    };
    if let Err(e) = manager.save(&config) {
        return report_error(formatter, &e);
    }

    let config_file = manager.path().display().to_string();
    if formatter.is_json() {
        formatter.json(&LoginOutput {
            url: config.url,
            username: config.username,
            config_file,
        });
    } else {
        formatter.success(&format!("Configuration saved to {config_file}"));
    }
    ExitCode::Success
}
