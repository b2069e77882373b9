//! Cleanup policies, managed through the cleanup policy script

use serde::{Deserialize, Serialize};

use super::script::{BuiltinScript, run_builtin};
use crate::error::{Error, Result};
use crate::traits::NexusApi;

/// When components become eligible for cleanup, in days
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_downloaded: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_blob_updated: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl CleanupCriteria {
    pub fn is_empty(&self) -> bool {
        self.last_downloaded.is_none() && self.last_blob_updated.is_none() && self.regex.is_none()
    }
}

/// A cleanup policy as exchanged with the script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupPolicy {
    pub name: String,
    /// Repository format the policy applies to, or `all`
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub criteria: CleanupCriteria,
}

fn default_format() -> String {
    "all".to_string()
}

fn default_mode() -> String {
    "delete".to_string()
}

impl CleanupPolicy {
    pub fn new(name: impl Into<String>, criteria: CleanupCriteria) -> Self {
        Self {
            name: name.into(),
            format: default_format(),
            mode: default_mode(),
            notes: None,
            criteria,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "cleanup policy name must not be empty".to_string(),
            ));
        }
        if self.criteria.is_empty() {
            return Err(Error::InvalidArgument(
                "cleanup policy needs at least one criteria".to_string(),
            ));
        }
        if self.criteria.last_downloaded == Some(0) || self.criteria.last_blob_updated == Some(0) {
            return Err(Error::InvalidArgument(
                "cleanup criteria must be at least one day".to_string(),
            ));
        }
        Ok(())
    }
}

/// Create `policy`, or replace the policy of the same name
///
/// Returns the policy as stored by the service.
pub async fn create_or_update_policy(
    api: &dyn NexusApi,
    policy: &CleanupPolicy,
) -> Result<CleanupPolicy> {
    policy.validate()?;
    let data = serde_json::to_string(policy)?;
    let run = run_builtin(api, &BuiltinScript::CLEANUP_POLICY, &data).await?;

    let stored: CleanupPolicy = serde_json::from_str(run.result())
        .map_err(|e| Error::Api(format!("Unexpected cleanup policy response: {e}")))?;
    if stored.name != policy.name {
        return Err(Error::Api(format!(
            "Cleanup policy {} stored as {}",
            policy.name, stored.name
        )));
    }
    tracing::info!(policy = %stored.name, "Saved cleanup policy");
    Ok(stored)
}

/// Every cleanup policy on the service
pub async fn list_policies(api: &dyn NexusApi) -> Result<Vec<CleanupPolicy>> {
    let run = run_builtin(api, &BuiltinScript::CLEANUP_POLICY, "").await?;
    serde_json::from_str(run.result())
        .map_err(|e| Error::Api(format!("Unexpected cleanup policy list: {e}")))
}
