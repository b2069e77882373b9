//! Stored scripts and the ones this client installs on demand

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traits::NexusApi;

/// A script as stored on the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptInfo {
    pub name: String,
    #[serde(rename = "type", default = "default_script_type")]
    pub script_type: String,
    #[serde(default)]
    pub content: String,
}

fn default_script_type() -> String {
    "groovy".to_string()
}

impl ScriptInfo {
    pub fn groovy(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script_type: default_script_type(),
            content: content.into(),
        }
    }
}

/// Response of a script run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRun {
    pub name: String,
    /// Whatever the script returned, rendered as text
    #[serde(default)]
    pub result: Option<String>,
}

impl ScriptRun {
    /// The script returned nothing
    ///
    /// The service renders a Groovy `null` as the string `"null"`.
    pub fn is_null(&self) -> bool {
        matches!(self.result.as_deref(), None | Some("null"))
    }

    pub fn result(&self) -> &str {
        self.result.as_deref().unwrap_or("null")
    }
}

/// A script shipped with this client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinScript {
    pub name: &'static str,
    pub content: &'static str,
}

impl BuiltinScript {
    pub const REPOSITORY_CREATE: BuiltinScript = BuiltinScript {
        name: "nexus3-cli-repository-create",
        content: include_str!("../../scripts/nexus3-cli-repository-create.groovy"),
    };

    pub const REPOSITORY_GET: BuiltinScript = BuiltinScript {
        name: "nexus3-cli-repository-get",
        content: include_str!("../../scripts/nexus3-cli-repository-get.groovy"),
    };

    pub const REPOSITORY_DELETE: BuiltinScript = BuiltinScript {
        name: "nexus3-cli-repository-delete",
        content: include_str!("../../scripts/nexus3-cli-repository-delete.groovy"),
    };

    pub const CLEANUP_POLICY: BuiltinScript = BuiltinScript {
        name: "nexus3-cli-cleanup-policy",
        content: include_str!("../../scripts/nexus3-cli-cleanup-policy.groovy"),
    };

    fn info(&self) -> ScriptInfo {
        ScriptInfo::groovy(self.name, self.content)
    }
}

/// Store `script` unless a script of the same name already exists
///
/// An existing script is left untouched, even if its content differs.
pub async fn ensure_script(api: &dyn NexusApi, script: &BuiltinScript) -> Result<()> {
    if api.script_exists(script.name).await? {
        return Ok(());
    }
    tracing::info!(script = script.name, "Installing script");
    api.create_script(&script.info()).await
}

/// Install `script` if needed and run it with `data`
pub async fn run_builtin(
    api: &dyn NexusApi,
    script: &BuiltinScript,
    data: &str,
) -> Result<ScriptRun> {
    ensure_script(api, script).await?;
    let run = api.run_script(script.name, data).await?;
    if run.name != script.name {
        return Err(Error::Api(format!(
            "Unexpected response from script {}: {}",
            script.name, run.name
        )));
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockNexusApi;
    use mockall::predicate::eq;

    #[test]
    fn test_script_run_null_result() {
        let run: ScriptRun =
            serde_json::from_str(r#"{"name": "s", "result": "null"}"#).unwrap();
        assert!(run.is_null());

        let run: ScriptRun = serde_json::from_str(r#"{"name": "s"}"#).unwrap();
        assert!(run.is_null());
        assert_eq!(run.result(), "null");

        let run: ScriptRun =
            serde_json::from_str(r#"{"name": "s", "result": "[]"}"#).unwrap();
        assert!(!run.is_null());
    }

    #[test]
    fn test_script_info_wire_format() {
        let info = ScriptInfo::groovy("hello", "return 1");
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "hello", "type": "groovy", "content": "return 1"})
        );
    }

    #[test]
    fn test_builtin_scripts_are_embedded() {
        for script in [
            BuiltinScript::REPOSITORY_CREATE,
            BuiltinScript::REPOSITORY_GET,
            BuiltinScript::REPOSITORY_DELETE,
            BuiltinScript::CLEANUP_POLICY,
        ] {
            assert!(script.name.starts_with("nexus3-cli-"));
            assert!(!script.content.trim().is_empty(), "{} is empty", script.name);
        }
    }

    #[tokio::test]
    async fn test_ensure_script_skips_existing() {
        let mut api = MockNexusApi::new();
        api.expect_script_exists()
            .with(eq("nexus3-cli-repository-delete"))
            .returning(|_| Ok(true));
        api.expect_create_script().never();

        ensure_script(&api, &BuiltinScript::REPOSITORY_DELETE)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_builtin_installs_missing_script() {
        let mut api = MockNexusApi::new();
        api.expect_script_exists().returning(|_| Ok(false));
        api.expect_create_script()
            .withf(|script| {
                script.name == "nexus3-cli-repository-get"
                    && script.script_type == "groovy"
                    && script.content.contains("repositoryManager")
            })
            .times(1)
            .returning(|_| Ok(()));
        api.expect_run_script()
            .with(eq("nexus3-cli-repository-get"), eq("files"))
            .returning(|name, _| {
                Ok(ScriptRun {
                    name: name.to_string(),
                    result: Some("null".to_string()),
                })
            });

        let run = run_builtin(&api, &BuiltinScript::REPOSITORY_GET, "files")
            .await
            .unwrap();
        assert!(run.is_null());
    }

    #[tokio::test]
    async fn test_run_builtin_rejects_other_script_name() {
        let mut api = MockNexusApi::new();
        api.expect_script_exists().returning(|_| Ok(true));
        api.expect_run_script().returning(|_, _| {
            Ok(ScriptRun {
                name: "something-else".to_string(),
                result: None,
            })
        });

        let err = run_builtin(&api, &BuiltinScript::REPOSITORY_DELETE, "files")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(_)));
    }
}
