//! Repository definitions and their create, show and delete operations
//!
//! A repository is described as data: the fields every repository shares
//! ([`RepositoryBase`]), the recipe and type it is built from
//! ([`RecipeKey`]), and the options only some recipes read
//! ([`RecipeOptions`]). [`RepositoryDefinition::configuration`] renders the
//! JSON the create script expects.

use serde_json::{Value, json};

use super::script::{BuiltinScript, run_builtin};
use crate::error::{Error, Result};
use crate::traits::NexusApi;

/// Upper bound of the yum repodata depth
pub const MAX_YUM_DEPTH: u8 = 5;

/// Cache lifetimes of proxy repositories, in minutes
const PROXY_MAX_AGE: u32 = 1440;

/// Repository format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipe {
    Bower,
    Docker,
    Gitlfs,
    Maven,
    Npm,
    Nuget,
    Pypi,
    Raw,
    Rubygems,
    Yum,
}

impl Recipe {
    pub const ALL: [Recipe; 10] = [
        Recipe::Bower,
        Recipe::Docker,
        Recipe::Gitlfs,
        Recipe::Maven,
        Recipe::Npm,
        Recipe::Nuget,
        Recipe::Pypi,
        Recipe::Raw,
        Recipe::Rubygems,
        Recipe::Yum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Recipe::Bower => "bower",
            Recipe::Docker => "docker",
            Recipe::Gitlfs => "gitlfs",
            Recipe::Maven => "maven",
            Recipe::Npm => "npm",
            Recipe::Nuget => "nuget",
            Recipe::Pypi => "pypi",
            Recipe::Raw => "raw",
            Recipe::Rubygems => "rubygems",
            Recipe::Yum => "yum",
        }
    }

    /// Name used by the service in recipe identifiers
    pub fn service_name(&self) -> &'static str {
        match self {
            Recipe::Maven => "maven2",
            other => other.as_str(),
        }
    }

    /// Whether repositories of this format can be created by this client
    pub fn is_supported(&self) -> bool {
        !matches!(self, Recipe::Docker | Recipe::Gitlfs)
    }
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Recipe {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        if lower == "maven2" {
            return Ok(Recipe::Maven);
        }
        Recipe::ALL
            .into_iter()
            .find(|recipe| recipe.as_str() == lower)
            .ok_or_else(|| format!("Invalid repository format: {s}"))
    }
}

/// How a repository obtains its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryType {
    Hosted,
    Proxy,
    Group,
}

impl RepositoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryType::Hosted => "hosted",
            RepositoryType::Proxy => "proxy",
            RepositoryType::Group => "group",
        }
    }
}

impl std::fmt::Display for RepositoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hosted" => Ok(RepositoryType::Hosted),
            "proxy" => Ok(RepositoryType::Proxy),
            "group" => Ok(RepositoryType::Group),
            _ => Err(format!("Invalid repository type: {s}")),
        }
    }
}

/// Recipe and type pair; the service calls it the recipe name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecipeKey {
    pub recipe: Recipe,
    pub repository_type: RepositoryType,
}

impl RecipeKey {
    pub fn new(recipe: Recipe, repository_type: RepositoryType) -> Self {
        Self {
            recipe,
            repository_type,
        }
    }
}

impl std::fmt::Display for RecipeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.recipe.service_name(), self.repository_type)
    }
}

macro_rules! policy_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Value sent to the service
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_uppercase().replace('-', "_").as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {s}", $label)),
                }
            }
        }
    };
}

policy_enum!(
    /// Whether hosted artifacts may be written and overwritten
    WritePolicy, "write policy", {
        Allow => "ALLOW",
        AllowOnce => "ALLOW_ONCE",
        Deny => "DENY",
    }
);

policy_enum!(
    /// Which maven versions a repository accepts
    VersionPolicy, "version policy", {
        Release => "RELEASE",
        Snapshot => "SNAPSHOT",
        Mixed => "MIXED",
    }
);

policy_enum!(
    /// How strictly maven paths are checked against the layout
    LayoutPolicy, "layout policy", {
        Permissive => "PERMISSIVE",
        Strict => "STRICT",
    }
);

/// Fields shared by every repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryBase {
    pub name: String,
    pub blob_store_name: String,
    pub strict_content_type_validation: bool,
    pub cleanup_policy: Option<String>,
}

impl RepositoryBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blob_store_name: "default".to_string(),
            strict_content_type_validation: false,
            cleanup_policy: None,
        }
    }
}

/// Options read only by some recipe and type combinations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeOptions {
    /// hosted
    pub write_policy: WritePolicy,
    /// maven
    pub version_policy: VersionPolicy,
    /// maven
    pub layout_policy: LayoutPolicy,
    /// yum hosted
    pub depth: u8,
    /// proxy
    pub remote_url: Option<String>,
}

impl Default for RecipeOptions {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::AllowOnce,
            version_policy: VersionPolicy::Release,
            layout_policy: LayoutPolicy::Strict,
            depth: 0,
            remote_url: None,
        }
    }
}

/// Everything needed to create a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDefinition {
    pub base: RepositoryBase,
    pub key: RecipeKey,
    pub options: RecipeOptions,
}

impl RepositoryDefinition {
    pub fn new(base: RepositoryBase, key: RecipeKey) -> Self {
        Self {
            base,
            key,
            options: RecipeOptions::default(),
        }
    }

    /// Check that the service can be asked to build this repository
    pub fn validate(&self) -> Result<()> {
        if self.base.name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "repository name must not be empty".to_string(),
            ));
        }
        if self.base.blob_store_name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "blob store name must not be empty".to_string(),
            ));
        }
        if !self.key.recipe.is_supported() {
            return Err(Error::NotImplemented(format!(
                "{} repositories are not supported",
                self.key.recipe
            )));
        }

        match self.key.repository_type {
            RepositoryType::Group => Err(Error::NotImplemented(
                "group repositories are not supported".to_string(),
            )),
            RepositoryType::Proxy => self.remote_url().map(|_| ()),
            RepositoryType::Hosted => {
                if self.key.recipe == Recipe::Yum && self.options.depth > MAX_YUM_DEPTH {
                    return Err(Error::InvalidArgument(format!(
                        "depth={}; must be between 0-{MAX_YUM_DEPTH}",
                        self.options.depth
                    )));
                }
                Ok(())
            }
        }
    }

    fn remote_url(&self) -> Result<&str> {
        let remote_url = self.options.remote_url.as_deref().ok_or_else(|| {
            Error::InvalidArgument("proxy repositories need a remote URL".to_string())
        })?;
        let parsed = url::Url::parse(remote_url)
            .map_err(|e| Error::InvalidArgument(format!("remote URL {remote_url}: {e}")))?;
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(Error::InvalidArgument(format!(
                "remote URL {remote_url} has no host"
            )));
        }
        Ok(remote_url)
    }

    /// Configuration passed to the create script
    pub fn configuration(&self) -> Result<Value> {
        self.validate()?;

        let mut storage = json!({
            "blobStoreName": self.base.blob_store_name,
            "strictContentTypeValidation": self.base.strict_content_type_validation,
        });
        let mut attributes = json!({});

        match self.key.repository_type {
            RepositoryType::Hosted => {
                storage["writePolicy"] = json!(self.options.write_policy.as_str());
                if self.key.recipe == Recipe::Yum {
                    attributes["yum"] = json!({"repodataDepth": self.options.depth});
                }
            }
            RepositoryType::Proxy => {
                attributes["httpclient"] = json!({"blocked": false, "autoBlock": true});
                attributes["proxy"] = json!({
                    "remoteUrl": self.remote_url()?,
                    "contentMaxAge": PROXY_MAX_AGE,
                    "metadataMaxAge": PROXY_MAX_AGE,
                });
                attributes["negativeCache"] = json!({"enabled": true, "timeToLive": PROXY_MAX_AGE});
            }
            RepositoryType::Group => {}
        }

        if self.key.recipe == Recipe::Maven {
            attributes["maven"] = json!({
                "versionPolicy": self.options.version_policy.as_str(),
                "layoutPolicy": self.options.layout_policy.as_str(),
            });
        }
        if let Some(policy) = &self.base.cleanup_policy {
            attributes["cleanup"] = json!({"policyName": policy});
        }
        attributes["storage"] = storage;

        Ok(json!({
            "name": self.base.name,
            "online": true,
            "recipeName": self.key.to_string(),
            "_state": "present",
            "attributes": attributes,
        }))
    }
}

/// Create the repository described by `definition`
pub async fn create_repository(
    api: &dyn NexusApi,
    definition: &RepositoryDefinition,
) -> Result<()> {
    let configuration = definition.configuration()?;
    let run = run_builtin(
        api,
        &BuiltinScript::REPOSITORY_CREATE,
        &configuration.to_string(),
    )
    .await?;

    if !run.is_null() {
        return Err(Error::Api(format!(
            "Failed to create repository {}: {}",
            definition.base.name,
            run.result()
        )));
    }
    tracing::info!(repository = %definition.base.name, recipe = %definition.key, "Created repository");
    Ok(())
}

/// Configuration of the repository `name` as stored by the service
pub async fn show_repository(api: &dyn NexusApi, name: &str) -> Result<Value> {
    let run = run_builtin(api, &BuiltinScript::REPOSITORY_GET, name).await?;
    if run.is_null() {
        return Err(Error::InvalidRepository(name.to_string()));
    }
    serde_json::from_str(run.result())
        .map_err(|e| Error::Api(format!("Unreadable configuration of {name}: {e}")))
}

/// Delete the repository `name`
///
/// Fails with [`Error::InvalidRepository`] when the service does not list it.
pub async fn delete_repository(api: &dyn NexusApi, name: &str) -> Result<()> {
    let repositories = api.list_repositories().await?;
    if !repositories.iter().any(|repository| repository.name == name) {
        return Err(Error::InvalidRepository(name.to_string()));
    }

    run_builtin(api, &BuiltinScript::REPOSITORY_DELETE, name).await?;
    tracing::info!(repository = name, "Deleted repository");
    Ok(())
}
