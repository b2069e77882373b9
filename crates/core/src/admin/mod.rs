//! Service management through stored scripts
//!
//! Nexus 3 has no REST endpoints for creating repositories or cleanup
//! policies, so these operations upload a Groovy script once and then run
//! it with a JSON argument. Everything here goes through [`crate::NexusApi`].

pub mod cleanup_policy;
pub mod repository;
pub mod script;

pub use cleanup_policy::{CleanupCriteria, CleanupPolicy, create_or_update_policy, list_policies};
pub use repository::{
    LayoutPolicy, Recipe, RecipeKey, RecipeOptions, RepositoryBase, RepositoryDefinition,
    RepositoryType, VersionPolicy, WritePolicy, create_repository, delete_repository,
    show_repository,
};
pub use script::{BuiltinScript, ScriptInfo, ScriptRun, ensure_script, run_builtin};
