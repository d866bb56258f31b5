pub mod loader;
pub mod runner;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use runner::{apply_plan, check_plan, ApplicationError, PatchResult, RunMode};
pub use schema::{Metadata, PatchConfig, PatchDefinition, ValidationError, ValidationIssue};
