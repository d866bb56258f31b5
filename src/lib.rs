//! Feature Patcher: idempotent source weaving for feature scaffolding
//!
//! Registers a freshly scaffolded feature in the files a framework expects
//! it in (seeders, service providers, route files) by inserting small text
//! fragments at anchor points found with plain text search and lexical
//! block matching.
//!
//! # Architecture
//!
//! Every insertion is described by an [`InsertionSpec`]: the fragment, an
//! [`Identity`] key proving it was already applied, and an ordered list of
//! [`AnchorStrategy`] fallbacks. The [`engine`] is pure (text in, outcome
//! out); [`patch`] adds file I/O, [`config`] runs whole patch plans and
//! [`recipes`] builds plans for the usual registration points.
//!
//! # Guarantees
//!
//! - Applying the same spec twice changes the file at most once
//! - A spec whose anchors all fail leaves the file byte-identical
//! - Inserted lines follow the indentation and line endings around them
//! - Workspace boundary enforcement for plan targets
//!
//! # Example
//!
//! ```no_run
//! use feature_patcher::{patch_file, AnchorStrategy, InsertionSpec};
//!
//! let spec = InsertionSpec::new("$this->call(OrderSeeder::class);", "OrderSeeder::class")
//!     .anchor(AnchorStrategy::block_body_end("public function run()"));
//!
//! match patch_file("database/seeders/DatabaseSeeder.php", &spec) {
//!     Ok(outcome) => println!("Patched: {:?}", outcome),
//!     Err(e) => eprintln!("Patch failed: {}", e),
//! }
//! ```

pub mod config;
pub mod engine;
pub mod patch;
pub mod recipes;
pub mod report;
pub mod safety;

// Re-exports
pub use config::{
    apply_plan, check_plan, load_from_path, load_from_str, ApplicationError, ConfigError,
    PatchConfig, PatchResult, RunMode,
};
pub use engine::{AnchorStrategy, Delimiter, Identity, InsertionOutcome, InsertionSpec, SourceDocument};
pub use patch::{patch_file, patch_file_all, patch_text, PatchError};
pub use recipes::{ControllerKind, FeatureDetails, RecipeError, Weavings};
pub use report::{near_miss, unified_diff, NearMiss};
pub use safety::{SafetyError, WorkspaceGuard};
