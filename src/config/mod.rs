//! Scenario configuration
//!
//! Schema, loading and validation for the YAML scenarios replayed by the
//! `run` command.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{LoadResult, ScenarioLimits, load_scenario};
pub use schema::{Scenario, ScenarioConfig, TargetConfig, TargetSpec};
pub use validation::{ValidationResult, Validator};
