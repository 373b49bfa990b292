//! Scenario validation
//!
//! Collects every error and warning instead of stopping at the first one.

use std::collections::HashSet;

use crate::config::loader::ScenarioLimits;
use crate::config::schema::ScenarioConfig;
use crate::error::{Severity, ValidationIssue};
use crate::surface::EventKind;

/// Result of scenario validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Scenario validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a scenario and returns every issue found.
    pub fn validate(&mut self, config: &ScenarioConfig, limits: &ScenarioLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_targets(config, limits);
        self.validate_events(config, limits);
        if let Some(interval) = &config.event_interval {
            self.validate_duration("event_interval", interval);
        }

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_targets(&mut self, config: &ScenarioConfig, limits: &ScenarioLimits) {
        if config.targets.is_empty() {
            self.add_warning(
                "targets",
                "No targets defined; the coordinator will report everything unlocked immediately",
            );
        }

        if config.targets.len() > limits.max_targets {
            self.add_error(
                "targets",
                &format!(
                    "Too many targets: {} (limit: {})",
                    config.targets.len(),
                    limits.max_targets
                ),
            );
        }

        let mut seen = HashSet::new();
        for (i, target) in config.targets.iter().enumerate() {
            let path = format!("targets[{i}]");

            if target.id.trim().is_empty() {
                self.add_error(&format!("{path}.id"), "Target id is required and cannot be empty");
            } else if !seen.insert(target.id.as_str()) {
                self.add_error(
                    &format!("{path}.id"),
                    &format!("Duplicate target id '{}'", target.id),
                );
            }

            if let Some(latency) = &target.latency {
                self.validate_duration(&format!("{path}.latency"), latency);
            }
        }
    }

    fn validate_events(&mut self, config: &ScenarioConfig, limits: &ScenarioLimits) {
        if config.events.len() > limits.max_events {
            self.add_error(
                "events",
                &format!(
                    "Too many events: {} (limit: {})",
                    config.events.len(),
                    limits.max_events
                ),
            );
        }

        for (i, name) in config.events.iter().enumerate() {
            let path = format!("events[{i}]");
            match name.parse::<EventKind>() {
                Ok(kind) if !kind.is_qualifying() => {
                    self.add_warning(
                        &path,
                        &format!("'{kind}' is dispatched but never triggers an unlock attempt"),
                    );
                }
                Ok(_) => {}
                Err(_) => {
                    let message = suggest_event_kind(name).map_or_else(
                        || format!("Unknown event kind '{name}'"),
                        |s| format!("Unknown event kind '{name}' (did you mean '{s}'?)"),
                    );
                    self.add_error(&path, &message);
                }
            }
        }
    }

    fn validate_duration(&mut self, path: &str, value: &str) {
        if let Err(e) = humantime::parse_duration(value) {
            self.add_error(path, &format!("Invalid duration '{value}': {e}"));
        }
    }

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

/// Suggests a known event kind for a misspelled name.
///
/// Returns the closest match if its Damerau-Levenshtein distance is ≤ 3.
#[must_use]
pub fn suggest_event_kind(input: &str) -> Option<&'static str> {
    let input = input.to_ascii_lowercase();
    EventKind::ALL
        .iter()
        .map(|kind| (kind.as_str(), strsim::damerau_levenshtein(&input, kind.as_str())))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name)
}
