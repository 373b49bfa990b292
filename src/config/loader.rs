//! Scenario loader
//!
//! Loading pipeline:
//! 1. Size check
//! 2. YAML parsing
//! 3. Validation (all issues collected)
//! 4. Resolution into a typed [`Scenario`]

use std::path::Path;
use std::time::Duration;

use crate::config::schema::{Scenario, ScenarioConfig, TargetSpec};
use crate::config::validation::Validator;
use crate::error::{ConfigError, ValidationIssue};
use crate::surface::EventKind;

/// Limits for scenario size.
#[derive(Debug, Clone)]
pub struct ScenarioLimits {
    /// Maximum number of targets.
    pub max_targets: usize,

    /// Maximum number of scripted events.
    pub max_events: usize,

    /// Maximum scenario file size in bytes.
    pub max_file_size: usize,
}

impl Default for ScenarioLimits {
    fn default() -> Self {
        Self {
            max_targets: env_or("MEDIAUNLOCK_MAX_TARGETS", 256),
            max_events: env_or("MEDIAUNLOCK_MAX_EVENTS", 10_000),
            max_file_size: env_or("MEDIAUNLOCK_MAX_SCENARIO_SIZE", 1024 * 1024),
        }
    }
}

fn env_or(var: &str, default: usize) -> usize {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Result of loading a scenario.
#[derive(Debug)]
pub struct LoadResult {
    /// The resolved scenario.
    pub scenario: Scenario,

    /// Warnings found during validation.
    pub warnings: Vec<ValidationIssue>,
}

/// Loads, validates and resolves the scenario at `path`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is missing, too large, not valid
/// YAML, or fails validation.
pub fn load_scenario(path: &Path, limits: &ScenarioLimits) -> Result<LoadResult, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        line: None,
        message: e.to_string(),
    })?;

    let fallback_name = path
        .file_stem()
        .map_or_else(|| "scenario".to_string(), |s| s.to_string_lossy().into_owned());

    parse_scenario(&raw, &fallback_name, limits).map_err(|e| match e {
        ConfigError::ParseError { line, message, .. } => ConfigError::ParseError {
            path: path.to_path_buf(),
            line,
            message,
        },
        ConfigError::ValidationError { errors, .. } => ConfigError::ValidationError {
            path: path.display().to_string(),
            errors,
        },
        other => other,
    })
}

/// Parses, validates and resolves scenario YAML held in memory.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the text is too large, not valid YAML, or
/// fails validation.
pub fn parse_scenario(
    raw: &str,
    fallback_name: &str,
    limits: &ScenarioLimits,
) -> Result<LoadResult, ConfigError> {
    if raw.len() > limits.max_file_size {
        return Err(ConfigError::InvalidValue {
            field: "file size".to_string(),
            value: raw.len().to_string(),
            expected: format!("at most {} bytes", limits.max_file_size),
        });
    }

    let config: ScenarioConfig = serde_yaml::from_str(raw).map_err(|e| ConfigError::ParseError {
        path: fallback_name.into(),
        line: e.location().map(|loc| loc.line()),
        message: e.to_string(),
    })?;

    let result = Validator::new().validate(&config, limits);
    if result.has_errors() {
        return Err(ConfigError::ValidationError {
            path: fallback_name.to_string(),
            errors: result.errors,
        });
    }

    Ok(LoadResult {
        scenario: resolve(config, fallback_name),
        warnings: result.warnings,
    })
}

/// Converts a validated config into a resolved scenario.
fn resolve(config: ScenarioConfig, fallback_name: &str) -> Scenario {
    Scenario {
        name: config.name.unwrap_or_else(|| fallback_name.to_string()),
        targets: config
            .targets
            .into_iter()
            .map(|t| TargetSpec {
                latency: t.latency.as_deref().map_or(Duration::ZERO, parse_duration),
                id: t.id,
                outcomes: t.outcomes,
                default: t.default,
            })
            .collect(),
        events: config
            .events
            .iter()
            .filter_map(|name| name.parse::<EventKind>().ok())
            .collect(),
        event_interval: config
            .event_interval
            .as_deref()
            .map_or(Duration::ZERO, parse_duration),
    }
}

/// Parses a duration the validator has already accepted.
fn parse_duration(value: &str) -> Duration {
    humantime::parse_duration(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::target::ScriptedOutcome;

    const SCENARIO: &str = r"
targets:
  - id: intro-video
    outcomes: [reject]
    latency: 15ms
  - id: ambient-audio
events: [click, touchend, keydown]
event_interval: 50ms
";

    #[test]
    fn loads_and_resolves_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(SCENARIO.as_bytes()).unwrap();

        let result = load_scenario(file.path(), &ScenarioLimits::default()).unwrap();
        let scenario = result.scenario;

        let stem = file.path().file_stem().unwrap().to_string_lossy().into_owned();
        assert_eq!(scenario.name, stem);
        assert_eq!(scenario.targets.len(), 2);
        assert_eq!(scenario.targets[0].latency, Duration::from_millis(15));
        assert_eq!(scenario.targets[0].outcomes, vec![ScriptedOutcome::Reject]);
        assert_eq!(scenario.targets[1].latency, Duration::ZERO);
        assert_eq!(
            scenario.events,
            vec![EventKind::Click, EventKind::TouchEnd, EventKind::KeyDown]
        );
        assert_eq!(scenario.event_interval, Duration::from_millis(50));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_scenario(Path::new("/nonexistent/scenario.yaml"), &ScenarioLimits::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn parse_errors_carry_path_and_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"targets:\n  - id: [unterminated\n").unwrap();

        let err = load_scenario(file.path(), &ScenarioLimits::default()).unwrap_err();
        match err {
            ConfigError::ParseError { path, line, .. } => {
                assert_eq!(path, file.path());
                assert!(line.is_some());
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn validation_errors_carry_every_issue() {
        let raw = "targets:\n  - id: v1\n  - id: v1\nevents: [clack, hover]\n";
        let err = parse_scenario(raw, "dupes", &ScenarioLimits::default()).unwrap_err();
        match err {
            ConfigError::ValidationError { path, errors } => {
                assert_eq!(path, "dupes");
                assert_eq!(errors.len(), 3);
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn oversized_input_is_rejected() {
        let limits = ScenarioLimits {
            max_file_size: 8,
            ..ScenarioLimits::default()
        };
        let err = parse_scenario(SCENARIO, "big", &limits).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn explicit_name_wins_over_stem() {
        let result = parse_scenario("name: lobby\n", "file-stem", &ScenarioLimits::default()).unwrap();
        assert_eq!(result.scenario.name, "lobby");
        assert!(result.scenario.targets.is_empty());
    }
}
