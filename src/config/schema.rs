//! Scenario schema.
//!
//! A scenario describes the simulated targets and the interaction events to
//! replay against them. Durations and event names are kept as raw strings
//! here so the validator can report every problem with its location; the
//! loader turns a validated [`ScenarioConfig`] into a resolved [`Scenario`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::surface::EventKind;
use crate::target::ScriptedOutcome;

/// Raw scenario file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Optional human-readable name.
    #[serde(default)]
    pub name: Option<String>,

    /// Targets to register, in order.
    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    /// Interaction events to dispatch, in order.
    #[serde(default)]
    pub events: Vec<String>,

    /// Delay between dispatched events (humantime, e.g. `"50ms"`).
    #[serde(default)]
    pub event_interval: Option<String>,
}

/// Raw target definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Unique target identifier.
    pub id: String,

    /// Outcomes for successive `play()` calls.
    #[serde(default)]
    pub outcomes: Vec<ScriptedOutcome>,

    /// Outcome once `outcomes` is exhausted.
    #[serde(default = "default_outcome")]
    pub default: ScriptedOutcome,

    /// How long each `play()` takes to settle (humantime).
    #[serde(default)]
    pub latency: Option<String>,
}

const fn default_outcome() -> ScriptedOutcome {
    ScriptedOutcome::Accept
}

/// A validated, resolved scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Scenario name (file stem when unnamed).
    pub name: String,
    /// Targets, in registration order.
    pub targets: Vec<TargetSpec>,
    /// Events to dispatch, in order.
    pub events: Vec<EventKind>,
    /// Delay between dispatched events.
    pub event_interval: Duration,
}

/// A resolved target definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Unique target identifier.
    pub id: String,
    /// Outcomes for successive `play()` calls.
    pub outcomes: Vec<ScriptedOutcome>,
    /// Outcome once `outcomes` is exhausted.
    pub default: ScriptedOutcome,
    /// Settle latency of each `play()` call.
    pub latency: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_target_uses_defaults() {
        let config: ScenarioConfig = serde_yaml::from_str("targets:\n  - id: v1\n").unwrap();
        let target = &config.targets[0];
        assert_eq!(target.id, "v1");
        assert!(target.outcomes.is_empty());
        assert_eq!(target.default, ScriptedOutcome::Accept);
        assert!(target.latency.is_none());
        assert!(config.events.is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<ScenarioConfig, _> = serde_yaml::from_str("targets: []\nspeed: 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn full_scenario_parses() {
        let yaml = r"
name: intro
targets:
  - id: intro-video
    outcomes: [reject, accept]
    default: reject
    latency: 15ms
events: [click, keydown]
event_interval: 50ms
";
        let config: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("intro"));
        assert_eq!(
            config.targets[0].outcomes,
            vec![ScriptedOutcome::Reject, ScriptedOutcome::Accept]
        );
        assert_eq!(config.targets[0].default, ScriptedOutcome::Reject);
        assert_eq!(config.events, vec!["click", "keydown"]);
        assert_eq!(config.event_interval.as_deref(), Some("50ms"));
    }
}
