//! Metrics collection.
//!
//! Prometheus-compatible counters and gauges recorded through the `metrics`
//! facade. Without an installed recorder every call is a no-op, so the
//! coordinator records unconditionally.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::MediaUnlockError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Outcome label for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeLabel {
    /// The probe unlocked its target.
    Unlocked,
    /// The probe succeeded after another probe unlocked the target.
    Duplicate,
    /// The platform refused playback.
    Failed,
}

impl ProbeLabel {
    /// Label value used in metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unlocked => "unlocked",
            Self::Duplicate => "duplicate",
            Self::Failed => "failed",
        }
    }
}

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// # Errors
///
/// Returns `MediaUnlockError::Io` if the recorder or HTTP listener cannot
/// be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), MediaUnlockError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| MediaUnlockError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "mediaunlock_attempts_total",
        "Attempt passes run, by trigger"
    );
    describe_counter!("mediaunlock_probes_total", "Probes settled, by outcome");
    describe_counter!(
        "mediaunlock_redundant_attempts_total",
        "Already-unlocked targets skipped during attempt passes"
    );
    describe_gauge!(
        "mediaunlock_targets_unlocked",
        "Number of targets currently unlocked"
    );
    describe_gauge!(
        "mediaunlock_listeners_attached",
        "Number of unlock listeners attached to the surface"
    );
}

/// Records an attempt pass.
pub fn record_attempt(trigger: &str) {
    counter!("mediaunlock_attempts_total", "trigger" => trigger.to_owned()).increment(1);
}

/// Records a settled probe.
pub fn record_probe(outcome: ProbeLabel) {
    counter!("mediaunlock_probes_total", "outcome" => outcome.as_str()).increment(1);
}

/// Records a skipped, already-unlocked target.
pub fn record_redundant_attempt() {
    counter!("mediaunlock_redundant_attempts_total").increment(1);
}

/// Sets the unlocked-target gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_targets_unlocked(count: usize) {
    gauge!("mediaunlock_targets_unlocked").set(count as f64);
}

/// Sets the attached-listener gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_listeners_attached(count: usize) {
    gauge!("mediaunlock_listeners_attached").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_labels() {
        assert_eq!(ProbeLabel::Unlocked.as_str(), "unlocked");
        assert_eq!(ProbeLabel::Duplicate.as_str(), "duplicate");
        assert_eq!(ProbeLabel::Failed.as_str(), "failed");
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        record_attempt("click");
        record_probe(ProbeLabel::Failed);
        record_redundant_attempt();
        set_targets_unlocked(3);
        set_listeners_attached(0);
    }
}
