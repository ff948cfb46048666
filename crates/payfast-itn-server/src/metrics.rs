use itn::{CheckKind, VerificationOutcome};
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use std::sync::LazyLock;

pub static NOTIFICATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "itn_notifications_total",
        "Notifications received, by processing result",
        &["result"]
    )
    .unwrap()
});

pub static CHECK_RESULTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "itn_check_results_total",
        "Trust check results",
        &["check", "result"]
    )
    .unwrap()
});

/// Count each check of a completed outcome.
pub fn record_outcome(outcome: &VerificationOutcome) {
    for check in [
        CheckKind::Signature,
        CheckKind::SourceNetwork,
        CheckKind::ServerConfirmation,
    ] {
        let result = if outcome.passed(check) { "pass" } else { "fail" };
        CHECK_RESULTS
            .with_label_values(&[check.as_str(), result])
            .inc();
    }
    let result = if outcome.is_verified() {
        "verified"
    } else {
        "unverified"
    };
    NOTIFICATIONS.with_label_values(&[result]).inc();
}

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
