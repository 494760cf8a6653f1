//! Metrics definitions for the authorization layer.
//!
//! All metrics follow Prometheus naming conventions:
//! - `auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `outcome`: 11 values (`authorized` plus one per `AuthError` code)
//! - `status`: 2 values (success, error)

use crate::errors::AuthError;
use metrics::{counter, histogram};
use std::time::Duration;

/// Outcome label for a successful authorization.
pub const OUTCOME_AUTHORIZED: &str = "authorized";

/// Outcome label for an authorization result.
pub fn outcome_label<T>(result: &Result<T, AuthError>) -> &'static str {
    match result {
        Ok(_) => OUTCOME_AUTHORIZED,
        Err(e) => e.code(),
    }
}

// ============================================================================
// Authorization Metrics
// ============================================================================

/// Record a completed authorization check
///
/// Metric: `auth_authorize_total`, `auth_authorize_duration_seconds`
/// Labels: `outcome`
pub fn record_authorization(outcome: &'static str, duration: Duration) {
    histogram!("auth_authorize_duration_seconds",
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());

    counter!("auth_authorize_total",
        "outcome" => outcome
    )
    .increment(1);
}

// ============================================================================
// JWKS Metrics
// ============================================================================

/// Record a JWKS fetch attempt
///
/// Metric: `auth_jwks_refresh_total`, `auth_jwks_refresh_duration_seconds`
/// Labels: `status` (counter only)
pub fn record_jwks_refresh(status: &'static str, duration: Duration) {
    histogram!("auth_jwks_refresh_duration_seconds").record(duration.as_secs_f64());

    counter!("auth_jwks_refresh_total",
        "status" => status
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    fn counter_value(recorder: &DebuggingRecorder, name: &str, label: (&str, &str)) -> u64 {
        recorder
            .snapshotter()
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, _, _, _)| {
                key.key().name() == name
                    && key
                        .key()
                        .labels()
                        .any(|l| l.key() == label.0 && l.value() == label.1)
            })
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(v) => v,
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_authorization(OUTCOME_AUTHORIZED, Duration::from_millis(2));
        record_jwks_refresh("success", Duration::from_millis(40));
    }

    #[test]
    fn test_record_authorization_counts_by_outcome() {
        let recorder = DebuggingRecorder::new();

        metrics::with_local_recorder(&recorder, || {
            record_authorization(OUTCOME_AUTHORIZED, Duration::from_millis(1));
            record_authorization(OUTCOME_AUTHORIZED, Duration::from_millis(1));
            record_authorization("forbidden", Duration::from_millis(1));
        });

        assert_eq!(
            counter_value(&recorder, "auth_authorize_total", ("outcome", "authorized")),
            2
        );
        assert_eq!(
            counter_value(&recorder, "auth_authorize_total", ("outcome", "forbidden")),
            1
        );
    }

    #[test]
    fn test_record_jwks_refresh_counts_by_status() {
        let recorder = DebuggingRecorder::new();

        metrics::with_local_recorder(&recorder, || {
            record_jwks_refresh("error", Duration::from_millis(10));
        });

        assert_eq!(
            counter_value(&recorder, "auth_jwks_refresh_total", ("status", "error")),
            1
        );
        assert_eq!(
            counter_value(&recorder, "auth_jwks_refresh_total", ("status", "success")),
            0
        );
    }

    #[test]
    fn test_outcome_label() {
        let ok: Result<(), AuthError> = Ok(());
        assert_eq!(outcome_label(&ok), "authorized");

        let err: Result<(), AuthError> = Err(AuthError::KeyNotFound("k".to_string()));
        assert_eq!(outcome_label(&err), "key_not_found");
    }
}
