//! Prometheus request counters and the process-wide recorder.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::debug;

// === Metric Name Constants ===

/// Total requests received, labeled by method/route/status.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Total error responses (status >= 400), same labels.
pub const METRIC_HTTP_ERRORS: &str = "http_errors_total";

static RECORDER: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the process-wide Prometheus recorder and register metric
/// descriptions. Idempotent; later calls return the same handle.
///
/// The handle's `render()` backs the `/metrics` exposition endpoint.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = RECORDER
        .get_or_try_init(|| {
            let handle = PrometheusBuilder::new().install_recorder()?;

            describe_counter!(
                METRIC_HTTP_REQUESTS,
                "Total number of HTTP requests received"
            );
            describe_counter!(
                METRIC_HTTP_ERRORS,
                "Total number of HTTP errors encountered"
            );

            debug!("Metrics recorder installed");
            Ok::<_, anyhow::Error>(handle)
        })?
        .clone();

    Ok(handle)
}

/// Record a completed request.
///
/// Increments the request counter always, and the error counter when the
/// status is an error. Exactly one call per terminal response.
pub fn record_request(method: &str, route: &str, status: u16) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];

    counter!(METRIC_HTTP_REQUESTS, &labels).increment(1);
    if status >= 400 {
        counter!(METRIC_HTTP_ERRORS, &labels).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_install_is_idempotent() {
        let first = install_recorder().unwrap();
        let second = install_recorder().unwrap();

        record_request("GET", "/api/tasks", 200);
        record_request("GET", "/api/tasks", 502);

        let rendered = first.render();
        assert!(rendered.contains(METRIC_HTTP_REQUESTS));
        assert!(rendered.contains(METRIC_HTTP_ERRORS));
        drop(second);
    }
}
