//! Prometheus metrics
//!
//! The recorder is installed once per process; `/metrics` renders it.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use lingua_core::TutorResponse;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder (idempotent)
pub fn init_metrics() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                // Another recorder is global already; render an empty local one
                tracing::warn!(error = %e, "Failed to install Prometheus recorder");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// `GET /metrics`
pub async fn metrics_handler() -> impl IntoResponse {
    match METRICS_HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics disabled".to_string(),
        ),
    }
}

/// Record a committed turn
pub fn record_turn(response: &TutorResponse) {
    metrics::counter!("lingua_turns_total").increment(1);
    metrics::histogram!("lingua_turn_quality").record(response.quality_score as f64);

    let accepted = response.accepted_units().count() as u64;
    metrics::counter!("lingua_units_accepted_total").increment(accepted);
    for unit in response.rejected_units() {
        if let Some(reason) = unit.reject_reason {
            metrics::counter!("lingua_units_rejected_total", "reason" => reason.as_str()).increment(1);
        }
    }

    let latency = &response.latency_ms;
    for (stage, ms) in [
        ("stt", latency.stt),
        ("llm", latency.llm),
        ("tts", latency.tts),
        ("total", latency.total),
    ] {
        metrics::histogram!("lingua_stage_latency_ms", "stage" => stage).record(ms as f64);
    }
}

/// Record a failed request
pub fn record_error(kind: &'static str) {
    metrics::counter!("lingua_errors_total", "kind" => kind).increment(1);
}
