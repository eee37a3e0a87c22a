//! Request logging middleware
//!
//! Every request gets a tracing span from `tower-http`; slow and failed
//! requests are additionally logged with their timing.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnResponse, MakeSpan, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{info_span, warn, Level, Span};

const SLOW_REQUEST_MS: u128 = 1_000;

/// Span per request carrying method, route and the authenticated user
#[derive(Clone, Debug, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        info_span!(
            "http_request",
            method = %request.method(),
            route = %route,
            user_id = tracing::field::Empty,
        )
    }
}

pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}

/// Warn about slow requests and server errors
pub async fn log_requests(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let duration_ms = started.elapsed().as_millis();
    let status = response.status();

    if status.is_server_error() {
        warn!(method = %method, path = %path, status = status.as_u16(), duration_ms = duration_ms as u64, "Request failed");
    } else if duration_ms > SLOW_REQUEST_MS {
        warn!(method = %method, path = %path, status = status.as_u16(), duration_ms = duration_ms as u64, "Slow request");
    }

    response
}
