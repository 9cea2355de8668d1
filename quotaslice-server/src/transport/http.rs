//! HTTP/JSON transport
//!
//! # API Endpoints
//!
//! ## POST /check/{subject}
//!
//! Count one request against `subject`. Responds 200 with a
//! [`CheckResponse`] when admitted, 429 with the same body when the quota is
//! exhausted, and 404 for an unknown subject.
//!
//! ```json
//! {
//!   "subject": "search",
//!   "allowed": true,
//!   "limit": 100,
//!   "remaining": 99
//! }
//! ```
//!
//! ## POST /reset/{subject}
//!
//! Restore the full quota of `subject`. Responds 204, or 404 for an unknown
//! subject.
//!
//! ## GET /usage/{subject}
//!
//! Current [`UsageSnapshot`](quotaslice::UsageSnapshot) of `subject`, or 404.
//!
//! ## GET /metrics
//!
//! Admission counters in Prometheus text format.
//!
//! ## GET /health
//!
//! Health check endpoint. Returns "OK" with 200 status.

use super::Transport;
use crate::actor::QuotaHandle;
use crate::types::CheckResponse;
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Error message
    pub error: String,
}

/// HTTP transport implementation
pub struct HttpTransport {
    addr: SocketAddr,
}

impl HttpTransport {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("Invalid HTTP address {host}:{port}"))?;
        Ok(Self { addr })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn start(self, quotas: QuotaHandle) -> Result<()> {
        let app = router(quotas);

        tracing::info!("HTTP server listening on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Build the HTTP routes on top of a quota actor handle
pub fn router(quotas: QuotaHandle) -> Router {
    Router::new()
        .route("/check/{subject}", post(handle_check))
        .route("/reset/{subject}", post(handle_reset))
        .route("/usage/{subject}", get(handle_usage))
        .route("/metrics", get(handle_metrics))
        .route("/health", get(|| async { "OK" }))
        .with_state(quotas)
}

async fn handle_check(State(quotas): State<QuotaHandle>, Path(subject): Path<String>) -> Response {
    match quotas.check(subject.as_str()).await {
        Ok(Some(response)) => check_response(response),
        Ok(None) => unknown_subject(&subject),
        Err(e) => internal_error(e),
    }
}

async fn handle_reset(State(quotas): State<QuotaHandle>, Path(subject): Path<String>) -> Response {
    match quotas.reset(subject.as_str()).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => unknown_subject(&subject),
        Err(e) => internal_error(e),
    }
}

async fn handle_usage(State(quotas): State<QuotaHandle>, Path(subject): Path<String>) -> Response {
    match quotas.usage(subject.as_str()).await {
        Ok(Some(snapshot)) => Json(snapshot).into_response(),
        Ok(None) => unknown_subject(&subject),
        Err(e) => internal_error(e),
    }
}

async fn handle_metrics(State(quotas): State<QuotaHandle>) -> String {
    quotas.metrics().export_prometheus()
}

fn check_response(response: CheckResponse) -> Response {
    let status = if response.allowed {
        StatusCode::OK
    } else {
        StatusCode::TOO_MANY_REQUESTS
    };
    (status, Json(response)).into_response()
}

fn unknown_subject(subject: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(HttpErrorResponse {
            error: format!("No quota rule for subject {subject}"),
        }),
    )
        .into_response()
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!("Quota actor error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(HttpErrorResponse {
            error: format!("Internal server error: {e}"),
        }),
    )
        .into_response()
}
