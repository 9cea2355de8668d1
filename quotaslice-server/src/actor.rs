//! Single-owner actor serialising access to the quota registry
//!
//! Every usage period is mutated by each admission check, so all checks run
//! on one task that owns the [`QuotaRegistry`]. Transports talk to it
//! through a cloneable [`QuotaHandle`].

use crate::metrics::Metrics;
use crate::types::CheckResponse;
use anyhow::Result;
use quotaslice::{Clock, QuotaRegistry, UsageSnapshot};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message types for the quota actor
pub enum QuotaMessage {
    Check {
        subject: String,
        response_tx: oneshot::Sender<Option<CheckResponse>>,
    },
    Reset {
        subject: String,
        response_tx: oneshot::Sender<bool>,
    },
    Usage {
        subject: String,
        response_tx: oneshot::Sender<Option<UsageSnapshot>>,
    },
}

/// Handle to communicate with the quota actor
#[derive(Clone)]
pub struct QuotaHandle {
    tx: mpsc::Sender<QuotaMessage>,
    metrics: Arc<Metrics>,
}

impl QuotaHandle {
    /// Counters updated by the actor
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Run an admission check; `None` for an unknown subject
    pub async fn check(&self, subject: impl Into<String>) -> Result<Option<CheckResponse>> {
        let subject = subject.into();
        self.request(|response_tx| QuotaMessage::Check {
            subject,
            response_tx,
        })
        .await
    }

    /// Force a quota renewal; `false` for an unknown subject
    pub async fn reset(&self, subject: impl Into<String>) -> Result<bool> {
        let subject = subject.into();
        self.request(|response_tx| QuotaMessage::Reset {
            subject,
            response_tx,
        })
        .await
    }

    /// Current usage of a subject; `None` for an unknown subject
    pub async fn usage(&self, subject: impl Into<String>) -> Result<Option<UsageSnapshot>> {
        let subject = subject.into();
        self.request(|response_tx| QuotaMessage::Usage {
            subject,
            response_tx,
        })
        .await
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> QuotaMessage,
    ) -> Result<T> {
        let (response_tx, response_rx) = oneshot::channel();

        self.tx
            .send(message(response_tx))
            .await
            .map_err(|_| anyhow::anyhow!("Quota actor has shut down"))?;

        response_rx
            .await
            .map_err(|_| anyhow::anyhow!("Quota actor dropped response channel"))
    }
}

/// The quota actor
pub struct QuotaActor;

impl QuotaActor {
    /// Spawn an actor owning `registry` and return a handle to it
    pub fn spawn<C>(buffer_size: usize, registry: QuotaRegistry<C>) -> QuotaHandle
    where
        C: Clock + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer_size);
        let metrics = Arc::new(Metrics::new());

        tokio::spawn(run_actor(rx, registry, Arc::clone(&metrics)));

        QuotaHandle { tx, metrics }
    }
}

async fn run_actor<C: Clock>(
    mut rx: mpsc::Receiver<QuotaMessage>,
    mut registry: QuotaRegistry<C>,
    metrics: Arc<Metrics>,
) {
    tracing::info!("Quota actor serving {} subject(s)", registry.len());

    while let Some(msg) = rx.recv().await {
        // Ignore send errors - receiver may have timed out
        match msg {
            QuotaMessage::Check {
                subject,
                response_tx,
            } => {
                let response = handle_check(&mut registry, &subject);
                metrics.record_check(response.as_ref().map(|r| r.allowed));
                let _ = response_tx.send(response);
            }
            QuotaMessage::Reset {
                subject,
                response_tx,
            } => {
                let reset = registry.reset(&subject);
                if reset {
                    metrics.record_reset();
                    tracing::info!("Quota for {} reset on request", subject);
                }
                let _ = response_tx.send(reset);
            }
            QuotaMessage::Usage {
                subject,
                response_tx,
            } => {
                let _ = response_tx.send(registry.snapshot(&subject));
            }
        }
    }

    tracing::info!("Quota actor shutting down");
}

fn handle_check<C: Clock>(registry: &mut QuotaRegistry<C>, subject: &str) -> Option<CheckResponse> {
    let allowed = registry.check(subject)?;
    let period = registry.get(subject)?;

    if !allowed {
        tracing::debug!("Request for {} refused, quota exhausted", subject);
    }

    Some(CheckResponse::from_period(allowed, period))
}
