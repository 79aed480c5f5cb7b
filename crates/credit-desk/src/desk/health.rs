use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::cancel::CancelFlag;
use super::client::ScoringBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendStatus {
    Checking,
    Connected,
    Disconnected,
}

/// Latest result of the periodic backend probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub status: BackendStatus,
    pub model_trained: Option<bool>,
    pub checked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthSnapshot {
    pub fn checking() -> Self {
        Self {
            status: BackendStatus::Checking,
            model_trained: None,
            checked_at: None,
            detail: None,
        }
    }
}

/// Background task probing the scoring service on a fixed period. Stopped by
/// [`shutdown`](Self::shutdown) or aborted when dropped.
pub struct HealthMonitor {
    receiver: watch::Receiver<HealthSnapshot>,
    stop: CancelFlag,
    task: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Probe once immediately, then every `period`. Must be called inside a
    /// tokio runtime.
    pub fn spawn<B>(backend: Arc<B>, period: Duration) -> Self
    where
        B: ScoringBackend + 'static,
    {
        let (sender, receiver) = watch::channel(HealthSnapshot::checking());
        let stop = CancelFlag::new();
        let task = tokio::spawn(poll(backend, period, sender, stop.clone()));
        info!(period_secs = period.as_secs(), "backend health monitor started");

        Self {
            receiver,
            stop,
            task: Some(task),
        }
    }

    pub fn current(&self) -> HealthSnapshot {
        self.receiver.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HealthSnapshot> {
        self.receiver.clone()
    }

    pub async fn shutdown(mut self) {
        self.stop.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "health monitor task failed");
                }
            }
        }
        info!("backend health monitor stopped");
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn poll<B>(
    backend: Arc<B>,
    period: Duration,
    sender: watch::Sender<HealthSnapshot>,
    stop: CancelFlag,
) where
    B: ScoringBackend + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = interval.tick() => {}
        }

        let snapshot = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            snapshot = probe(backend.as_ref()) => snapshot,
        };

        let changed = sender.borrow().status != snapshot.status;
        if changed {
            match snapshot.status {
                BackendStatus::Connected => {
                    info!(model_trained = ?snapshot.model_trained, "scoring service connected")
                }
                _ => warn!(detail = ?snapshot.detail, "scoring service disconnected"),
            }
        }
        if sender.send(snapshot).is_err() {
            break;
        }
    }
    debug!("health poll loop exited");
}

/// One probe of the scoring service, outside any monitor.
pub async fn probe<B: ScoringBackend + ?Sized>(backend: &B) -> HealthSnapshot {
    let checked_at = Some(Utc::now());
    match backend.health().await {
        Ok(health) => HealthSnapshot {
            status: BackendStatus::Connected,
            model_trained: health.model_trained,
            checked_at,
            detail: None,
        },
        Err(err) => HealthSnapshot {
            status: BackendStatus::Disconnected,
            model_trained: None,
            checked_at,
            detail: Some(err.to_string()),
        },
    }
}
