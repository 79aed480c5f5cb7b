use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::cancel::CancelFlag;
use super::client::ScoringBackend;
use super::domain::{CreditApplication, PredictionResponse};
use super::error::DeskError;
use super::form::FormState;

pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns a form into a prediction call. At most one call is in flight; a
/// second attempt is refused rather than queued.
pub struct SubmissionPipeline<B> {
    backend: Arc<B>,
    timeout: Duration,
    in_flight: AtomicBool,
    current: Mutex<Option<CancelFlag>>,
}

impl<B> SubmissionPipeline<B> {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Cancel the submission in flight, if any. Returns whether one was.
    pub fn cancel_in_flight(&self) -> bool {
        match self.current.lock().expect("submission mutex poisoned").as_ref() {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }
}

impl<B> SubmissionPipeline<B>
where
    B: ScoringBackend + 'static,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_timeout(backend, DEFAULT_SUBMIT_TIMEOUT)
    }

    pub fn with_timeout(backend: Arc<B>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            in_flight: AtomicBool::new(false),
            current: Mutex::new(None),
        }
    }

    /// Precondition check and payload assembly. Never touches the network.
    pub fn prepare(&self, form: &FormState) -> Result<CreditApplication, DeskError> {
        let blocking = form.blocking_fields();
        if !blocking.is_empty() {
            return Err(DeskError::Validation(blocking));
        }

        let fields: BTreeMap<_, _> = form
            .values()
            .iter()
            .filter_map(|(name, value)| value.clone().map(|value| (name.clone(), value)))
            .collect();
        Ok(CreditApplication::from_fields(fields))
    }

    /// Claim the in-flight slot. The slot is released when the ticket drops.
    pub fn begin(&self) -> Result<SubmissionTicket<'_, B>, DeskError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("submission refused, another one is in flight");
            return Err(DeskError::AlreadyInProgress);
        }

        let cancel = CancelFlag::new();
        *self.current.lock().expect("submission mutex poisoned") = Some(cancel.clone());
        Ok(SubmissionTicket {
            pipeline: self,
            cancel,
        })
    }

    /// Validate, assemble and send in one step.
    pub async fn submit(&self, form: &FormState) -> Result<PredictionResponse, DeskError> {
        let application = self.prepare(form)?;
        let ticket = self.begin()?;
        ticket.send(&application).await
    }
}

/// Proof of holding the in-flight slot.
pub struct SubmissionTicket<'a, B> {
    pipeline: &'a SubmissionPipeline<B>,
    cancel: CancelFlag,
}

impl<B> SubmissionTicket<'_, B>
where
    B: ScoringBackend + 'static,
{
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Issue the prediction call, bounded by the pipeline timeout.
    pub async fn send(self, application: &CreditApplication) -> Result<PredictionResponse, DeskError> {
        let timeout = self.pipeline.timeout;
        let started = Instant::now();
        info!(fields = application.len(), "submission started");

        let call = tokio::time::timeout(timeout, self.pipeline.backend.predict(application));
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DeskError::Cancelled),
            result = call => match result {
                Err(_) => Err(DeskError::Timeout(timeout)),
                Ok(Err(err)) => Err(DeskError::from_prediction(err, timeout)),
                Ok(Ok(prediction)) => Ok(prediction),
            },
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(prediction) => info!(
                decision = %prediction.decision,
                risk_score = prediction.risk_score,
                elapsed_ms,
                "submission finished"
            ),
            Err(err) => warn!(code = err.code(), error = %err, elapsed_ms, "submission failed"),
        }
        outcome
    }
}

impl<B> Drop for SubmissionTicket<'_, B> {
    fn drop(&mut self) {
        if let Ok(mut current) = self.pipeline.current.lock() {
            current.take();
        }
        self.pipeline.in_flight.store(false, Ordering::Release);
    }
}
