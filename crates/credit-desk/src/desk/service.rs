use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, OnceCell};
use tracing::{debug, info, warn};

use super::client::ScoringBackend;
use super::domain::{FeatureSchema, FieldValue};
use super::error::DeskError;
use super::form::{FieldDescriptor, FormStateEngine};
use super::health::{self, HealthSnapshot};
use super::interpretation::{PerformanceClient, PerformanceReport, Verdict};
use super::sample::SampleDataLoader;
use super::schema::SchemaClient;
use super::submission::SubmissionPipeline;

/// Lifecycle of the desk. `Submitting` always returns to `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready,
    Submitting,
}

#[derive(Debug)]
struct Session {
    phase: Phase,
    form: Option<FormStateEngine>,
    latest: Option<Verdict>,
    last_error: Option<DeskError>,
    /// Bumped on every reset and schema load; results from an older epoch are
    /// discarded.
    epoch: u64,
}

/// Snapshot of the form for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub phase: Phase,
    pub fields: Vec<FieldDescriptor>,
    pub values: BTreeMap<String, Option<FieldValue>>,
    pub errors: BTreeMap<String, String>,
    pub completion: u8,
    pub focused: Option<String>,
    pub tooltip: Option<&'static str>,
    pub has_ground_truth: bool,
    pub last_error: Option<String>,
}

/// The decision desk: one form session against one scoring backend.
pub struct DeskService<B> {
    backend: Arc<B>,
    schema_client: SchemaClient<B>,
    samples: SampleDataLoader<B>,
    pipeline: SubmissionPipeline<B>,
    performance: PerformanceClient<B>,
    performance_cache: OnceCell<PerformanceReport>,
    session: Mutex<Session>,
    health: Option<watch::Receiver<HealthSnapshot>>,
}

impl<B> DeskService<B>
where
    B: ScoringBackend + 'static,
{
    pub fn new(backend: Arc<B>, submit_timeout: Duration) -> Self {
        Self {
            schema_client: SchemaClient::new(backend.clone()),
            samples: SampleDataLoader::new(backend.clone()),
            pipeline: SubmissionPipeline::with_timeout(backend.clone(), submit_timeout),
            performance: PerformanceClient::new(backend.clone()),
            performance_cache: OnceCell::new(),
            session: Mutex::new(Session {
                phase: Phase::Uninitialized,
                form: None,
                latest: None,
                last_error: None,
                epoch: 0,
            }),
            health: None,
            backend,
        }
    }

    /// Report backend status from a running health monitor.
    pub fn with_health(mut self, receiver: watch::Receiver<HealthSnapshot>) -> Self {
        self.health = Some(receiver);
        self
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn is_ready(&self) -> bool {
        self.lock().form.is_some()
    }

    /// Fetch the schema and start a fresh form from its defaults. A failed
    /// reload keeps the previous form.
    pub async fn load_schema(&self) -> Result<Arc<FeatureSchema>, DeskError> {
        {
            let mut session = self.lock();
            if session.phase != Phase::Submitting {
                session.phase = Phase::Loading;
            }
        }

        let fetched = self.schema_client.fetch_schema().await;

        let mut session = self.lock();
        match fetched {
            Ok(schema) => {
                let schema = Arc::new(schema);
                self.pipeline.cancel_in_flight();
                session.epoch += 1;
                session.form = Some(FormStateEngine::new(schema.clone()));
                session.latest = None;
                session.last_error = None;
                session.phase = Phase::Ready;
                Ok(schema)
            }
            Err(err) => {
                if session.phase == Phase::Loading {
                    session.phase = if session.form.is_some() {
                        Phase::Ready
                    } else {
                        Phase::Uninitialized
                    };
                }
                session.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn schema(&self) -> Result<Arc<FeatureSchema>, DeskError> {
        let session = self.lock();
        let form = session.form.as_ref().ok_or(DeskError::NotReady)?;
        Ok(form.schema().clone())
    }

    pub fn form_view(&self) -> Result<FormView, DeskError> {
        let session = self.lock();
        view_of(&session)
    }

    pub fn set_field(&self, field: &str, value: Option<FieldValue>) -> Result<FormView, DeskError> {
        let mut session = self.lock();
        let form = session.form.as_mut().ok_or(DeskError::NotReady)?;
        form.set(field, value)?;
        debug!(field, completion = form.completion_percentage(), "field updated");
        view_of(&session)
    }

    /// Set a field from raw user input. Numeric fields are parsed; input that
    /// does not parse is kept as typed.
    pub fn set_field_input(&self, field: &str, raw: &str) -> Result<FormView, DeskError> {
        let value = {
            let session = self.lock();
            let form = session.form.as_ref().ok_or(DeskError::NotReady)?;
            FieldValue::parse_for(form.schema(), field, raw).unwrap_or_else(|_| FieldValue::text(raw))
        };
        self.set_field(field, Some(value))
    }

    pub fn focus(&self, field: Option<&str>) -> Result<FormView, DeskError> {
        let mut session = self.lock();
        let form = session.form.as_mut().ok_or(DeskError::NotReady)?;
        form.focus(field);
        view_of(&session)
    }

    /// Back to the defaults. Cancels any submission in flight and discards its
    /// late result.
    pub fn reset(&self) -> Result<FormView, DeskError> {
        let mut session = self.lock();
        let form = session.form.as_mut().ok_or(DeskError::NotReady)?;
        let schema = form.schema().clone();
        form.reset(schema);

        if self.pipeline.cancel_in_flight() {
            info!("in-flight submission cancelled by reset");
        }
        session.epoch += 1;
        session.latest = None;
        session.last_error = None;
        session.phase = Phase::Ready;
        view_of(&session)
    }

    pub async fn load_sample(&self, include_label: bool) -> Result<FormView, DeskError> {
        if !self.is_ready() {
            return Err(DeskError::NotReady);
        }

        let record = match self.samples.load_sample(include_label).await {
            Ok(record) => record,
            Err(err) => {
                self.lock().last_error = Some(err.clone());
                return Err(err);
            }
        };

        let mut session = self.lock();
        let form = session.form.as_mut().ok_or(DeskError::NotReady)?;
        form.apply_sample(record);
        session.last_error = None;
        view_of(&session)
    }

    /// Submit the current form. Validation failures never reach the network;
    /// the previous verdict is cleared only once the call is dispatched.
    pub async fn submit(&self) -> Result<Verdict, DeskError> {
        // Prepare, claim the slot and enter `Submitting` under one guard so a
        // concurrent reset either precedes the payload or cancels the ticket.
        let (application, ground_truth, epoch, ticket) = {
            let mut session = self.lock();
            let form = session.form.as_ref().ok_or(DeskError::NotReady)?;
            let application = self.pipeline.prepare(form.state())?;
            let ground_truth = form.ground_truth().cloned();
            let ticket = self.pipeline.begin()?;
            session.latest = None;
            session.last_error = None;
            session.phase = Phase::Submitting;
            (application, ground_truth, session.epoch, ticket)
        };

        let result = ticket.send(&application).await;

        let mut session = self.lock();
        if session.epoch != epoch {
            if session.phase == Phase::Submitting {
                session.phase = Phase::Ready;
            }
            debug!("submission result discarded after reset");
            return Err(DeskError::Cancelled);
        }
        session.phase = Phase::Ready;
        match result {
            Ok(prediction) => {
                let verdict = Verdict::interpret(prediction, ground_truth.as_ref());
                session.latest = Some(verdict.clone());
                Ok(verdict)
            }
            Err(err) => {
                session.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn cancel_submission(&self) -> bool {
        self.pipeline.cancel_in_flight()
    }

    pub fn latest(&self) -> Option<Verdict> {
        self.lock().latest.clone()
    }

    /// Model evaluation figures, fetched once per session. Failures are not
    /// cached.
    pub async fn performance(&self) -> Result<PerformanceReport, DeskError> {
        self.performance_cache
            .get_or_try_init(|| self.performance.fetch())
            .await
            .cloned()
    }

    /// Latest status from the health monitor, or a direct probe when the
    /// desk runs without one.
    pub async fn backend_status(&self) -> HealthSnapshot {
        if let Some(receiver) = &self.health {
            let snapshot = receiver.borrow().clone();
            return snapshot;
        }
        health::probe(self.backend.as_ref()).await
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().expect("desk session mutex poisoned")
    }
}

impl<B> Drop for DeskService<B> {
    fn drop(&mut self) {
        if self.pipeline.cancel_in_flight() {
            warn!("in-flight submission cancelled on shutdown");
        }
    }
}

fn view_of(session: &Session) -> Result<FormView, DeskError> {
    let form = session.form.as_ref().ok_or(DeskError::NotReady)?;
    let state = form.state();
    Ok(FormView {
        phase: session.phase,
        fields: form.descriptors(),
        values: state.values().clone(),
        errors: state.errors().clone(),
        completion: state.completion(),
        focused: form.focused().map(str::to_string),
        tooltip: form.tooltip(),
        has_ground_truth: form.ground_truth().is_some(),
        last_error: session.last_error.as_ref().map(ToString::to_string),
    })
}
