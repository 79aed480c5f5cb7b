//! Client-side credit application desk.
//!
//! The desk loads the server-declared feature schema, keeps a validated form
//! over it, submits complete applications to the scoring service, and renders
//! the response next to its cosmetic risk tier and, for labelled samples, the
//! recorded outcome.

pub mod cancel;
pub mod client;
pub mod defaults;
pub mod domain;
pub mod error;
pub mod form;
pub mod health;
pub mod interpretation;
pub mod router;
pub mod sample;
pub mod schema;
pub mod service;
pub mod submission;

#[cfg(test)]
mod tests;

pub use cancel::CancelFlag;
pub use client::{HttpScoringBackend, ScoringBackend};
pub use defaults::DefaultValuePolicy;
pub use domain::{
    BackendHealth, CategoricalFeature, CreditApplication, Decision, FeatureSchema, FieldValue,
    GroundTruth, ModelMetrics, ModelPerformanceResponse, PredictionResponse, RiskLevel,
    SampleRecord,
};
pub use error::{DeskError, TransportError, ValidationFailure};
pub use form::{FieldDescriptor, FormGroup, FormState, FormStateEngine, ValidatorRegistry};
pub use health::{BackendStatus, HealthMonitor, HealthSnapshot};
pub use interpretation::{
    AccuracyComparator, ConfusionBreakdown, Outcome, PerformanceClient, PerformanceReport,
    PresentationTier, RiskBand, RiskInterpreter, TierAlignment, Verdict,
};
pub use router::desk_router;
pub use sample::SampleDataLoader;
pub use schema::SchemaClient;
pub use service::{DeskService, FormView, Phase};
pub use submission::{SubmissionPipeline, SubmissionTicket};
