use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::desk::domain::{Decision, FieldValue, RiskLevel};
use crate::desk::error::{DeskError, TransportError};
use crate::desk::form::FormStateEngine;
use crate::desk::service::{DeskService, Phase};
use crate::desk::submission::SubmissionPipeline;

fn pipeline(backend: &Arc<ScriptedBackend>) -> SubmissionPipeline<ScriptedBackend> {
    SubmissionPipeline::new(backend.clone())
}

#[tokio::test]
async fn defaults_submit_without_validation_error() {
    let backend = Arc::new(ScriptedBackend::default());
    let engine = FormStateEngine::new(Arc::new(schema()));

    let prediction = pipeline(&backend)
        .submit(engine.state())
        .await
        .expect("defaults are complete");

    assert_eq!(prediction.decision, Decision::Reject);
    assert_eq!(backend.predict_count(), 1);
}

#[tokio::test]
async fn untyped_schema_names_do_not_block_defaults() {
    let backend = Arc::new(ScriptedBackend::default());
    let mut schema = schema();
    schema.all_features.push("telephone_hint".to_string());
    let engine = FormStateEngine::new(Arc::new(schema));

    assert_eq!(engine.state().completion(), 100);
    assert_eq!(engine.state().value("telephone_hint"), None);
    pipeline(&backend)
        .submit(engine.state())
        .await
        .expect("untyped names are not form fields");

    let sent = backend.last_application().expect("request recorded");
    assert!(!sent.contains("telephone_hint"));
}

#[tokio::test]
async fn empty_field_fails_locally() {
    let backend = Arc::new(ScriptedBackend::default());
    let mut engine = FormStateEngine::new(Arc::new(schema()));
    engine.set("housing", None).expect("schema field");

    let err = pipeline(&backend)
        .submit(engine.state())
        .await
        .expect_err("housing missing");

    match err {
        DeskError::Validation(failure) => assert_eq!(failure.missing, vec!["housing"]),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(backend.predict_count(), 0);
}

#[tokio::test]
async fn out_of_range_field_fails_locally() {
    let backend = Arc::new(ScriptedBackend::default());
    let mut engine = FormStateEngine::new(Arc::new(schema()));
    engine.set("age", Some(FieldValue::int(17))).expect("schema field");

    let err = pipeline(&backend)
        .submit(engine.state())
        .await
        .expect_err("age out of range");

    match err {
        DeskError::Validation(failure) => {
            assert!(failure.missing.is_empty());
            assert_eq!(failure.invalid, vec!["age"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(backend.predict_count(), 0);
}

#[tokio::test]
async fn labels_never_reach_the_backend() {
    let backend = Arc::new(ScriptedBackend::default());
    let mut engine = FormStateEngine::new(Arc::new(schema()));
    engine.apply_sample(sample_record(Some("Güvenli")));

    let pipeline = pipeline(&backend);
    let application = pipeline.prepare(engine.state()).expect("sample is complete");
    assert!(!application.contains("actual_risk_label"));
    assert!(!application.contains("actual_risk"));

    pipeline.submit(engine.state()).await.expect("submits");
    let sent = backend.last_application().expect("request recorded");
    assert!(!sent.contains("actual_risk_label"));
    assert_eq!(sent.len(), 6);
    assert_eq!(sent.get("age"), Some(&FieldValue::int(52)));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_predict_delay(Duration::from_millis(500));
    let engine = FormStateEngine::new(Arc::new(schema()));
    let pipeline = SubmissionPipeline::with_timeout(backend.clone(), Duration::from_millis(50));

    let err = pipeline.submit(engine.state()).await.expect_err("too slow");

    assert_eq!(err, DeskError::Timeout(Duration::from_millis(50)));
    assert!(!pipeline.is_in_flight());
}

#[tokio::test]
async fn transport_failures_map_to_distinct_errors() {
    let backend = Arc::new(ScriptedBackend::default());
    let engine = FormStateEngine::new(Arc::new(schema()));
    let pipeline = pipeline(&backend);

    backend.set_prediction(Err(TransportError::Unreachable("connection refused".into())));
    let err = pipeline.submit(engine.state()).await.expect_err("unreachable");
    assert!(matches!(err, DeskError::Unreachable(_)));

    backend.set_prediction(Err(TransportError::Rejected {
        status: 400,
        detail: "Eksik alanlar: age".into(),
    }));
    let err = pipeline.submit(engine.state()).await.expect_err("rejected");
    assert_eq!(
        err,
        DeskError::RemoteRejected {
            status: Some(400),
            detail: "Eksik alanlar: age".into(),
        }
    );
}

#[tokio::test]
async fn second_submission_is_refused_while_first_is_pending() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_predict_delay(Duration::from_millis(100));
    let service = ready_service(&backend).await;

    let (first, second) = tokio::join!(service.submit(), service.submit());

    assert!(first.is_ok(), "first submission: {first:?}");
    assert_eq!(second.expect_err("refused"), DeskError::AlreadyInProgress);
    assert_eq!(backend.predict_count(), 1);
    assert_eq!(service.phase(), Phase::Ready);
}

#[tokio::test]
async fn timeout_leaves_form_editable_and_no_result() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_predict_delay(Duration::from_millis(500));
    let service = Arc::new(DeskService::new(backend.clone(), Duration::from_millis(50)));
    service.load_schema().await.expect("schema loads");

    let err = service.submit().await.expect_err("times out");

    assert!(matches!(err, DeskError::Timeout(_)));
    assert!(service.latest().is_none());
    assert_eq!(service.phase(), Phase::Ready);
    let view = service
        .set_field("age", Some(FieldValue::int(44)))
        .expect("form still editable");
    assert_eq!(view.values.get("age"), Some(&Some(FieldValue::int(44))));
    assert!(view.last_error.is_some());
}

#[tokio::test]
async fn previous_verdict_survives_local_errors_but_not_dispatch() {
    let backend = Arc::new(ScriptedBackend::default());
    let service = ready_service(&backend).await;

    service.submit().await.expect("first submission");
    assert!(service.latest().is_some());

    service
        .set_field("age", Some(FieldValue::int(17)))
        .expect("schema field");
    let err = service.submit().await.expect_err("age out of range");
    assert!(matches!(err, DeskError::Validation(_)));
    assert!(service.latest().is_some());

    service
        .set_field("age", Some(FieldValue::int(40)))
        .expect("schema field");
    backend.set_prediction(Err(TransportError::Unreachable("refused".into())));
    service.submit().await.expect_err("backend down");
    assert!(service.latest().is_none());
}

#[tokio::test]
async fn reset_cancels_submission_in_flight() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_predict_delay(Duration::from_millis(500));
    let service = ready_service(&backend).await;

    let (result, reset) = tokio::join!(service.submit(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        service.reset()
    });

    assert_eq!(result.expect_err("cancelled"), DeskError::Cancelled);
    assert!(reset.is_ok());
    assert!(service.latest().is_none());
    assert_eq!(service.phase(), Phase::Ready);

    backend.set_predict_delay(Duration::ZERO);
    service.submit().await.expect("slot released after cancel");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_reset_always_returns_to_ready() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_predict_delay(Duration::from_millis(1));
    let service = ready_service(&backend).await;

    for round in 0..50 {
        service
            .set_field("age", Some(FieldValue::int(61)))
            .expect("schema field");

        let submitting = {
            let service = service.clone();
            tokio::spawn(async move { service.submit().await })
        };
        let resetting = {
            let service = service.clone();
            tokio::spawn(async move { service.reset() })
        };

        let submitted = submitting.await.expect("submit task");
        resetting.await.expect("reset task").expect("form loaded");

        match submitted {
            Ok(_) | Err(DeskError::Cancelled) => {}
            Err(other) => panic!("round {round}: unexpected error {other:?}"),
        }
        assert_eq!(service.phase(), Phase::Ready, "round {round}");
    }

    service.submit().await.expect("slot released");
}

#[tokio::test]
async fn form_operations_need_a_schema() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_schema(Err(TransportError::Unreachable("refused".into())));
    let service = service_with(&backend);

    let err = service.load_schema().await.expect_err("schema down");
    assert!(matches!(err, DeskError::SchemaUnavailable(_)));
    assert_eq!(service.phase(), Phase::Uninitialized);
    assert_eq!(service.submit().await.expect_err("no form"), DeskError::NotReady);
    assert_eq!(service.reset().expect_err("no form"), DeskError::NotReady);

    backend.set_schema(Ok(schema()));
    service.load_schema().await.expect("retry succeeds");
    assert_eq!(service.phase(), Phase::Ready);
}

#[tokio::test]
async fn sample_failure_keeps_form_values() {
    let backend = Arc::new(ScriptedBackend::default());
    let service = ready_service(&backend).await;
    service
        .set_field("age", Some(FieldValue::int(61)))
        .expect("schema field");

    backend.set_sample(Err(TransportError::Timeout));
    let err = service.load_sample(true).await.expect_err("sample down");

    assert!(matches!(err, DeskError::SampleUnavailable(_)));
    let view = service.form_view().expect("ready");
    assert_eq!(view.values.get("age"), Some(&Some(FieldValue::int(61))));
    assert!(!view.has_ground_truth);
}

#[tokio::test]
async fn sample_without_label_tracks_nothing() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.set_prediction(Ok(prediction(20, RiskLevel::Low, Decision::Approve)));
    let service = ready_service(&backend).await;

    let view = service.load_sample(false).await.expect("sample loads");
    assert!(!view.has_ground_truth);

    let verdict = service.submit().await.expect("submits");
    assert_eq!(verdict.outcome, None);
}
