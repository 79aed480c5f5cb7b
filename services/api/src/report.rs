use crate::cli::PredictArgs;
use crate::infra::build_backend;
use credit_desk::config::DeskConfig;
use credit_desk::desk::{
    health, BackendStatus, DeskError, DeskService, FeatureSchema, FormView, HealthSnapshot,
    PerformanceReport, TierAlignment, Verdict,
};
use credit_desk::error::AppError;

pub(crate) async fn run_schema(config: &DeskConfig) -> Result<(), AppError> {
    let desk = DeskService::new(build_backend(&config.backend)?, config.backend.submit_timeout);
    let schema = desk.load_schema().await?;
    print!("{}", render_schema(&schema));
    Ok(())
}

pub(crate) async fn run_predict(config: &DeskConfig, args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs {
        sample,
        with_label,
        assignments,
    } = args;

    let desk = DeskService::new(build_backend(&config.backend)?, config.backend.submit_timeout);
    desk.load_schema().await?;
    if sample {
        desk.load_sample(with_label).await?;
    }
    for (field, value) in &assignments {
        desk.set_field_input(field, value)?;
    }

    let view = desk.form_view()?;
    print!("{}", render_form(&view));

    let verdict = desk.submit().await?;
    print!("{}", render_verdict(&verdict));
    Ok(())
}

pub(crate) async fn run_performance(config: &DeskConfig) -> Result<(), AppError> {
    let desk = DeskService::new(build_backend(&config.backend)?, config.backend.submit_timeout);
    let report = desk.performance().await?;
    print!("{}", render_performance(&report));
    Ok(())
}

pub(crate) async fn run_health(config: &DeskConfig) -> Result<(), AppError> {
    let backend = build_backend(&config.backend)?;
    let snapshot = health::probe(backend.as_ref()).await;
    print!("{}", render_health(&config.backend.base_url, &snapshot));
    match snapshot.status {
        BackendStatus::Connected => Ok(()),
        _ => Err(AppError::Desk(DeskError::Unreachable(
            snapshot.detail.unwrap_or_else(|| "no response".to_string()),
        ))),
    }
}

pub(crate) fn render_schema(schema: &FeatureSchema) -> String {
    let mut out = format!("Feature schema ({} fields)\n", schema.field_names().len());
    out.push_str("Numeric:\n");
    for field in &schema.numeric_features {
        out.push_str(&format!("  - {field}\n"));
    }
    out.push_str("Categorical:\n");
    for (field, feature) in &schema.categorical_features {
        out.push_str(&format!("  - {field}: {}\n", feature.allowed_values.join(" | ")));
    }
    out
}

pub(crate) fn render_form(view: &FormView) -> String {
    let mut out = format!("Application ({}% complete)\n", view.completion);
    for descriptor in &view.fields {
        let value = view
            .values
            .get(&descriptor.name)
            .and_then(Option::as_ref)
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        match view.errors.get(&descriptor.name) {
            Some(error) => out.push_str(&format!("  {}: {} [{}]\n", descriptor.label, value, error)),
            None => out.push_str(&format!("  {}: {}\n", descriptor.label, value)),
        }
    }
    out
}

pub(crate) fn render_verdict(verdict: &Verdict) -> String {
    let prediction = &verdict.prediction;
    let mut out = format!("\nDecision: {}\n", prediction.decision);
    out.push_str(&format!(
        "- Risk score {} / 100 ({:.1}% default probability, level {})\n",
        prediction.risk_score,
        prediction.risk_probability * 100.0,
        prediction.risk_level.label()
    ));
    out.push_str(&format!("- Tier: {}\n", verdict.tier.label));
    if verdict.alignment == TierAlignment::Diverges {
        out.push_str(&format!(
            "  note: the score tier leans {} but the service decided {}\n",
            verdict.tier.band.leaning(),
            prediction.decision
        ));
    }
    if let Some(explanation) = &prediction.explanation {
        out.push_str(&format!("- Explanation: {explanation}\n"));
    }
    if let (Some(label), Some(outcome)) = (&verdict.actual_label, verdict.outcome) {
        out.push_str(&format!("- Recorded outcome: {label} -> {}\n", outcome.summary()));
    }
    out
}

pub(crate) fn render_performance(report: &PerformanceReport) -> String {
    let metrics = &report.metrics;
    let confusion = &report.confusion;
    let mut out = format!("Model performance ({})\n", report.dataset_info);
    out.push_str(&format!(
        "- Accuracy {:.1}% | Precision {:.1}% | Recall {:.1}% | F1 {:.1}%\n",
        metrics.accuracy * 100.0,
        metrics.precision * 100.0,
        metrics.recall * 100.0,
        metrics.f1 * 100.0
    ));
    out.push_str(&format!("Confusion matrix ({} test cases):\n", confusion.total));
    out.push_str(&format!(
        "  - true negatives {} | false positives {}\n",
        confusion.true_negative, confusion.false_positive
    ));
    out.push_str(&format!(
        "  - false negatives {} | true positives {}\n",
        confusion.false_negative, confusion.true_positive
    ));
    out
}

pub(crate) fn render_health(base_url: &str, snapshot: &HealthSnapshot) -> String {
    let status = match snapshot.status {
        BackendStatus::Checking => "checking",
        BackendStatus::Connected => "connected",
        BackendStatus::Disconnected => "disconnected",
    };
    let mut out = format!("Scoring service {base_url}: {status}");
    match snapshot.model_trained {
        Some(true) => out.push_str(" (model trained)"),
        Some(false) => out.push_str(" (model not trained)"),
        None => {}
    }
    if let Some(checked_at) = snapshot.checked_at {
        out.push_str(&format!(" at {}", checked_at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if let Some(detail) = &snapshot.detail {
        out.push_str(&format!("\n  {detail}"));
    }
    out.push('\n');
    out
}
