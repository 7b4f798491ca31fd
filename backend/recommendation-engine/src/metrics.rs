use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, TextEncoder};

static EVENTS_RECORDED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "recommendation_engine_events_recorded_total",
            "Catalogue and interaction events appended to the event store",
        ),
        &["kind", "status"],
    )
    .expect("failed to create recommendation_engine_events_recorded_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register recommendation_engine_events_recorded_total");
    counter
});

static TRAINING_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "recommendation_engine_training_runs_total",
            "Recommender training runs by outcome",
        ),
        &["model", "outcome"],
    )
    .expect("failed to create recommendation_engine_training_runs_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register recommendation_engine_training_runs_total");
    counter
});

static TRAINING_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "recommendation_engine_training_duration_seconds",
            "Wall time of successful recommender training runs",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0]),
        &["model"],
    )
    .expect("failed to create recommendation_engine_training_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register recommendation_engine_training_duration_seconds");
    histogram
});

static RECOMMENDATIONS_SERVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "recommendation_engine_recommendations_served_total",
            "Recommendation queries answered, split by whether any product was returned",
        ),
        &["model", "result"],
    )
    .expect("failed to create recommendation_engine_recommendations_served_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register recommendation_engine_recommendations_served_total");
    counter
});

pub fn record_event(kind: &str, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    EVENTS_RECORDED_TOTAL.with_label_values(&[kind, status]).inc();
}

pub fn record_training(model: &str, outcome: &str, elapsed_secs: Option<f64>) {
    TRAINING_RUNS_TOTAL.with_label_values(&[model, outcome]).inc();
    if let Some(secs) = elapsed_secs {
        TRAINING_DURATION_SECONDS
            .with_label_values(&[model])
            .observe(secs);
    }
}

pub fn record_recommendation(model: &str, returned: usize) {
    let result = if returned == 0 { "empty" } else { "hit" };
    RECOMMENDATIONS_SERVED_TOTAL
        .with_label_values(&[model, result])
        .inc();
}

pub async fn metrics_handler() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
