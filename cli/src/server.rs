#[cfg(feature = "server")]
pub mod http {
    use axum::{
        extract::{rejection::JsonRejection, State},
        http::StatusCode,
        response::{IntoResponse, Json},
        routing::{get, post},
        Router,
    };
    use serde::{Deserialize, Serialize};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tower_http::cors::CorsLayer;
    use tracing::{error, info};
    use triage::{clinical, Engine, Facts, Response};

    /// One engine per stage: presence diagnosis, then severity grading
    pub struct Engines {
        pub diagnosis: Engine,
        pub grading: Engine,
    }

    type SharedEngines = Arc<Engines>;

    #[derive(Debug, Deserialize)]
    struct EvaluateRequest {
        #[serde(default)]
        facts: Facts,
        /// Compute hr_no_fever and pulse_pressure from raw vitals first
        #[serde(default)]
        derive_vitals: Option<bool>,
    }

    #[derive(Debug, Serialize)]
    struct EvaluateResponse {
        #[serde(flatten)]
        response: Response,
        explanation: String,
    }

    #[derive(Debug, Serialize)]
    struct ErrorResponse {
        error: String,
    }

    type ApiError = (StatusCode, Json<ErrorResponse>);

    pub async fn start_server(
        diagnosis: Engine,
        grading: Engine,
        host: &str,
        port: u16,
    ) -> anyhow::Result<()> {
        let app = router(Engines { diagnosis, grading });

        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        info!("Triage server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    pub fn router(engines: Engines) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/api/diagnose", post(diagnose))
            .route("/api/classify", post(classify))
            .route("/api/stats", get(stats))
            .layer(CorsLayer::permissive())
            .with_state(Arc::new(engines))
    }

    async fn health_check() -> impl IntoResponse {
        Json(serde_json::json!({
            "status": "ok",
            "service": "triage",
            "version": env!("CARGO_PKG_VERSION")
        }))
    }

    async fn diagnose(
        State(engines): State<SharedEngines>,
        payload: Result<Json<EvaluateRequest>, JsonRejection>,
    ) -> Result<Json<EvaluateResponse>, ApiError> {
        evaluate(&engines.diagnosis, payload, false)
    }

    async fn classify(
        State(engines): State<SharedEngines>,
        payload: Result<Json<EvaluateRequest>, JsonRejection>,
    ) -> Result<Json<EvaluateResponse>, ApiError> {
        evaluate(&engines.grading, payload, true)
    }

    fn evaluate(
        engine: &Engine,
        payload: Result<Json<EvaluateRequest>, JsonRejection>,
        derive_vitals_by_default: bool,
    ) -> Result<Json<EvaluateResponse>, ApiError> {
        let Json(request) = payload.map_err(|rejection| {
            error!("Rejected request body: {}", rejection.body_text());
            (
                rejection.status(),
                Json(ErrorResponse {
                    error: format!("Invalid request: {}", rejection.body_text()),
                }),
            )
        })?;

        let mut facts = request.facts;
        if request.derive_vitals.unwrap_or(derive_vitals_by_default) {
            clinical::augment_vitals(&mut facts);
        }

        let response = engine.evaluate(&facts);
        info!(
            "Evaluated {} facts against '{}': {}",
            facts.len(),
            response.rule_set,
            response.category
        );

        let explanation = response.explain(false);
        Ok(Json(EvaluateResponse {
            response,
            explanation,
        }))
    }

    async fn stats(State(engines): State<SharedEngines>) -> impl IntoResponse {
        Json(serde_json::json!({
            "diagnosis": engines.diagnosis.statistics(),
            "grading": engines.grading.statistics(),
        }))
    }

}

#[cfg(not(feature = "server"))]
pub mod http {
    pub async fn start_server(
        _diagnosis: triage::Engine,
        _grading: triage::Engine,
        _host: &str,
        _port: u16,
    ) -> anyhow::Result<()> {
        anyhow::bail!("Server feature not enabled. Recompile with --features server")
    }
}
