//! HTTP surface over the pipeline.
//!
//! - `GET /healthz`
//! - `POST /generate-question`
//! - `POST /evaluate-answer`
//! - `GET /schemas/{name}`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use interview_core::contracts::{EvaluationRequest, QuestionRequest};
use interview_core::generator::TextGenerator;
use interview_core::pipeline::{InterviewPipeline, PipelineError};
use interview_core::prompts::FsPromptStore;
use interview_core::schema::Document;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::adapters::gemini::GeminiGenerator;
use crate::config::LabConfig;
use crate::errors::LabError;

/// The pipeline as shared by every handler.
pub type SharedPipeline = Arc<InterviewPipeline<Arc<dyn TextGenerator>>>;

type PipelineFactory = dyn Fn() -> Result<SharedPipeline, LabError> + Send + Sync;

/// Handler state: a lazily built, process-lifetime pipeline.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<OnceCell<SharedPipeline>>,
    factory: Arc<PipelineFactory>,
}

impl AppState {
    /// State whose pipeline is built by `factory` on the first request that
    /// needs it. A failed build is retried by the next request.
    pub fn new(
        factory: impl Fn() -> Result<SharedPipeline, LabError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            pipeline: Arc::new(OnceCell::new()),
            factory: Arc::new(factory),
        }
    }

    /// State backed by Gemini and the prompt directory from `config`.
    #[must_use]
    pub fn from_config(config: LabConfig) -> Self {
        Self::new(move || {
            let generator: Arc<dyn TextGenerator> = Arc::new(GeminiGenerator::from_env()?);
            let pipeline = InterviewPipeline::new(
                generator,
                FsPromptStore::new(config.prompts_dir.clone()),
                config.pipeline_config(),
            )?;
            tracing::info!(
                event = "pipeline_ready",
                prompts_dir = %config.prompts_dir.display(),
                max_attempts = config.max_attempts,
                "pipeline_ready"
            );
            Ok(Arc::new(pipeline))
        })
    }

    /// The pipeline, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns whatever the factory failed with.
    pub async fn pipeline(&self) -> Result<SharedPipeline, LabError> {
        self.pipeline
            .get_or_try_init(|| async { (self.factory)() })
            .await
            .map(Arc::clone)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("initialized", &self.pipeline.initialized())
            .finish_non_exhaustive()
    }
}

/// Builds the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/generate-question", post(generate_question))
        .route("/evaluate-answer", post(evaluate_answer))
        .route("/schemas/:name", get(schema_document))
        .with_state(state)
}

/// Serves `router(state)` on `addr` until the process stops.
///
/// # Errors
///
/// Returns the I/O error of binding or serving.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(event = "server_listening", addr = %listener.local_addr()?, "server_listening");
    axum::serve(listener, router(state)).await
}

async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn generate_question(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, LabError> {
    let request = QuestionRequest::from_value(&body)?;
    let question = state.pipeline().await?.generate_question(&request).await?;
    Ok(Json(json!(question)))
}

async fn evaluate_answer(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, LabError> {
    let request = EvaluationRequest::from_value(&body)?;
    let evaluation = state.pipeline().await?.evaluate_answer(&request).await?;
    Ok(Json(json!(evaluation)))
}

async fn schema_document(Path(name): Path<String>) -> Result<Json<Value>, LabError> {
    Document::from_slug(&name)
        .map(|doc| Json(doc.render()))
        .ok_or(LabError::UnknownSchema(name))
}

impl IntoResponse for LabError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnknownSchema(_) => StatusCode::NOT_FOUND,
            Self::Pipeline(err) if err.is_upstream() => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Gemini(_) | Self::Pipeline(_) | Self::Schema(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut body = json!({"error": self.to_string()});
        match &self {
            Self::BadRequest(err) => {
                body["violations"] = json!(err.violations().unwrap_or_default());
            }
            Self::Pipeline(PipelineError::Exhausted { attempts, .. }) => {
                body["attempts"] = json!(attempts);
            }
            _ => {}
        }

        if status.is_server_error() {
            tracing::error!(event = "request_failed", status = status.as_u16(), error = %self, "request_failed");
        } else {
            tracing::warn!(event = "request_rejected", status = status.as_u16(), error = %self, "request_rejected");
        }
        (status, Json(body)).into_response()
    }
}
