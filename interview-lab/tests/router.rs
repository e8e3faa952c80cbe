use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use interview_core::generator::{GenerationRequest, ProviderError, TextGenerator};
use interview_core::pipeline::{InterviewPipeline, PipelineConfig};
use interview_core::prompts::FsPromptStore;
use interview_lab::errors::LabError;
use interview_lab::server::{router, AppState, SharedPipeline};
use serde_json::{json, Value};
use tower::ServiceExt;

struct ScriptedGenerator {
    outputs: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn new(outputs: impl IntoIterator<Item = String>) -> Arc<Self> {
        Arc::new(Self {
            outputs: Mutex::new(outputs.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::new("script exhausted"))
    }
}

fn prompts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../prompts")
}

/// State over `generator`, counting how often the pipeline is built.
fn state(generator: &Arc<ScriptedGenerator>, builds: &Arc<AtomicUsize>) -> AppState {
    let generator = Arc::clone(generator);
    let builds = Arc::clone(builds);
    AppState::new(move || {
        builds.fetch_add(1, Ordering::SeqCst);
        let shared: Arc<dyn TextGenerator> = generator.clone();
        let pipeline = InterviewPipeline::new(
            shared,
            FsPromptStore::new(prompts_dir()),
            PipelineConfig::default().with_max_attempts(1),
        )?;
        Ok::<SharedPipeline, LabError>(Arc::new(pipeline))
    })
}

async fn send(state: AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn theory_question() -> Value {
    json!({
        "track": "backend",
        "question_type": "theory",
        "difficulty": 2,
        "question": "How does a connection pool protect a database under load?",
        "expected_points": [
            "Bounds concurrent connections",
            "Reuses established connections",
            "Queues or rejects excess demand",
            "Sizing relative to database limits",
            "Timeouts on checkout",
            "Health checks for stale connections"
        ],
        "followups": [
            "How would you size the pool?",
            "What happens when checkout times out?",
            "How do pools interact with serverless functions?"
        ],
        "red_flags": [
            "Opens a connection per query without limits",
            "Sets pool size to the thread count by default",
            "Never mentions timeouts"
        ]
    })
}

fn evaluation() -> Value {
    json!({
        "score": 64,
        "strengths": ["Explains reuse"],
        "missing_points": ["No checkout timeouts"],
        "incorrect_points": [],
        "ideal_answer": "A pool caps and reuses connections and fails fast when saturated.",
        "improvement_tips": ["Talk about sizing"],
        "clarifying_questions": [],
        "followup_question": "How would you size the pool for a bursty workload?"
    })
}

fn question_body() -> Value {
    json!({"track": "backend", "question_type": "theory", "difficulty": 2})
}

#[tokio::test]
async fn test_healthz() {
    let generator = ScriptedGenerator::new(Vec::new());
    let builds = Arc::new(AtomicUsize::new(0));

    let (status, body) = send(state(&generator, &builds), Method::GET, "/healthz", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    assert_eq!(builds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generate_question_returns_the_validated_contract() {
    let generator = ScriptedGenerator::new([format!("```json\n{}\n```", theory_question())]);
    let builds = Arc::new(AtomicUsize::new(0));

    let (status, body) = send(
        state(&generator, &builds),
        Method::POST,
        "/generate-question",
        Some(question_body()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["track"], "backend");
    assert_eq!(body["expected_points"].as_array().unwrap().len(), 6);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_bad_request_is_rejected_before_any_call() {
    let generator = ScriptedGenerator::new(Vec::new());
    let builds = Arc::new(AtomicUsize::new(0));

    let (status, body) = send(
        state(&generator, &builds),
        Method::POST,
        "/generate-question",
        Some(json!({"track": "backend", "question_type": "theory", "difficulty": 9})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let violations = body["violations"].as_array().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["path"], "difficulty");
    assert_eq!(violations[0]["rule"], "range");
    assert_eq!(builds.load(Ordering::SeqCst), 0);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_unknown_request_key_is_a_bad_request() {
    let generator = ScriptedGenerator::new(Vec::new());
    let builds = Arc::new(AtomicUsize::new(0));

    let mut body = question_body();
    body["seniority"] = json!("staff");
    let (status, _) = send(state(&generator, &builds), Method::POST, "/generate-question", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_exhausted_pipeline_is_bad_gateway() {
    let generator = ScriptedGenerator::new(["not json".to_string(), "still not json".to_string()]);
    let builds = Arc::new(AtomicUsize::new(0));

    let (status, body) = send(
        state(&generator, &builds),
        Method::POST,
        "/generate-question",
        Some(question_body()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["attempts"], 1);
    assert!(body["error"].as_str().unwrap().contains("decode"));
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway() {
    let generator = ScriptedGenerator::new(Vec::new());
    let builds = Arc::new(AtomicUsize::new(0));

    let (status, body) = send(
        state(&generator, &builds),
        Method::POST,
        "/generate-question",
        Some(question_body()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("script exhausted"));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_evaluate_answer() {
    let generator = ScriptedGenerator::new([evaluation().to_string()]);
    let builds = Arc::new(AtomicUsize::new(0));

    let (status, body) = send(
        state(&generator, &builds),
        Method::POST,
        "/evaluate-answer",
        Some(json!({
            "question_json": theory_question(),
            "candidate_answer": "It keeps connections open and reuses them."
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 64);
    assert_eq!(
        body["followup_question"],
        "How would you size the pool for a bursty workload?"
    );
}

#[tokio::test]
async fn test_blank_answer_is_a_bad_request() {
    let generator = ScriptedGenerator::new(Vec::new());
    let builds = Arc::new(AtomicUsize::new(0));

    let (status, body) = send(
        state(&generator, &builds),
        Method::POST,
        "/evaluate-answer",
        Some(json!({"question_json": theory_question(), "candidate_answer": "   "})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["violations"][0]["path"], "candidate_answer");
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_schema_documents() {
    let generator = ScriptedGenerator::new(Vec::new());
    let builds = Arc::new(AtomicUsize::new(0));
    let app = state(&generator, &builds);

    let (status, body) = send(app.clone(), Method::GET, "/schemas/question", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "QuestionJSON");

    let (status, body) = send(app.clone(), Method::GET, "/schemas/evaluation-request", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["properties"]["candidate_answer"].is_object());

    let (status, _) = send(app, Method::GET, "/schemas/answers", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pipeline_construction_failure_is_internal_error() {
    let app = AppState::new(|| Err(LabError::Config("GEMINI_API_KEY is not set".to_string())));

    let (status, body) = send(app, Method::POST, "/generate-question", Some(question_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("GEMINI_API_KEY"));
}

#[tokio::test]
async fn test_pipeline_is_built_once() {
    let generator = ScriptedGenerator::new([theory_question().to_string(), evaluation().to_string()]);
    let builds = Arc::new(AtomicUsize::new(0));
    let app = state(&generator, &builds);

    let (status, _) = send(app.clone(), Method::POST, "/generate-question", Some(question_body())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        app.clone(),
        Method::POST,
        "/evaluate-answer",
        Some(json!({"question_json": theory_question(), "candidate_answer": "Reuse."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(app.pipeline().await.is_ok());
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}
