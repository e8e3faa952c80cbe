//! The bounded generate/validate/repair loop.

use serde_json::{json, Value};
use tokio::time::Instant;
use uuid::Uuid;

use super::config::PipelineConfig;
use super::error::{AttemptRecord, PipelineError};
use super::feedback::{parse_and_validate, Failure, RepairPayload};
use super::telemetry::{content_hash, preview, redacted};
use crate::contracts::{Contract, Evaluation, EvaluationRequest, Question, QuestionRequest};
use crate::generator::{CallMetadata, GenerationRequest, Stage, TextGenerator};
use crate::prompts::{PromptCache, PromptKey, PromptStore};
use crate::schema::schema_for;

/// Fragments are joined with a blank line between them.
const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Everything one invocation needs besides the pipeline itself.
struct Invocation {
    request_id: String,
    system_prompt: String,
    user_payload: Value,
    lane_hint: Option<String>,
}

/// One model call of an attempt.
struct Call<'a> {
    attempt: usize,
    stage: Stage,
    system_prompt: &'a str,
    user_prompt: String,
    temperature: f32,
}

/// Turns a [`TextGenerator`] into a source of validated contracts.
///
/// Every attempt issues a primary call; if its output is rejected, a repair
/// call follows with the rejection details. An attempt whose repair also
/// fails is discarded and the next one starts from a fresh primary call.
///
/// The pipeline holds no per-invocation state and can be shared across tasks.
pub struct InterviewPipeline<G> {
    generator: G,
    prompts: PromptCache,
    config: PipelineConfig,
}

impl<G: TextGenerator> InterviewPipeline<G> {
    /// Creates a pipeline over `generator`, reading fragments from `store`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when `max_attempts` is zero.
    pub fn new(
        generator: G,
        store: impl PromptStore + 'static,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        if config.max_attempts < 1 {
            return Err(PipelineError::InvalidConfig(
                "max_attempts must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            generator,
            prompts: PromptCache::new(store),
            config,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The prompt fragment cache.
    #[must_use]
    pub const fn prompts(&self) -> &PromptCache {
        &self.prompts
    }

    /// Generates one validated question.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Exhausted`] when no attempt produced a valid
    /// question, [`PipelineError::Provider`] when a call failed, and
    /// [`PipelineError::Prompt`] when a fragment is missing.
    pub async fn generate_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<Question, PipelineError> {
        let lane = PromptKey::Lane(request.track(), request.question_type());
        let system_prompt = self
            .compose(&[PromptKey::GENERATOR_BASE, lane.clone(), PromptKey::JSON_RULES])
            .await?;

        let mut user_payload = json!({
            "track": request.track(),
            "question_type": request.question_type(),
            "difficulty": request.difficulty(),
        });
        if let (Some(style), Value::Object(object)) = (request.style(), &mut user_payload) {
            object.insert("style".to_string(), Value::from(style.as_str()));
        }

        self.run_with_repair(Invocation {
            request_id: Uuid::new_v4().to_string(),
            system_prompt,
            user_payload,
            lane_hint: Some(lane.to_string()),
        })
        .await
    }

    /// Grades one candidate answer.
    ///
    /// # Errors
    ///
    /// Same as [`generate_question`](Self::generate_question).
    pub async fn evaluate_answer(
        &self,
        request: &EvaluationRequest,
    ) -> Result<Evaluation, PipelineError> {
        let system_prompt = self
            .compose(&[PromptKey::EVALUATOR_BASE, PromptKey::JSON_RULES])
            .await?;

        let mut user_payload = json!({
            "question_json": request.question_json(),
            "candidate_answer": request.candidate_answer(),
        });
        if let (Some(summary), Value::Object(object)) =
            (request.validator_summary(), &mut user_payload)
        {
            object.insert(
                "validator_summary".to_string(),
                Value::Object(summary.clone()),
            );
        }

        self.run_with_repair(Invocation {
            request_id: Uuid::new_v4().to_string(),
            system_prompt,
            user_payload,
            lane_hint: None,
        })
        .await
    }

    async fn compose(&self, keys: &[PromptKey]) -> Result<String, PipelineError> {
        let mut fragments = Vec::with_capacity(keys.len());
        for key in keys {
            fragments.push(self.prompts.get(key).await?);
        }
        Ok(fragments.join(FRAGMENT_SEPARATOR))
    }

    async fn run_with_repair<C: Contract>(
        &self,
        invocation: Invocation,
    ) -> Result<C, PipelineError> {
        let kind = C::KIND;
        let start = Instant::now();
        let max_attempts = self.config.max_attempts;
        let system_prompt_hash = content_hash(&invocation.system_prompt);
        let user_prompt = invocation.user_payload.to_string();
        let mut history: Vec<AttemptRecord> = Vec::new();

        tracing::info!(
            event = "pipeline_start",
            request_id = %invocation.request_id,
            target = %kind,
            max_attempts,
            system_prompt_hash = %system_prompt_hash,
            lane_hint = invocation.lane_hint.as_deref().unwrap_or(""),
            user_payload_preview = %redacted(&invocation.user_payload),
            "pipeline_start"
        );

        for attempt in 1..=max_attempts {
            let raw_output = self
                .call::<C>(
                    &invocation,
                    Call {
                        attempt,
                        stage: Stage::Primary,
                        system_prompt: &invocation.system_prompt,
                        user_prompt: user_prompt.clone(),
                        temperature: self.config.primary_temperature,
                    },
                )
                .await?;

            let failure = match parse_and_validate::<C>(&raw_output) {
                Ok(contract) => {
                    return Ok(succeed(&invocation, attempt, Stage::Primary, contract));
                }
                Err(failure) => failure,
            };
            self.reject::<C>(&invocation, &mut history, attempt, Stage::Primary, &failure, start);

            let repair_system_prompt = self.prompts.get(&PromptKey::JSON_REPAIR).await?;
            let mut payload = RepairPayload::new(kind, &raw_output, &failure);
            if self.config.include_json_schema_in_repair {
                payload = payload.with_schema(schema_for(kind));
            }

            let repair_output = self
                .call::<C>(
                    &invocation,
                    Call {
                        attempt,
                        stage: Stage::Repair,
                        system_prompt: &repair_system_prompt,
                        user_prompt: json!(payload).to_string(),
                        temperature: self.config.repair_temperature,
                    },
                )
                .await?;

            match parse_and_validate::<C>(&repair_output) {
                Ok(contract) => {
                    return Ok(succeed(&invocation, attempt, Stage::Repair, contract));
                }
                Err(failure) => {
                    self.reject::<C>(&invocation, &mut history, attempt, Stage::Repair, &failure, start);
                }
            }
        }

        let last_error = history
            .last()
            .map_or_else(|| "unknown error".to_string(), describe);

        tracing::error!(
            event = "pipeline_exhausted",
            request_id = %invocation.request_id,
            target = %kind,
            attempts = max_attempts,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            last_error = %last_error,
            "pipeline_exhausted"
        );

        Err(PipelineError::Exhausted {
            target: kind,
            attempts: max_attempts,
            last_error,
            history,
        })
    }

    async fn call<C: Contract>(
        &self,
        invocation: &Invocation,
        call: Call<'_>,
    ) -> Result<String, PipelineError> {
        let kind = C::KIND;
        let metadata = CallMetadata {
            request_id: invocation.request_id.clone(),
            target: kind,
            attempt: call.attempt,
            stage: call.stage,
            system_prompt_hash: content_hash(call.system_prompt),
            payload_hash: content_hash(&call.user_prompt),
            lane_hint: invocation.lane_hint.clone(),
            target_schema_name: kind.schema_name(),
            json_only: self.config.request_json_only,
        };

        let output = self
            .generator
            .generate(GenerationRequest {
                system_prompt: call.system_prompt.to_string(),
                user_prompt: call.user_prompt,
                temperature: Some(call.temperature),
                metadata: metadata.clone(),
            })
            .await
            .map_err(|source| {
                tracing::error!(
                    event = "pipeline_provider_error",
                    request_id = %invocation.request_id,
                    target = %kind,
                    attempt = call.attempt,
                    stage = %call.stage,
                    error = %source,
                    "pipeline_provider_error"
                );
                PipelineError::Provider {
                    target: kind,
                    attempt: call.attempt,
                    stage: call.stage,
                    source,
                }
            })?;

        tracing::info!(
            event = "pipeline_response",
            request_id = %metadata.request_id,
            target = %kind,
            attempt = call.attempt,
            stage = %call.stage,
            system_prompt_hash = %metadata.system_prompt_hash,
            payload_hash = %metadata.payload_hash,
            raw_output_preview = %preview(&output, self.config.max_output_preview_chars),
            "pipeline_response"
        );

        Ok(output)
    }

    fn reject<C: Contract>(
        &self,
        invocation: &Invocation,
        history: &mut Vec<AttemptRecord>,
        attempt: usize,
        stage: Stage,
        failure: &Failure,
        start: Instant,
    ) {
        tracing::warn!(
            event = "pipeline_invalid",
            request_id = %invocation.request_id,
            target = %C::KIND,
            attempt,
            stage = %stage,
            error_kind = %failure.kind,
            error = %preview(&failure.message, self.config.max_output_preview_chars),
            "pipeline_invalid"
        );
        history.push(AttemptRecord {
            attempt,
            stage,
            failure_kind: failure.kind,
            message: failure.message.clone(),
            elapsed: start.elapsed(),
        });
    }
}

fn succeed<C: Contract>(invocation: &Invocation, attempt: usize, stage: Stage, contract: C) -> C {
    tracing::info!(
        event = "pipeline_success",
        request_id = %invocation.request_id,
        target = %C::KIND,
        attempt,
        stage = %stage,
        "pipeline_success"
    );
    contract
}

fn describe(record: &AttemptRecord) -> String {
    format!("{} failed [{}]: {}", record.stage, record.failure_kind, record.message)
}

impl<G> std::fmt::Debug for InterviewPipeline<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewPipeline")
            .field("prompts", &self.prompts)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
