use std::future::Future;
use std::pin::Pin;

use serde_json::{Value, json};
use thiserror::Error;

use super::conversation::{ChatMessage, Conversation};
use super::tools::Toolset;
use super::wire::{TOOL_EVALUATE_ITINERARY, TOOL_FINALIZE, parse_reply};
use crate::model::TravelPlan;
use crate::prompts::REVISION_SYSTEM_PROMPT;

/// Text generator for the next turn, given the conversation so far.
pub trait LlmClient: Send + Sync {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
pub struct ReviseConfig {
    /// Round budget; the only cancellation mechanism the loop has.
    pub max_rounds: usize,
    pub system_prompt: String,
}

impl Default for ReviseConfig {
    fn default() -> Self {
        Self {
            max_rounds: 15,
            system_prompt: REVISION_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("finalize is not allowed until evaluate_itinerary has been run and passed")]
    FinalizeNotAllowed,
}

/// Ordering gate over the single derived flag.
///
/// `finalize` is only legal after the most recent evaluation passed; every
/// evaluation result overwrites the flag, and a result that does not decode
/// to `passed: true` clears it.
#[derive(Debug, Clone, Default)]
pub struct FinalizeGate {
    has_passed: bool,
}

impl FinalizeGate {
    pub fn has_passed(&self) -> bool {
        self.has_passed
    }

    /// Rejection never alters the flag; it only refuses the action.
    pub fn check(&self, tool_name: &str) -> Result<(), GateError> {
        if tool_name == TOOL_FINALIZE && !self.has_passed {
            return Err(GateError::FinalizeNotAllowed);
        }
        Ok(())
    }

    pub fn note_evaluation(&mut self, observation: &Value) {
        self.has_passed = observation.get("passed").and_then(Value::as_bool) == Some(true);
    }
}

#[derive(Debug, Error)]
pub enum ReviseError {
    /// The agent claimed completion with a payload that does not decode or
    /// validate; not retryable within the same protocol.
    #[error("final itinerary payload invalid: {reason}")]
    FinalPayloadInvalid { reason: String, payload: Value },
    #[error("revision loop exceeded {max_rounds} rounds without a final plan")]
    LoopExceeded { max_rounds: usize },
    #[error(transparent)]
    Llm(#[from] anyhow::Error),
}

const EVALUATION_PASSED_NUDGE: &str =
    "Evaluation PASSED. You MUST now call finalize with the final itinerary JSON.";

/// Drives the revision loop until a legal, schema-valid `finalize` or until
/// the round budget runs out.
///
/// Recoverable within the loop (each consumes one round): parse failures,
/// gate rejections, unknown tools, and tool-execution errors — all recorded
/// as observations. Fatal: an invalid finalize payload, and budget
/// exhaustion.
pub async fn revise_itinerary(
    llm: &dyn LlmClient,
    tools: &Toolset,
    initial: &TravelPlan,
    cfg: &ReviseConfig,
) -> Result<TravelPlan, ReviseError> {
    let initial_json = serde_json::to_value(initial).unwrap_or_default();
    let weather_json = serde_json::to_value(tools.weather()).unwrap_or_default();
    let mut conversation = Conversation::seeded(&cfg.system_prompt, &initial_json, &weather_json);
    let mut gate = FinalizeGate::default();

    for round in 1..=cfg.max_rounds {
        let text = llm.complete(conversation.entries()).await?;

        let parsed = match parse_reply(&text) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(round, error = %err, "agent reply did not parse");
                conversation.push(ChatMessage::assistant(text));
                conversation
                    .push_observation_text(format!("Could not parse ACTION JSON: {err}"));
                continue;
            }
        };

        conversation.push(ChatMessage::assistant(parsed.canonical_text()));
        let tool_name = parsed.action.tool_name.trim().to_ascii_lowercase();

        if let Err(err) = gate.check(&tool_name) {
            tracing::debug!(round, tool = %tool_name, "gate rejected action");
            conversation.push_observation(&json!({ "error": err.to_string() }));
            continue;
        }

        let observation = tools.dispatch(&parsed.action);
        tracing::debug!(round, tool = %tool_name, "tool dispatched");
        conversation.push_observation(&observation);

        if tool_name == TOOL_EVALUATE_ITINERARY {
            gate.note_evaluation(&observation);
            if gate.has_passed() {
                conversation.push_observation_text(EVALUATION_PASSED_NUDGE);
            }
        }

        if tool_name == TOOL_FINALIZE {
            let payload = parsed
                .action
                .arguments
                .get("itinerary")
                .cloned()
                .unwrap_or(Value::Null);
            let plan = TravelPlan::from_validated_payload(&payload).map_err(|err| {
                ReviseError::FinalPayloadInvalid {
                    reason: err.to_string(),
                    payload: payload.clone(),
                }
            })?;
            tracing::info!(rounds = round, "revision loop finalized");
            return Ok(plan);
        }
    }

    Err(ReviseError::LoopExceeded {
        max_rounds: cfg.max_rounds,
    })
}
