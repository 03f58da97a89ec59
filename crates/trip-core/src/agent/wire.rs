use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const THOUGHT_MARKER: &str = "THOUGHT";
pub const ACTION_MARKER: &str = "ACTION";

pub const TOOL_LOOKUP_ACTIVITIES: &str = "lookup_activities";
pub const TOOL_EVALUATE_ITINERARY: &str = "evaluate_itinerary";
pub const TOOL_EVALUATE_EXPRESSION: &str = "evaluate_expression";
pub const TOOL_FINALIZE: &str = "finalize";

/// Raw action as it appears on the wire:
/// `{"tool_name": "<name>", "arguments": {...}}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ActionWire {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplyParseError {
    #[error("reply was empty")]
    EmptyReply,
    #[error("could not find an ACTION JSON object in the reply")]
    MissingActionJson,
    #[error("ACTION JSON invalid: {message}; substring: {snippet}")]
    InvalidJson { message: String, snippet: String },
    #[error("ACTION JSON is not a tool action: {message}")]
    NotAnAction { message: String },
}

/// One agent reply, split into its reasoning note and its action.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub thought: String,
    pub action: ActionWire,
}

impl ParsedReply {
    /// The canonical assistant-entry text recorded in the conversation:
    /// the thought and a re-serialized action, not the raw reply.
    pub fn canonical_text(&self) -> String {
        let action = serde_json::to_string(&self.action).unwrap_or_else(|_| "{}".to_string());
        format!("{THOUGHT_MARKER}: {}\n{ACTION_MARKER}: {}", self.thought, action)
    }
}

/// ASCII-case-insensitive substring search. Markers are plain ASCII, so
/// byte offsets returned here are always char boundaries.
fn find_marker(text: &str, marker: &str) -> Option<usize> {
    let t = text.as_bytes();
    let m = marker.as_bytes();
    if m.is_empty() || t.len() < m.len() {
        return None;
    }
    (0..=t.len() - m.len()).find(|&i| t[i..i + m.len()].eq_ignore_ascii_case(m))
}

/// Returns the first balanced JSON object starting at the first `{` at or
/// after `from`, tracking brace depth so nested argument objects are kept
/// whole rather than truncated at the first `}`.
pub fn find_balanced_json(text: &str, from: usize) -> Option<&str> {
    let rel = text[from..].find('{')?;
    let start = from + rel;
    let mut depth = 0usize;
    for (i, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn extract_thought(text: &str, action_at: Option<usize>) -> String {
    if let (Some(thought_at), Some(action_at)) = (find_marker(text, THOUGHT_MARKER), action_at) {
        let after = thought_at + THOUGHT_MARKER.len();
        if after <= action_at {
            let body = text[after..action_at].trim_start();
            let body = body.strip_prefix(':').unwrap_or(body);
            return body.trim().to_string();
        }
    }
    // No explicit markers in the expected order: take the first line.
    text.lines().next().unwrap_or("").trim().to_string()
}

fn snippet(s: &str) -> String {
    s.chars().take(200).collect()
}

/// Parses a full agent reply into `{thought, action}`.
///
/// Extraction rule: the first balanced JSON object after the `ACTION`
/// marker; if the marker is missing (or nothing balanced follows it), the
/// first balanced object anywhere in the text. The thought is the text
/// between the `THOUGHT` and `ACTION` markers, falling back to the first
/// line.
pub fn parse_reply(text: &str) -> Result<ParsedReply, ReplyParseError> {
    let t = text.trim();
    if t.is_empty() {
        return Err(ReplyParseError::EmptyReply);
    }

    let action_at = find_marker(t, ACTION_MARKER);
    let json_sub = action_at
        .and_then(|at| find_balanced_json(t, at))
        .or_else(|| find_balanced_json(t, 0))
        .ok_or(ReplyParseError::MissingActionJson)?;

    let value: serde_json::Value =
        serde_json::from_str(json_sub).map_err(|e| ReplyParseError::InvalidJson {
            message: e.to_string(),
            snippet: snippet(json_sub),
        })?;
    let action: ActionWire =
        serde_json::from_value(value).map_err(|e| ReplyParseError::NotAnAction {
            message: e.to_string(),
        })?;

    Ok(ParsedReply {
        thought: extract_thought(t, action_at),
        action,
    })
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LookupActivitiesArgs {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EvaluateItineraryArgs {
    pub itinerary: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EvaluateExpressionArgs {
    pub expression: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FinalizeArgs {
    /// Absent payloads stay `Null` here: finalize must always dispatch, and
    /// the loop driver decides whether the payload is fatal.
    #[serde(default)]
    pub itinerary: serde_json::Value,
}

/// Typed action, one variant per registered tool plus a catch-all so the
/// dispatcher can match exhaustively instead of probing argument keys.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    LookupActivities(LookupActivitiesArgs),
    EvaluateItinerary(EvaluateItineraryArgs),
    EvaluateExpression(EvaluateExpressionArgs),
    Finalize(FinalizeArgs),
    Unrecognized {
        name: String,
        arguments: serde_json::Value,
    },
}

impl ToolCall {
    pub fn name(&self) -> &str {
        match self {
            ToolCall::LookupActivities(_) => TOOL_LOOKUP_ACTIVITIES,
            ToolCall::EvaluateItinerary(_) => TOOL_EVALUATE_ITINERARY,
            ToolCall::EvaluateExpression(_) => TOOL_EVALUATE_EXPRESSION,
            ToolCall::Finalize(_) => TOOL_FINALIZE,
            ToolCall::Unrecognized { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid arguments for {tool}: {message}")]
pub struct InvalidArguments {
    pub tool: &'static str,
    pub message: String,
}

fn parse_args<T: DeserializeOwned>(
    val: serde_json::Value,
    tool: &'static str,
) -> Result<T, InvalidArguments> {
    serde_json::from_value::<T>(val).map_err(|e| InvalidArguments {
        tool,
        message: e.to_string(),
    })
}

impl TryFrom<ActionWire> for ToolCall {
    type Error = InvalidArguments;

    fn try_from(wire: ActionWire) -> Result<Self, Self::Error> {
        let name = wire.tool_name.trim().to_ascii_lowercase();
        match name.as_str() {
            TOOL_LOOKUP_ACTIVITIES => Ok(ToolCall::LookupActivities(parse_args(
                wire.arguments,
                TOOL_LOOKUP_ACTIVITIES,
            )?)),
            TOOL_EVALUATE_ITINERARY => Ok(ToolCall::EvaluateItinerary(parse_args(
                wire.arguments,
                TOOL_EVALUATE_ITINERARY,
            )?)),
            TOOL_EVALUATE_EXPRESSION => Ok(ToolCall::EvaluateExpression(parse_args(
                wire.arguments,
                TOOL_EVALUATE_EXPRESSION,
            )?)),
            TOOL_FINALIZE => Ok(ToolCall::Finalize(parse_args(
                wire.arguments,
                TOOL_FINALIZE,
            )?)),
            _ => Ok(ToolCall::Unrecognized {
                name: wire.tool_name,
                arguments: wire.arguments,
            }),
        }
    }
}
