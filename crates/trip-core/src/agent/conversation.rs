use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OBSERVATION_MARKER: &str = "OBSERVATION";

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only turn log. This is the loop's entire memory: nothing else is
/// carried between rounds except the derived pass flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    entries: Vec<ChatMessage>,
}

impl Conversation {
    /// Seeds the log the way every revision run starts: the system
    /// instructions, the initial itinerary, and the weather table.
    pub fn seeded(system_prompt: &str, initial_itinerary: &Value, weather: &Value) -> Self {
        let mut log = Self::default();
        log.push(ChatMessage::system(system_prompt));
        log.push(ChatMessage::user(format!(
            "Initial itinerary: {initial_itinerary}"
        )));
        log.push(ChatMessage::user(format!("Weather data: {weather}")));
        log
    }

    pub fn push(&mut self, entry: ChatMessage) {
        self.entries.push(entry);
    }

    /// Records a tool (or synthetic) observation as a user-role entry.
    pub fn push_observation(&mut self, observation: &Value) {
        self.push(ChatMessage::user(format!(
            "{OBSERVATION_MARKER}: {observation}"
        )));
    }

    /// Free-text observation, used for parse failures and nudges where the
    /// payload is prose rather than a tool result.
    pub fn push_observation_text(&mut self, text: impl AsRef<str>) {
        self.push(ChatMessage::user(format!(
            "{OBSERVATION_MARKER}: {}",
            text.as_ref()
        )));
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seeded_log_has_three_entries_in_order() {
        let log = Conversation::seeded("be helpful", &json!({"days": []}), &json!({}));
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[0].role, Role::System);
        assert_eq!(log.entries()[1].role, Role::User);
        assert!(log.entries()[1].content.starts_with("Initial itinerary:"));
        assert!(log.entries()[2].content.starts_with("Weather data:"));
    }

    #[test]
    fn observations_are_user_role_with_marker() {
        let mut log = Conversation::default();
        log.push_observation(&json!({"passed": true}));
        assert_eq!(log.entries()[0].role, Role::User);
        assert_eq!(log.entries()[0].content, "OBSERVATION: {\"passed\":true}");
    }

    #[test]
    fn roles_serialize_lowercase() {
        let msg = ChatMessage::assistant("hi");
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["role"], "assistant");
    }
}
