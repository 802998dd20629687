use serde::{Deserialize, Serialize};

use crate::core::ports::llm::ChatMessage;

/// Append-only message log seen from one model's point of view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    pub fn with_system(prompt: &str) -> Self {
        Self {
            messages: vec![ChatMessage::system(prompt)],
        }
    }

    pub fn push_user(&mut self, content: &str) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.messages.push(ChatMessage::assistant(content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ConversationHistory;
    use crate::core::ports::llm::Role;

    #[test]
    fn appends_keep_order_after_system_prompt() {
        let mut history = ConversationHistory::with_system("be human");
        history.push_user("where did you grow up?");
        history.push_assistant("a small town by the sea");

        let roles = history
            .messages()
            .iter()
            .map(|m| m.role)
            .collect::<Vec<_>>();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn serializes_as_plain_message_array() {
        let mut history = ConversationHistory::with_system("rules");
        history.push_assistant("first question");
        let value = serde_json::to_value(&history).expect("serialize");
        let items = value.as_array().expect("array");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["role"], "assistant");

        let back: ConversationHistory = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, history);
    }
}
