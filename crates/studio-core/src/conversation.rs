use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

/// Optional tag rendered differently by front ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    BrowserAction,
}

/// A single chat entry. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,
}

/// Append-only conversation log
///
/// Ids are handed out from a counter so two messages appended within the
/// same millisecond still get distinct, increasing ids.
#[derive(Debug, Default, Serialize)]
pub struct ConversationLog {
    messages: Vec<Message>,
    #[serde(skip)]
    next_id: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end and return a reference to it
    pub fn append(
        &mut self,
        text: impl Into<String>,
        sender: Sender,
        kind: Option<MessageKind>,
    ) -> &Message {
        self.next_id += 1;
        let message = Message {
            id: self.next_id,
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            kind,
        };
        tracing::debug!(id = message.id, ?sender, "Appending message");
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Messages in insertion order
    pub fn list(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: u64) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn count_by(&self, sender: Sender) -> usize {
        self.messages.iter().filter(|m| m.sender == sender).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_insertion_order() {
        let mut log = ConversationLog::new();
        log.append("first", Sender::User, None);
        log.append("second", Sender::Agent, Some(MessageKind::BrowserAction));
        log.append("third", Sender::User, None);

        let texts: Vec<&str> = log.list().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut log = ConversationLog::new();
        for i in 0..10 {
            log.append(format!("msg {}", i), Sender::User, None);
        }

        let ids: Vec<u64> = log.list().iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_count_by_sender() {
        let mut log = ConversationLog::new();
        log.append("hi", Sender::User, None);
        log.append("hello", Sender::Agent, None);
        log.append("again", Sender::User, None);

        assert_eq!(log.count_by(Sender::User), 2);
        assert_eq!(log.count_by(Sender::Agent), 1);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_message_serializes_kind_as_type() {
        let mut log = ConversationLog::new();
        let id = log
            .append("go", Sender::Agent, Some(MessageKind::BrowserAction))
            .id;
        let json = serde_json::to_value(log.get(id).unwrap()).unwrap();

        assert_eq!(json["sender"], "agent");
        assert_eq!(json["type"], "browser-action");
    }
}
