//! Chat thread and message model.
//!
//! # Responsibility
//! - Define chat messages, their delivery status and owning threads.
//! - Guard the delivery status transitions.
//!
//! # Invariants
//! - Only user-authored messages carry a delivery status.
//! - Status only moves away from `Sending`; `Sent` and `Error` are terminal.
//! - Messages inside a thread are kept in insertion (chronological) order.

use crate::clock::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ThreadId = Uuid;
pub type MessageId = Uuid;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Assistant,
}

/// Simulated transport progress of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sending,
    Sent,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub content: String,
    pub author: Author,
    pub timestamp: Timestamp,
    /// `None` for assistant messages.
    pub status: Option<DeliveryStatus>,
}

impl ChatMessage {
    /// New user message in `Sending` state.
    pub fn user(content: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            author: Author::User,
            timestamp: now,
            status: Some(DeliveryStatus::Sending),
        }
    }

    /// New assistant message; assistant messages have no delivery status.
    pub fn assistant(content: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            author: Author::Assistant,
            timestamp: now,
            status: None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }

    /// `Sending -> Sent`. Any other state is left as is.
    pub fn mark_sent(&mut self) -> bool {
        self.transition(DeliveryStatus::Sent)
    }

    /// `Sending -> Error`. Any other state is left as is.
    pub fn mark_failed(&mut self) -> bool {
        self.transition(DeliveryStatus::Error)
    }

    fn transition(&mut self, next: DeliveryStatus) -> bool {
        if self.status == Some(DeliveryStatus::Sending) {
            self.status = Some(next);
            true
        } else {
            false
        }
    }
}

/// One conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: ThreadId,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    /// Drives recency bucketing only; message appends do not touch it.
    pub updated_at: Timestamp,
}

impl ChatThread {
    pub fn new(title: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            messages: Vec::new(),
            updated_at: now,
        }
    }

    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn message_mut(&mut self, id: MessageId) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|message| message.id == id)
    }

    pub fn remove_message(&mut self, id: MessageId) -> Option<ChatMessage> {
        let index = self.messages.iter().position(|message| message.id == id)?;
        Some(self.messages.remove(index))
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, DeliveryStatus};
    use crate::clock::local_timestamp;

    #[test]
    fn delivery_status_never_leaves_a_terminal_state() {
        let now = local_timestamp(2024, 1, 14, 9, 0, 0).expect("valid local time");
        let mut sent = ChatMessage::user("hi", now);
        assert!(sent.mark_sent());
        assert!(!sent.mark_failed());
        assert_eq!(sent.status, Some(DeliveryStatus::Sent));

        let mut failed = ChatMessage::user("hi", now);
        assert!(failed.mark_failed());
        assert!(!failed.mark_sent());
        assert_eq!(failed.status, Some(DeliveryStatus::Error));

        let mut reply = ChatMessage::assistant("hello", now);
        assert!(!reply.mark_sent());
        assert_eq!(reply.status, None);
    }
}
