// Chat transport boundary

//! # Chat Transport
//!
//! Outbound half of the chat platform. The engine and the admin router only
//! ever send through [`ChatTransport`]; how a message reaches the user is the
//! implementation's business.
//!
//! [`RecordingTransport`] keeps every outgoing message in memory. Tests use
//! it to assert on what the user would have seen.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::models::{ConversationId, Keyboard, PhotoRef};
use crate::Result;

/// Outbound chat operations
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, conversation: ConversationId, text: &str, keyboard: Option<Keyboard>) -> Result<()>;

    async fn send_photo(
        &self,
        conversation: ConversationId,
        photo: &PhotoRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()>;

    async fn send_animation(&self, conversation: ConversationId, animation: &str) -> Result<()>;

    /// Delete one message; fails if it is too old or already gone
    async fn delete_message(&self, conversation: ConversationId, message_id: i64) -> Result<()>;
}

/// A message as it left through the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    Text {
        conversation: ConversationId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        conversation: ConversationId,
        photo: PhotoRef,
        caption: String,
        keyboard: Option<Keyboard>,
    },
    Animation {
        conversation: ConversationId,
        animation: String,
    },
    Deleted {
        conversation: ConversationId,
        message_id: i64,
    },
}

impl OutgoingMessage {
    /// Text body or photo caption
    pub fn text(&self) -> Option<&str> {
        match self {
            OutgoingMessage::Text { text, .. } => Some(text),
            OutgoingMessage::Photo { caption, .. } => Some(caption),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            OutgoingMessage::Text { keyboard, .. } | OutgoingMessage::Photo { keyboard, .. } => keyboard.as_ref(),
            _ => None,
        }
    }
}

/// Transport that records instead of sending
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far
    pub async fn messages(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().await.clone()
    }

    /// Texts and captions sent so far, in order
    pub async fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|m| m.text().map(str::to_string))
            .collect()
    }

    pub async fn last(&self) -> Option<OutgoingMessage> {
        self.sent.lock().await.last().cloned()
    }

    pub async fn last_text(&self) -> Option<String> {
        self.texts().await.pop()
    }

    /// Drain the recorded messages
    pub async fn take(&self) -> Vec<OutgoingMessage> {
        std::mem::take(&mut *self.sent.lock().await)
    }

    async fn record(&self, message: OutgoingMessage) {
        self.sent.lock().await.push(message);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, conversation: ConversationId, text: &str, keyboard: Option<Keyboard>) -> Result<()> {
        self.record(OutgoingMessage::Text {
            conversation,
            text: text.to_string(),
            keyboard,
        })
        .await;
        Ok(())
    }

    async fn send_photo(
        &self,
        conversation: ConversationId,
        photo: &PhotoRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        self.record(OutgoingMessage::Photo {
            conversation,
            photo: photo.clone(),
            caption: caption.to_string(),
            keyboard,
        })
        .await;
        Ok(())
    }

    async fn send_animation(&self, conversation: ConversationId, animation: &str) -> Result<()> {
        self.record(OutgoingMessage::Animation {
            conversation,
            animation: animation.to_string(),
        })
        .await;
        Ok(())
    }

    async fn delete_message(&self, conversation: ConversationId, message_id: i64) -> Result<()> {
        self.record(OutgoingMessage::Deleted {
            conversation,
            message_id,
        })
        .await;
        Ok(())
    }
}
