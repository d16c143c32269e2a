// Wizard lifecycle events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::input::ConversationId;
use super::step::WizardKind;

/// Something that happened to a conversation's wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardEvent {
    pub id: Uuid,
    pub conversation: ConversationId,
    pub wizard: WizardKind,
    pub event_type: WizardEventType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEventType {
    Started { editing: bool },
    StepAdvanced { from: usize, to: usize },
    SteppedBack { from: usize, to: usize },
    Cancelled { at_step: usize },
    Completed,
    CompletionFailed { error: String },
}

impl WizardEvent {
    pub fn new(conversation: ConversationId, wizard: WizardKind, event_type: WizardEventType) -> Self {
        WizardEvent {
            id: Uuid::new_v4(),
            conversation,
            wizard,
            event_type,
            timestamp: Utc::now(),
        }
    }
}
