// Event bus for wizard lifecycle events

//! # Event Bus
//!
//! The engine announces every transition on a broadcast channel. Nothing in
//! the engine depends on anyone listening; subscribers (audit logs, metrics,
//! the console's `--events` flag) just observe.

use tokio::sync::broadcast;
use tracing::trace;

use crate::models::{ConversationId, WizardEvent, WizardEventType, WizardKind};

/// Broadcast channel for [`WizardEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WizardEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1000); // Buffer up to 1000 events
        Self { sender }
    }

    /// Publish to all current subscribers
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, event: WizardEvent) {
        trace!(conversation = %event.conversation, event = ?event.event_type, "wizard event");
        let _ = self.sender.send(event);
    }

    pub fn emit(&self, conversation: ConversationId, wizard: WizardKind, event_type: WizardEventType) {
        self.publish(WizardEvent::new(conversation, wizard, event_type));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.sender.subscribe()
    }
}
