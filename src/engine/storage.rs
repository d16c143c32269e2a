// Session state storage for the wizard engine

//! # Session Store
//!
//! The engine keeps no state of its own between messages. Each conversation's
//! [`Session`] lives in a [`SessionStore`], so a wizard can be suspended after
//! one message and resumed on the next.
//!
//! ## Storage Architecture
//!
//! - **SessionStore trait**: the operations the engine needs
//! - **InMemorySessionStore**: default backend, a `DashMap` keyed by
//!   conversation
//!
//! ## Thread Safety
//!
//! Many conversations are served at once. `DashMap` shards its keys over
//! several locks, so two conversations rarely contend, while every single
//! operation on one conversation is applied atomically under its shard lock.
//! A duplicate delivery racing the original cannot leave a half-merged
//! `collected_fields` behind.
//!
//! ## Rust Learning Notes:
//!
//! ### The Entry API
//! `entry(key).or_default()` returns a guard holding the shard lock for the
//! whole read-modify-write. Nothing else touching that key can run until
//! the guard is dropped at the end of the statement.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use crate::models::{ConversationId, EditContext, FieldName, FieldValue, Session, WizardKind, WizardState};
use crate::{Result, WizardError};

/// Per-conversation session persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session; an absent session is an idle one
    async fn get(&self, conversation: ConversationId) -> Session;

    /// Enter step 0 of `wizard`, attaching `edit` when editing
    ///
    /// ## Errors
    /// - `SessionBusy` if the conversation already has an active wizard
    async fn start(&self, conversation: ConversationId, wizard: WizardKind, edit: Option<EditContext>) -> Result<Session>;

    /// Overwrite the current step; the index is not checked here
    async fn set_step(&self, conversation: ConversationId, wizard: WizardKind, step: usize) -> Result<()>;

    /// Merge one value into `collected_fields`
    async fn update_fields(&self, conversation: ConversationId, field: FieldName, value: FieldValue) -> Result<()>;

    /// Back to idle, dropping collected fields and edit context
    async fn clear(&self, conversation: ConversationId) -> Result<()>;

    /// Conversations currently inside a wizard
    async fn active_conversations(&self) -> Vec<ConversationId>;
}

/// In-memory session store
///
/// Not persistent on its own; [`snapshot`](Self::snapshot) and
/// [`restore`](Self::restore) let a process write its sessions out and pick
/// them up again after a restart.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<ConversationId, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize every non-idle session to JSON
    pub fn snapshot(&self) -> Result<String> {
        let active: Vec<(ConversationId, Session)> = self
            .sessions
            .iter()
            .filter(|entry| !entry.value().is_idle())
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        Ok(serde_json::to_string_pretty(&active)?)
    }

    /// Rebuild a store from a [`snapshot`](Self::snapshot)
    pub fn restore(json: &str) -> Result<Self> {
        let active: Vec<(ConversationId, Session)> = serde_json::from_str(json)?;
        let store = Self::new();
        for (conversation, session) in active {
            store.sessions.insert(conversation, session);
        }
        Ok(store)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, conversation: ConversationId) -> Session {
        self.sessions
            .get(&conversation)
            .map(|session| session.value().clone())
            .unwrap_or_default()
    }

    async fn start(&self, conversation: ConversationId, wizard: WizardKind, edit: Option<EditContext>) -> Result<Session> {
        let mut session = self.sessions.entry(conversation).or_default();
        if !session.is_idle() {
            return Err(WizardError::SessionBusy { conversation });
        }

        *session = Session {
            state: WizardState::InStep { wizard, step: 0 },
            edit_context: edit,
            ..Session::idle()
        };
        debug!(%conversation, %wizard, "session started");
        Ok(session.clone())
    }

    async fn set_step(&self, conversation: ConversationId, wizard: WizardKind, step: usize) -> Result<()> {
        let mut session = self.sessions.entry(conversation).or_default();
        session.state = WizardState::InStep { wizard, step };
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn update_fields(&self, conversation: ConversationId, field: FieldName, value: FieldValue) -> Result<()> {
        let mut session = self.sessions.entry(conversation).or_default();
        session.collected_fields.insert(field, value);
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn clear(&self, conversation: ConversationId) -> Result<()> {
        // Removing the entry is the same as resetting it to idle
        self.sessions.remove(&conversation);
        Ok(())
    }

    async fn active_conversations(&self) -> Vec<ConversationId> {
        let mut active: Vec<ConversationId> = self
            .sessions
            .iter()
            .filter(|entry| !entry.value().is_idle())
            .map(|entry| *entry.key())
            .collect();
        active.sort();
        active
    }
}
