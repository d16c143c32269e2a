// Wizard engine - drives conversations through the step tables

//! # Wizard Engine
//!
//! The engine is the state machine of the admin panel:
//!
//! ```text
//!            start / start_edit
//!   Idle ---------------------------> InStep(w, 0)
//!    ^                                  |   ^
//!    |  cancel                  valid   |   | back (i > 0)
//!    +------------------------ InStep(w, i) -> InStep(w, i + 1)
//!    |                                  |
//!    |  completion (success or error)   | valid input on last step
//!    +----------------------------------+
//! ```
//!
//! Invalid input and `back` on the first step leave the session exactly as
//! it was and only produce a message.
//!
//! ## Effects
//!
//! Deciding a transition is done by [`registry::process`](super::registry::process),
//! which is pure. The engine does everything around it: loading the session,
//! looking up the catalog data a validator needs, applying the transition to
//! the [`SessionStore`], sending prompts through the [`ChatTransport`], and
//! publishing a [`WizardEvent`](crate::models::WizardEvent).
//!
//! ## Concurrency
//!
//! Inputs for one conversation are handled one at a time: each call takes a
//! per-conversation async mutex before reading the session and releases it
//! after the last write. Different conversations never wait on each other.
//! A conversation only has a lock while a wizard runs in it; the entry is
//! dropped when the session goes back to idle.
//!
//! A step is committed before its prompt is sent. If the prompt cannot be
//! delivered the step is rolled back, so the user never sits on a step
//! they were not shown.
//!
//! ## Rust Learning Notes:
//!
//! ### Trait Objects for Collaborators
//! The engine holds `Arc<dyn SessionStore>`, `Arc<dyn CatalogStorage>` and
//! `Arc<dyn ChatTransport>`. Any backend can be plugged in at construction
//! time, and the same engine can be shared across tasks by cloning the
//! `Arc` around it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::{
    Category, ConversationId, EditContext, FieldName, FieldValue, Keyboard, Product, ProductId,
    Session, Step, StepRejection, UserInput, Validator, WizardEventType, WizardKind,
};
use crate::{Result, WizardError};

use super::catalog::CatalogStorage;
use super::events::EventBus;
use super::registry::{self, StepContext, Transition, EDIT_NAME_PROMPT};
use super::storage::SessionStore;
use super::transport::ChatTransport;
use super::validation::ValidationContext;

pub const CANCELED: &str = "Canceled";
pub const PRODUCT_SAVED: &str = "Good add/change successfully!";
pub const BANNER_SAVED: &str = "Banner added/changed successfully!";

/// Engine settings that come from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSettings {
    /// Input meaning "keep the current value" while editing
    pub reuse_sentinel: String,

    /// Keyboard restored when a wizard ends
    pub admin_keyboard: Keyboard,
}

impl Default for WizardSettings {
    fn default() -> Self {
        WizardSettings {
            reuse_sentinel: ".".to_string(),
            admin_keyboard: Keyboard::Remove,
        }
    }
}

/// What a record-producing wizard wrote on completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Product(Product),
    Banner { page: String },
}

/// Result of feeding one input (or one start trigger) to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Started { wizard: WizardKind, editing: bool },
    Advanced { wizard: WizardKind, to: usize },
    Reprompted(StepRejection),
    SteppedBack { wizard: WizardKind, to: usize },
    NavigationRejected(StepRejection),
    Cancelled,
    Completed(Completion),
    CompletionFailed { error: String },

    /// No wizard was active; nothing happened
    Ignored,
}

/// Drives conversations through the wizards
pub struct WizardEngine {
    sessions: Arc<dyn SessionStore>,
    catalog: Arc<dyn CatalogStorage>,
    transport: Arc<dyn ChatTransport>,
    settings: WizardSettings,
    events: EventBus,
    locks: DashMap<ConversationId, Arc<Mutex<()>>>,
}

impl WizardEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        catalog: Arc<dyn CatalogStorage>,
        transport: Arc<dyn ChatTransport>,
        settings: WizardSettings,
    ) -> Self {
        WizardEngine {
            sessions,
            catalog,
            transport,
            settings,
            events: EventBus::new(),
            locks: DashMap::new(),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn settings(&self) -> &WizardSettings {
        &self.settings
    }

    /// Current session of a conversation
    pub async fn session(&self, conversation: ConversationId) -> Session {
        self.sessions.get(conversation).await
    }

    pub async fn is_active(&self, conversation: ConversationId) -> bool {
        !self.sessions.get(conversation).await.is_idle()
    }

    /// Start `wizard` for a new record
    ///
    /// ## Errors
    /// - `SessionBusy` if a wizard is already running in this conversation
    pub async fn start(&self, conversation: ConversationId, wizard: WizardKind) -> Result<StepOutcome> {
        let lock = self.conversation_lock(conversation);
        let result = {
            let _guard = lock.lock().await;
            self.enter_first_step(conversation, wizard, None).await
        };
        drop(lock);
        self.release_lock_if_idle(conversation).await;
        result
    }

    /// Start the product wizard to edit an existing product
    ///
    /// ## Errors
    /// - `NotFound` if there is no product with that id
    /// - `SessionBusy` if a wizard is already running in this conversation
    pub async fn start_edit(&self, conversation: ConversationId, product_id: ProductId) -> Result<StepOutcome> {
        let lock = self.conversation_lock(conversation);
        let result = {
            let _guard = lock.lock().await;
            match self.catalog.get_product(product_id).await {
                Ok(Some(product)) => {
                    info!(%conversation, %product_id, "product edit requested");
                    self.enter_first_step(conversation, WizardKind::ProductUpsert, Some(EditContext::new(product)))
                        .await
                }
                Ok(None) => Err(WizardError::NotFound(format!("product {}", product_id))),
                Err(err) => Err(err),
            }
        };
        drop(lock);
        self.release_lock_if_idle(conversation).await;
        result
    }

    /// Feed one input to the conversation's active wizard
    ///
    /// Returns [`StepOutcome::Ignored`] when the conversation is idle, which
    /// makes `cancel` and `back` outside a wizard no-ops.
    pub async fn handle(&self, conversation: ConversationId, input: &UserInput) -> Result<StepOutcome> {
        // Idle chatter never gets a lock entry
        if !self.is_active(conversation).await {
            debug!(%conversation, input = input.kind(), "no active wizard");
            return Ok(StepOutcome::Ignored);
        }

        let lock = self.conversation_lock(conversation);
        let result = {
            let _guard = lock.lock().await;
            self.apply_input(conversation, input).await
        };
        drop(lock);
        self.release_lock_if_idle(conversation).await;
        result
    }

    /// Commit step 0 and show its prompt; the session is cleared again if
    /// the prompt cannot be delivered
    async fn enter_first_step(
        &self,
        conversation: ConversationId,
        wizard: WizardKind,
        edit: Option<EditContext>,
    ) -> Result<StepOutcome> {
        let editing = edit.is_some();
        self.sessions.start(conversation, wizard, edit).await?;

        let first = &registry::steps_for(wizard)[0];
        let prompted = match (wizard, editing) {
            (WizardKind::ProductUpsert, true) => {
                self.transport
                    .send_text(conversation, EDIT_NAME_PROMPT, Some(Keyboard::Remove))
                    .await
            }
            (WizardKind::ProductUpsert, false) => {
                self.transport
                    .send_text(conversation, first.prompt, Some(Keyboard::Remove))
                    .await
            }
            (WizardKind::BannerAssignment, _) => self.send_step_prompt(conversation, first, first.prompt).await,
        };
        if let Err(err) = prompted {
            warn!(%conversation, %wizard, error = %err, "first prompt not delivered, wizard not started");
            self.sessions.clear(conversation).await?;
            return Err(err);
        }

        info!(%conversation, %wizard, editing, "wizard started");
        self.events
            .emit(conversation, wizard, WizardEventType::Started { editing });
        Ok(StepOutcome::Started { wizard, editing })
    }

    async fn apply_input(&self, conversation: ConversationId, input: &UserInput) -> Result<StepOutcome> {
        let mut session = self.sessions.get(conversation).await;
        let (wizard, index) = match session.current_step() {
            Some(position) => position,
            None => {
                debug!(%conversation, input = input.kind(), "no active wizard");
                return Ok(StepOutcome::Ignored);
            }
        };

        let step = match registry::step_at(wizard, index) {
            Some(step) => step,
            None => {
                warn!(%conversation, %wizard, index, "session points past the last step, clearing");
                self.sessions.clear(conversation).await?;
                return Err(WizardError::Internal(format!(
                    "step {} does not exist in {}",
                    index, wizard
                )));
            }
        };

        let categories = self.categories_for(step).await?;
        let page_names = self.page_names_for(step).await?;
        let ctx = StepContext {
            validation: ValidationContext {
                categories: &categories,
                page_names: &page_names,
            },
            edit: session.edit_context.as_ref(),
            reuse_sentinel: &self.settings.reuse_sentinel,
        };

        let transition = registry::process(wizard, index, input, &ctx)
            .ok_or_else(|| WizardError::Internal(format!("step {} does not exist in {}", index, wizard)))?;
        debug!(%conversation, %wizard, index, input = input.kind(), ?transition, "step processed");

        match transition {
            Transition::Advance { value, next } => {
                self.sessions.update_fields(conversation, step.field, value).await?;
                self.sessions.set_step(conversation, wizard, next).await?;

                let next_step = &registry::steps_for(wizard)[next];
                if let Err(err) = self.send_step_prompt(conversation, next_step, next_step.prompt).await {
                    // Stay on the current step so the same input can be sent again
                    self.sessions.set_step(conversation, wizard, index).await?;
                    return Err(err);
                }

                info!(%conversation, %wizard, from = index, to = next, "step advanced");
                self.events.emit(
                    conversation,
                    wizard,
                    WizardEventType::StepAdvanced { from: index, to: next },
                );
                Ok(StepOutcome::Advanced { wizard, to: next })
            }

            Transition::Complete { value } => {
                self.sessions
                    .update_fields(conversation, step.field, value.clone())
                    .await?;
                session.collected_fields.insert(step.field, value);
                self.complete(conversation, wizard, session).await
            }

            Transition::Reprompt(rejection) => {
                debug!(%conversation, %wizard, index, reason = rejection.message(), "input rejected");
                let keyboard = if step.wants_category_buttons() {
                    Some(category_keyboard(&categories))
                } else {
                    None
                };
                self.transport
                    .send_text(conversation, rejection.message(), keyboard)
                    .await?;
                Ok(StepOutcome::Reprompted(rejection))
            }

            Transition::Back { to } => {
                self.sessions.set_step(conversation, wizard, to).await?;

                let previous = &registry::steps_for(wizard)[to];
                let text = format!("Ok, you are on the previous step \n {}", previous.again_prompt);
                if let Err(err) = self.send_step_prompt(conversation, previous, &text).await {
                    self.sessions.set_step(conversation, wizard, index).await?;
                    return Err(err);
                }

                info!(%conversation, %wizard, from = index, to, "stepped back");
                self.events
                    .emit(conversation, wizard, WizardEventType::SteppedBack { from: index, to });
                Ok(StepOutcome::SteppedBack { wizard, to })
            }

            Transition::RejectedNavigation(rejection) => {
                self.transport
                    .send_text(conversation, rejection.message(), None)
                    .await?;
                Ok(StepOutcome::NavigationRejected(rejection))
            }

            Transition::Cancel => {
                self.sessions.clear(conversation).await?;
                info!(%conversation, %wizard, at_step = index, "wizard cancelled");
                self.events
                    .emit(conversation, wizard, WizardEventType::Cancelled { at_step: index });
                self.transport
                    .send_text(conversation, CANCELED, Some(self.settings.admin_keyboard.clone()))
                    .await?;
                Ok(StepOutcome::Cancelled)
            }
        }
    }

    /// Hand the collected fields to the catalog and end the wizard
    ///
    /// The session is cleared whether the catalog call succeeds or not; a
    /// failure is reported to the user once and not retried.
    async fn complete(&self, conversation: ConversationId, wizard: WizardKind, session: Session) -> Result<StepOutcome> {
        let result = match wizard {
            WizardKind::ProductUpsert => self.save_product(&session).await,
            WizardKind::BannerAssignment => self.save_banner(&session).await,
        };

        self.sessions.clear(conversation).await?;
        let keyboard = Some(self.settings.admin_keyboard.clone());

        match result {
            Ok(completion) => {
                info!(%conversation, %wizard, "wizard completed");
                self.events
                    .emit(conversation, wizard, WizardEventType::Completed);
                let text = match completion {
                    Completion::Product(_) => PRODUCT_SAVED,
                    Completion::Banner { .. } => BANNER_SAVED,
                };
                self.transport.send_text(conversation, text, keyboard).await?;
                Ok(StepOutcome::Completed(completion))
            }
            Err(err) => {
                let error = err.to_string();
                warn!(%conversation, %wizard, %error, "completion failed");
                self.events.emit(
                    conversation,
                    wizard,
                    WizardEventType::CompletionFailed { error: error.clone() },
                );
                let text = format!(
                    "Error: \n {} \n Please try again or write 'cancel' to cancel the operation.",
                    error
                );
                self.transport.send_text(conversation, &text, keyboard).await?;
                Ok(StepOutcome::CompletionFailed { error })
            }
        }
    }

    async fn save_product(&self, session: &Session) -> Result<Completion> {
        let fields = session
            .product_fields()
            .ok_or_else(|| WizardError::Internal("product wizard finished with missing fields".to_string()))?;
        let existing = session.edit_context.as_ref().map(|edit| edit.source_record.id);
        let product = self.catalog.upsert_product(fields, existing).await?;
        Ok(Completion::Product(product))
    }

    async fn save_banner(&self, session: &Session) -> Result<Completion> {
        let (page, image) = match session.field(FieldName::Banner) {
            Some(FieldValue::Banner { page, image }) => (page.clone(), image.clone()),
            _ => {
                return Err(WizardError::Internal(
                    "banner wizard finished without a banner".to_string(),
                ))
            }
        };
        self.catalog.set_banner_image(&page, image).await?;
        Ok(Completion::Banner { page })
    }

    /// Send `text` as the prompt of `step`, with whatever the step needs
    /// alongside it (category buttons, the list of page names)
    async fn send_step_prompt(&self, conversation: ConversationId, step: &Step, text: &str) -> Result<()> {
        if step.wants_category_buttons() {
            let categories = self.catalog.list_categories().await?;
            return self
                .transport
                .send_text(conversation, text, Some(category_keyboard(&categories)))
                .await;
        }

        let page_names = self.page_names_for(step).await?;
        if page_names.is_empty() {
            self.transport.send_text(conversation, text, None).await
        } else {
            let text = format!("{}  \n {}", text, page_names.join(", "));
            self.transport.send_text(conversation, &text, None).await
        }
    }

    async fn categories_for(&self, step: &Step) -> Result<Vec<Category>> {
        if step.wants_category_buttons() {
            self.catalog.list_categories().await
        } else {
            Ok(Vec::new())
        }
    }

    async fn page_names_for(&self, step: &Step) -> Result<Vec<String>> {
        if matches!(step.validator, Validator::BannerPage) {
            let pages = self.catalog.list_info_pages().await?;
            Ok(pages.into_iter().map(|page| page.name).collect())
        } else {
            Ok(Vec::new())
        }
    }

    fn conversation_lock(&self, conversation: ConversationId) -> Arc<Mutex<()>> {
        self.locks.entry(conversation).or_default().clone()
    }

    /// Forget the conversation's lock once no wizard runs and no other task
    /// holds or waits on it
    ///
    /// Call only after the caller's own `Arc` is dropped. The count check
    /// and the removal happen under the map's shard lock, the same lock
    /// `conversation_lock` clones under, so a waiter is never orphaned.
    async fn release_lock_if_idle(&self, conversation: ConversationId) {
        if self.sessions.get(conversation).await.is_idle() {
            self.locks
                .remove_if(&conversation, |_, lock| Arc::strong_count(lock) == 1);
        }
    }

    #[cfg(test)]
    pub(crate) fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

/// One inline button per category; the callback data is the bare id
pub fn category_keyboard(categories: &[Category]) -> Keyboard {
    Keyboard::inline(
        categories
            .iter()
            .map(|category| (category.name.clone(), category.id.to_string()))
            .collect(),
    )
}
