// Catalog Wizard
// Step-by-step admin dialogs for a chat-driven shop catalog

//! # Catalog Wizard Library
//!
//! A small engine for multi-step chat dialogs ("wizards") that collect the
//! fields of a catalog record one message at a time, validate each one,
//! and write the finished record to the catalog.
//!
//! ## Core Components
//!
//! ### Domain Models
//! - [`Session`]: where a conversation is inside a wizard and what it has collected
//! - [`Step`]: one field of a wizard, with its prompts and its [`Validator`]
//! - [`UserInput`]: text, photo or button press coming from the chat
//! - [`Product`] / [`Category`] / [`InfoPage`]: the catalog records
//!
//! ### Engine
//! - [`WizardEngine`]: starts wizards, feeds them input, and finalizes them
//! - [`SessionStore`]: per-conversation session storage
//! - [`CatalogStorage`]: where finished records go
//! - [`ChatTransport`]: how prompts and replies reach the user
//!
//! ### Admin Router
//! [`AdminRouter`] sits in front of the engine and handles the admin menu,
//! assortment listing and product deletion.
//!
//! ## Wizards
//!
//! | Wizard | Steps |
//! |--------|-------|
//! | product upsert | name, description, category, price, image |
//! | banner assignment | page name (as photo caption) + banner photo |
//!
//! Every step understands `cancel` and `back`. When editing a product, `.`
//! keeps the current value of a field.
//!
//! ## Rust Learning Notes:
//!
//! ### Flat Re-exports
//! The `pub use` lines below let callers write `catalog_wizard::WizardEngine`
//! instead of `catalog_wizard::engine::wizard::WizardEngine`.

// Core domain models
pub mod models;

// Engine: step tables, sessions, catalog, transport
pub mod engine;

// Admin menu and routing
pub mod admin;

// Layered settings
pub mod config;

pub use models::{
    Category, CategoryId, CollectedFields, ControlCommand, ConversationId, EditContext, FieldName, FieldValue,
    InfoPage, Keyboard, PhotoRef, Product, ProductFields, ProductId, Session, Step, StepRejection, UserInput,
    Validator, WizardEvent, WizardEventType, WizardKind, WizardState,
};

pub use engine::{
    CatalogStorage, ChatTransport, Completion, EventBus, InMemoryCatalog, InMemorySessionStore, OutgoingMessage,
    RecordingTransport, SessionStore, StepOutcome, WizardEngine, WizardSettings,
};

pub use admin::{AdminRouter, Routed};
pub use config::AppConfig;

use thiserror::Error;

/// Errors from wizard, catalog and transport operations
///
/// Invalid user input is not an error: it is a [`StepRejection`] and the
/// wizard simply asks again. These are failures of the surrounding system.
#[derive(Error, Debug)]
pub enum WizardError {
    /// A wizard is already running in the conversation
    #[error("A wizard is already running in conversation {conversation}")]
    SessionBusy { conversation: ConversationId },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Catalog or session backend failures
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Delivery to the chat platform failed
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for WizardError {
    fn from(err: std::io::Error) -> Self {
        WizardError::Internal(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, WizardError>;
