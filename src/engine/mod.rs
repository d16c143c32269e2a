// Wizard engine and its collaborators

//! # Engine Module
//!
//! Everything that runs the wizards:
//!
//! ```text
//! AdminRouter (crate::admin)
//!        ↓ start / handle
//! WizardEngine ── registry::process ── validation
//!   ↓        ↓            ↓
//! SessionStore  CatalogStorage  ChatTransport
//! ```
//!
//! The step tables and the transition logic are pure. Storage, catalog and
//! transport are traits with in-memory implementations, so the engine runs
//! the same way in the console, in tests, and behind a real chat platform.

pub mod catalog;
pub mod events;
pub mod registry;
pub mod storage;
pub mod transport;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod wizard_tests;

pub use catalog::{CatalogStorage, InMemoryCatalog};
pub use events::EventBus;
pub use registry::{process, steps_for, StepContext, Transition};
pub use storage::{InMemorySessionStore, SessionStore};
pub use transport::{ChatTransport, OutgoingMessage, RecordingTransport};
pub use validation::ValidationContext;
pub use wizard::{Completion, StepOutcome, WizardEngine, WizardSettings};
