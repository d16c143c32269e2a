// Domain models for the admin wizards

//! # Domain Models
//!
//! Pure data types with no I/O:
//! - [`record`]: catalog records (products, categories, info pages)
//! - [`step`]: wizard kinds, steps, validators and collected values
//! - [`session`]: per-conversation progress and edit context
//! - [`input`]: inbound chat events, control commands, reply markup
//! - [`event`]: lifecycle events published by the engine

pub mod event;
pub mod input;
pub mod record;
pub mod session;
pub mod step;

pub use event::{WizardEvent, WizardEventType};
pub use input::{ControlCommand, ConversationId, Keyboard, UserInput};
pub use record::{Category, CategoryId, InfoPage, PhotoRef, Product, ProductFields, ProductId};
pub use session::{CollectedFields, EditContext, Session, WizardState};
pub use step::{FieldName, FieldValue, Step, StepRejection, Validator, WizardKind};
