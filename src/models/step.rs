// Wizard steps - the ordered units of a data-entry wizard

//! # Wizard Steps
//!
//! A wizard is an ordered list of [`Step`]s. Each step prompts for one
//! value, validates what comes back, and stores the result under its
//! [`FieldName`]. The order of the list is the forward order of the wizard
//! and, read backwards, the order of the `back` command.
//!
//! Steps are identified by their position in the list rather than by a
//! name string, so moving back is plain index arithmetic.
//!
//! ## Rust Learning Notes:
//!
//! ### `&'static str` in Data Tables
//! Prompts and messages are string literals that live for the whole
//! program. Storing them as `&'static str` lets the step tables be built
//! as constants without allocating.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::record::{CategoryId, PhotoRef};

/// The wizards the admin panel knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardKind {
    /// Attach a photo as the banner of one info page
    BannerAssignment,

    /// Add a new product, or edit an existing one
    ProductUpsert,
}

impl std::fmt::Display for WizardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardKind::BannerAssignment => write!(f, "banner_assignment"),
            WizardKind::ProductUpsert => write!(f, "product_upsert"),
        }
    }
}

/// Key a validated value is stored under in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Name,
    Description,
    Category,
    Price,
    Image,
    Banner,
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldName::Name => "name",
            FieldName::Description => "description",
            FieldName::Category => "category",
            FieldName::Price => "price",
            FieldName::Image => "image",
            FieldName::Banner => "banner",
        };
        f.write_str(name)
    }
}

/// A validated value collected by one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Category(CategoryId),
    Price(Decimal),
    Photo(PhotoRef),
    Banner { page: String, image: PhotoRef },
}

/// How a step checks its raw input
///
/// Validators are data, not closures, so the step tables stay `const` and
/// the evaluation logic lives in one place
/// (see `engine::validation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Text whose character count must fall in `[min_len, max_len)`
    TextLength {
        min_len: usize,
        max_len: usize,
        out_of_bounds: &'static str,
    },

    /// A callback carrying the numeric id of a known category
    CategoryChoice,

    /// A non-negative decimal number
    Price,

    /// A photo attachment
    Photo,

    /// A photo whose caption names one of the known info pages
    BannerPage,
}

/// One prompt/validate/store unit of a wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Position in the wizard; also the forward/back order
    pub index: usize,

    /// Where the validated value is stored
    pub field: FieldName,

    /// Shown when the step is entered going forward
    pub prompt: &'static str,

    /// Shown when the user comes back to this step with `back`
    pub again_prompt: &'static str,

    /// Shown when the input has the wrong shape (e.g. text instead of a photo)
    pub wrong_data: &'static str,

    pub validator: Validator,

    /// Whether the reuse sentinel keeps the edited record's value
    pub reuse_allowed: bool,
}

impl Step {
    /// Whether this step presents category buttons with its prompt
    pub fn wants_category_buttons(&self) -> bool {
        matches!(self.validator, Validator::CategoryChoice)
    }
}

/// Why a step refused its input
///
/// These never leave the engine as errors; they become the text of a
/// re-prompt and the session stays where it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRejection {
    /// Input had the wrong shape or was out of range
    Invalid { message: String },

    /// Input named a category or page that does not exist
    UnknownSelection { message: String, options: Vec<String> },

    /// `back` was sent from the first step
    FirstStep { message: String },
}

impl StepRejection {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        StepRejection::Invalid {
            message: message.into(),
        }
    }

    /// The text sent back to the user
    pub fn message(&self) -> &str {
        match self {
            StepRejection::Invalid { message }
            | StepRejection::UnknownSelection { message, .. }
            | StepRejection::FirstStep { message } => message,
        }
    }
}
