// Step definition registry and per-step processing

//! # Step Registry
//!
//! Holds the ordered step tables of both wizards and the single function
//! that decides what one input does to one step.
//!
//! ## Wizards
//!
//! ```text
//! BannerAssignment:  [0 banner]
//! ProductUpsert:     [0 name] -> [1 description] -> [2 category] -> [3 price] -> [4 image]
//!                         <-back-       <-back-          <-back-        <-back-
//! ```
//!
//! The tables are `static`, so [`steps_for`] is free and always returns the
//! same order. The engine never scans the table to find the previous step;
//! it subtracts one from the index.
//!
//! ## Processing
//!
//! [`process`] is pure: given the wizard, the current index, the input, and
//! a [`StepContext`], it returns a [`Transition`] telling the engine what to
//! do. The engine then applies it to the session store and talks to the
//! user. Keeping the decision separate from the effects is what lets every
//! rule of the state machine be tested without a store or a transport.

use crate::models::{
    ControlCommand, EditContext, FieldName, FieldValue, Step, StepRejection, UserInput, Validator,
    WizardKind,
};

use super::validation::ValidationContext;

pub const EDIT_NAME_PROMPT: &str = "Enter the name of the product you want to change:";
pub const FIRST_STEP_BACK: &str = "Previous step is not available, or write \"cancel\"";
pub const BANNER_WRONG_DATA: &str = "You write wrong data, please load the image of the banner:";

static BANNER_STEPS: [Step; 1] = [Step {
    index: 0,
    field: FieldName::Banner,
    prompt: "Send a banner photo. \n Choose the page for the banner:",
    again_prompt: "Send a banner photo again. \n Choose the page for the banner:",
    wrong_data: BANNER_WRONG_DATA,
    validator: Validator::BannerPage,
    reuse_allowed: false,
}];

static PRODUCT_STEPS: [Step; 5] = [
    Step {
        index: 0,
        field: FieldName::Name,
        prompt: "Enter the name of the product you want to add:",
        again_prompt: "Enter the name of the product you want to add again:",
        wrong_data: "You write wrong data, please write the name of the product:",
        validator: Validator::TextLength {
            min_len: 4,
            max_len: 100,
            out_of_bounds: "Product name is too long or too short, please write the name of the product:",
        },
        reuse_allowed: true,
    },
    Step {
        index: 1,
        field: FieldName::Description,
        prompt: "Enter the description of the product:",
        again_prompt: "Enter the description of the product again:",
        wrong_data: "You write wrong data, please write the description of the product:",
        validator: Validator::TextLength {
            min_len: 4,
            max_len: 1000,
            out_of_bounds: "Product description is too long or too short, \n please write the description of the product:",
        },
        reuse_allowed: true,
    },
    Step {
        index: 2,
        field: FieldName::Category,
        prompt: "Choose the category:",
        again_prompt: "Choose the category of the product again:",
        wrong_data: "You write wrong data, please choose the category from the list:",
        validator: Validator::CategoryChoice,
        reuse_allowed: false,
    },
    Step {
        index: 3,
        field: FieldName::Price,
        prompt: "Enter the price of the product:",
        again_prompt: "Enter the price of the product again:",
        wrong_data: "You write wrong data, please write the price of the product:",
        validator: Validator::Price,
        reuse_allowed: true,
    },
    Step {
        index: 4,
        field: FieldName::Image,
        prompt: "Load the image of the product:",
        again_prompt: "Load the image of the product again:",
        wrong_data: "You write wrong data, please load the image of the product:",
        validator: Validator::Photo,
        reuse_allowed: true,
    },
];

/// The ordered steps of a wizard
pub fn steps_for(kind: WizardKind) -> &'static [Step] {
    match kind {
        WizardKind::BannerAssignment => &BANNER_STEPS,
        WizardKind::ProductUpsert => &PRODUCT_STEPS,
    }
}

/// One step of a wizard, or `None` if `index` is past the end
pub fn step_at(kind: WizardKind, index: usize) -> Option<&'static Step> {
    steps_for(kind).get(index)
}

/// Everything besides the input that decides a step's outcome
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub validation: ValidationContext<'a>,
    pub edit: Option<&'a EditContext>,
    pub reuse_sentinel: &'a str,
}

/// What the engine must do after one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Store `value` and move to step `next`
    Advance { value: FieldValue, next: usize },

    /// Store `value`; it was the last step
    Complete { value: FieldValue },

    /// Stay on the step and ask again
    Reprompt(StepRejection),

    /// Move to step `to` without touching collected fields
    Back { to: usize },

    /// `back` from the first step
    RejectedNavigation(StepRejection),

    /// Drop the wizard
    Cancel,
}

/// Decide what `input` does to step `index` of `kind`
///
/// Returns `None` when `index` is not a step of `kind`; the engine treats
/// that as a corrupt session.
pub fn process(kind: WizardKind, index: usize, input: &UserInput, ctx: &StepContext<'_>) -> Option<Transition> {
    let steps = steps_for(kind);
    let step = steps.get(index)?;

    let transition = match ControlCommand::parse(input) {
        Some(ControlCommand::Cancel) => Transition::Cancel,
        Some(ControlCommand::Back) if index == 0 => Transition::RejectedNavigation(StepRejection::FirstStep {
            message: FIRST_STEP_BACK.to_string(),
        }),
        Some(ControlCommand::Back) => Transition::Back { to: index - 1 },
        None => {
            let accepted = match reused_value(step, input, ctx) {
                Some(value) => Ok(value),
                None => step.validate(input, &ctx.validation),
            };
            match accepted {
                Ok(value) if index + 1 < steps.len() => Transition::Advance {
                    value,
                    next: index + 1,
                },
                Ok(value) => Transition::Complete { value },
                Err(rejection) => Transition::Reprompt(rejection),
            }
        }
    };

    Some(transition)
}

/// The edited record's value, when the input is the reuse sentinel on a
/// step that allows it
fn reused_value(step: &Step, input: &UserInput, ctx: &StepContext<'_>) -> Option<FieldValue> {
    if !step.reuse_allowed || input.as_text() != Some(ctx.reuse_sentinel) {
        return None;
    }
    ctx.edit?.reuse(step.field)
}
