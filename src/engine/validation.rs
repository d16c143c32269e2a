// Step input validation

//! # Step Validation
//!
//! Evaluates a step's [`Validator`] against one [`UserInput`]. Validation is
//! pure: anything that depends on the catalog (the known categories, the
//! known page names) is looked up by the engine beforehand and passed in
//! through a [`ValidationContext`].
//!
//! Each failure carries the exact text the user should see next, so the
//! engine can re-prompt without knowing which step failed or why.
//!
//! ## Rust Learning Notes:
//!
//! ### Result as a Two-Way Branch
//! `validate` returns `Result<FieldValue, StepRejection>`. Here `Err` is not
//! a fault in the program; it is simply the "ask again" branch of the state
//! machine. Using `Result` still lets the caller use `?` and `match` in the
//! usual way.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::models::{Category, CategoryId, FieldValue, Step, StepRejection, UserInput, Validator};

/// Catalog data a validator may need
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    /// Categories the category step accepts, in display order
    pub categories: &'a [Category],

    /// Page names the banner step accepts
    pub page_names: &'a [String],
}

pub const CATEGORY_NOT_IN_LIST: &str = "Choose the category from the list";
pub const PAGE_NOT_IN_LIST: &str = "You write wrong page name, please choose the page from the list";
pub const PRICE_DIGITS_ONLY: &str = "Write correct data, digit only";

impl Step {
    /// Check `input` against this step's validator
    pub fn validate(&self, input: &UserInput, ctx: &ValidationContext<'_>) -> Result<FieldValue, StepRejection> {
        match self.validator {
            Validator::TextLength {
                min_len,
                max_len,
                out_of_bounds,
            } => {
                let text = input.as_text().ok_or_else(|| StepRejection::invalid(self.wrong_data))?;
                if !length_in_bounds(text, min_len, max_len) {
                    return Err(StepRejection::invalid(out_of_bounds));
                }
                Ok(FieldValue::Text(text.to_string()))
            }

            Validator::CategoryChoice => {
                let data = match input {
                    UserInput::Callback { data } => data,
                    _ => return Err(StepRejection::invalid(self.wrong_data)),
                };
                let selected = data.trim().parse::<i64>().ok().map(CategoryId);
                match selected {
                    Some(id) if ctx.categories.iter().any(|c| c.id == id) => Ok(FieldValue::Category(id)),
                    _ => Err(StepRejection::UnknownSelection {
                        message: CATEGORY_NOT_IN_LIST.to_string(),
                        options: ctx.categories.iter().map(|c| c.name.clone()).collect(),
                    }),
                }
            }

            Validator::Price => {
                let text = input.as_text().ok_or_else(|| StepRejection::invalid(self.wrong_data))?;
                parse_price(text)
                    .map(FieldValue::Price)
                    .ok_or_else(|| StepRejection::invalid(PRICE_DIGITS_ONLY))
            }

            Validator::Photo => match input {
                UserInput::Photo { photo, .. } => Ok(FieldValue::Photo(photo.clone())),
                _ => Err(StepRejection::invalid(self.wrong_data)),
            },

            Validator::BannerPage => {
                let (photo, caption) = match input {
                    UserInput::Photo { photo, caption } => (photo, caption),
                    _ => return Err(StepRejection::invalid(self.wrong_data)),
                };
                let page = caption.as_deref().map(str::trim).unwrap_or_default();
                if ctx.page_names.iter().any(|name| name == page) {
                    Ok(FieldValue::Banner {
                        page: page.to_string(),
                        image: photo.clone(),
                    })
                } else {
                    Err(StepRejection::UnknownSelection {
                        message: format!("{}: {}", PAGE_NOT_IN_LIST, ctx.page_names.join(", ")),
                        options: ctx.page_names.to_vec(),
                    })
                }
            }
        }
    }
}

/// Character count in `[min_len, max_len)`
pub fn length_in_bounds(text: &str, min_len: usize, max_len: usize) -> bool {
    let len = text.chars().count();
    len >= min_len && len < max_len
}

/// Parse a non-negative decimal price
pub fn parse_price(text: &str) -> Option<Decimal> {
    Decimal::from_str(text.trim())
        .ok()
        .filter(|price| !price.is_sign_negative())
}
