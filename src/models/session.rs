// Per-conversation wizard sessions

//! # Sessions
//!
//! A [`Session`] is the progress of one conversation through a wizard: which
//! step it is on, what has been collected so far, and, when an existing
//! product is being edited, the [`EditContext`] holding that product.
//!
//! The edit context belongs to the session. Two admins editing different
//! products at the same time each carry their own copy, and clearing a
//! session drops its edit context with it.
//!
//! ## Rust Learning Notes:
//!
//! ### Enums as State
//! [`WizardState`] makes "idle" and "in a step" separate variants, so there
//! is no way to hold a step index without also naming the wizard it belongs
//! to. An idle session simply has no index to get wrong.
//!
//! ### BTreeMap for Collected Fields
//! `BTreeMap` keeps keys sorted by the `FieldName` declaration order, which
//! gives stable, readable output when a session is logged or serialized.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Product, ProductFields};
use super::step::{FieldName, FieldValue, WizardKind};

/// Values collected so far, keyed by the step's field
pub type CollectedFields = BTreeMap<FieldName, FieldValue>;

/// Where a conversation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WizardState {
    Idle,
    InStep { wizard: WizardKind, step: usize },
}

/// The record being edited, when a wizard was entered through "edit"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditContext {
    pub source_record: Product,
}

impl EditContext {
    pub fn new(source_record: Product) -> Self {
        EditContext { source_record }
    }

    /// The value a reuse shortcut resolves to for `field`
    ///
    /// Every product field has a counterpart on the record. Banner values do
    /// not come from products, so `Banner` resolves to nothing.
    pub fn reuse(&self, field: FieldName) -> Option<FieldValue> {
        let record = &self.source_record;
        match field {
            FieldName::Name => Some(FieldValue::Text(record.name.clone())),
            FieldName::Description => Some(FieldValue::Text(record.description.clone())),
            FieldName::Category => Some(FieldValue::Category(record.category_id)),
            FieldName::Price => Some(FieldValue::Price(record.price)),
            FieldName::Image => Some(FieldValue::Photo(record.image.clone())),
            FieldName::Banner => None,
        }
    }
}

/// Per-conversation wizard progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub state: WizardState,
    pub collected_fields: CollectedFields,
    pub edit_context: Option<EditContext>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Session::idle()
    }
}

impl Session {
    /// A session with no active wizard
    pub fn idle() -> Self {
        Session {
            state: WizardState::Idle,
            collected_fields: CollectedFields::new(),
            edit_context: None,
            updated_at: Utc::now(),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, WizardState::Idle)
    }

    /// The active wizard and step index, if any
    pub fn current_step(&self) -> Option<(WizardKind, usize)> {
        match self.state {
            WizardState::Idle => None,
            WizardState::InStep { wizard, step } => Some((wizard, step)),
        }
    }

    pub fn field(&self, field: FieldName) -> Option<&FieldValue> {
        self.collected_fields.get(&field)
    }

    /// Assemble the product fields, if all five have been collected
    pub fn product_fields(&self) -> Option<ProductFields> {
        let name = match self.field(FieldName::Name)? {
            FieldValue::Text(text) => text.clone(),
            _ => return None,
        };
        let description = match self.field(FieldName::Description)? {
            FieldValue::Text(text) => text.clone(),
            _ => return None,
        };
        let category_id = match self.field(FieldName::Category)? {
            FieldValue::Category(id) => *id,
            _ => return None,
        };
        let price = match self.field(FieldName::Price)? {
            FieldValue::Price(price) => *price,
            _ => return None,
        };
        let image = match self.field(FieldName::Image)? {
            FieldValue::Photo(photo) => photo.clone(),
            _ => return None,
        };

        Some(ProductFields {
            name,
            description,
            category_id,
            price,
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{CategoryId, PhotoRef, ProductId};
    use rust_decimal::Decimal;

    fn sample_product() -> Product {
        Product {
            id: ProductId(3),
            name: "Lamp".to_string(),
            description: "A desk lamp".to_string(),
            category_id: CategoryId(1),
            price: Decimal::new(1250, 2),
            image: PhotoRef::from("lamp-photo"),
        }
    }

    #[test]
    fn test_default_session_is_idle() {
        let session = Session::default();
        assert!(session.is_idle());
        assert_eq!(session.current_step(), None);
        assert!(session.collected_fields.is_empty());
        assert!(session.edit_context.is_none());
    }

    #[test]
    fn test_edit_context_reuse_resolves_every_product_field() {
        let edit = EditContext::new(sample_product());

        assert_eq!(edit.reuse(FieldName::Name), Some(FieldValue::Text("Lamp".to_string())));
        assert_eq!(edit.reuse(FieldName::Description), Some(FieldValue::Text("A desk lamp".to_string())));
        assert_eq!(edit.reuse(FieldName::Category), Some(FieldValue::Category(CategoryId(1))));
        assert_eq!(edit.reuse(FieldName::Price), Some(FieldValue::Price(Decimal::new(1250, 2))));
        assert_eq!(edit.reuse(FieldName::Image), Some(FieldValue::Photo(PhotoRef::from("lamp-photo"))));
        assert_eq!(edit.reuse(FieldName::Banner), None);
    }

    #[test]
    fn test_product_fields_requires_all_five() {
        let mut session = Session::idle();
        let product = sample_product();
        let edit = EditContext::new(product.clone());

        for field in [FieldName::Name, FieldName::Description, FieldName::Category, FieldName::Price] {
            session.collected_fields.insert(field, edit.reuse(field).unwrap());
        }
        assert_eq!(session.product_fields(), None);

        session.collected_fields.insert(FieldName::Image, edit.reuse(FieldName::Image).unwrap());
        assert_eq!(session.product_fields(), Some(product.fields()));
    }

    #[test]
    fn test_session_serializes_to_json() {
        let mut session = Session::idle();
        session.state = WizardState::InStep {
            wizard: WizardKind::ProductUpsert,
            step: 2,
        };
        session.collected_fields.insert(FieldName::Name, FieldValue::Text("Lamp".to_string()));

        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}
