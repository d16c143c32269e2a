// Catalog records - the data the wizards create and edit

//! # Catalog Records
//!
//! These are the persisted shapes the admin panel works with. The wizard
//! engine never stores them itself: it collects [`ProductFields`] step by
//! step and hands them to a [`CatalogStorage`](crate::engine::CatalogStorage)
//! at completion.
//!
//! ## Rust Learning Notes:
//!
//! ### Newtype Identifiers
//! `ProductId` and `CategoryId` wrap plain integers so the compiler refuses
//! to mix them up. A function that takes a `CategoryId` cannot be handed a
//! product id by accident, even though both are `i64` underneath.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of a stored product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an uploaded photo as the chat transport knows it
///
/// The engine treats this as opaque: it is whatever id the transport needs
/// to send the same image again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    pub fn new<S: Into<String>>(file_id: S) -> Self {
        PhotoRef(file_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PhotoRef {
    fn from(s: &str) -> Self {
        PhotoRef(s.to_string())
    }
}

impl std::fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product category offered as a button during the category step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// An informational page of the shop bot (main, catalog, cart, ...)
///
/// Banners are attached to pages by name, so the name is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoPage {
    pub name: String,
    pub image: Option<PhotoRef>,
}

/// The five values the product wizard collects
///
/// This is exactly what gets passed to the catalog on completion, both for
/// inserts and for updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub price: Decimal,
    pub image: PhotoRef,
}

/// A stored product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub price: Decimal,
    pub image: PhotoRef,
}

impl Product {
    /// Build a stored product from collected fields and an assigned id
    pub fn from_fields(id: ProductId, fields: ProductFields) -> Self {
        Product {
            id,
            name: fields.name,
            description: fields.description,
            category_id: fields.category_id,
            price: fields.price,
            image: fields.image,
        }
    }

    /// The fields of this product, as the wizard would have collected them
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.clone(),
            description: self.description.clone(),
            category_id: self.category_id,
            price: self.price,
            image: self.image.clone(),
        }
    }

    /// Caption used when the product is listed in the assortment view
    ///
    /// The price is rounded to two decimal places.
    pub fn caption(&self) -> String {
        format!(
            "<strong>{}</strong>\n{}\nPrice: {}💵",
            self.name,
            self.description,
            self.price.round_dp(2)
        )
    }
}
