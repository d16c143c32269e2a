// Admin command router

//! # Admin Router
//!
//! First stop for every input in an admin chat. It owns the start triggers
//! of the wizards and the small admin actions that need no state (menu,
//! assortment listing, delete), and hands everything else to the
//! [`WizardEngine`].
//!
//! ## Routing Order
//!
//! 1. `category_<id>` and `delete_<id>` callbacks, in any state
//! 2. any input while a wizard is active goes to the engine, including
//!    text that happens to equal a menu label
//! 3. idle: `/admin`, the menu labels, and `edit_<id>` callbacks
//! 4. anything else goes to the engine, which ignores it while idle

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::AppConfig;
use crate::engine::{CatalogStorage, ChatTransport, StepOutcome, WizardEngine};
use crate::models::{CategoryId, ConversationId, Keyboard, ProductId, UserInput, WizardKind};
use crate::{Result, WizardError};

pub const ADMIN_COMMAND: &str = "/admin";
pub const CHOOSE_CATEGORY: &str = "Choose the category:";
pub const PRODUCTS_LISTED: &str = "Ok, list of products ⏫";
pub const PRODUCT_DELETED: &str = "Good deleted successfully!";
pub const PRODUCT_NOT_FOUND: &str = "This good no longer exists";

/// What the router did with one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Wizard(StepOutcome),
    Menu,
    CategoriesListed(usize),
    ProductsListed(usize),
    Deleted(ProductId),
    ProductMissing(ProductId),
}

/// Routes admin chat input to actions and wizards
pub struct AdminRouter {
    engine: Arc<WizardEngine>,
    catalog: Arc<dyn CatalogStorage>,
    transport: Arc<dyn ChatTransport>,
    config: AppConfig,
}

impl AdminRouter {
    pub fn new(
        engine: Arc<WizardEngine>,
        catalog: Arc<dyn CatalogStorage>,
        transport: Arc<dyn ChatTransport>,
        config: AppConfig,
    ) -> Self {
        AdminRouter {
            engine,
            catalog,
            transport,
            config,
        }
    }

    pub fn engine(&self) -> &Arc<WizardEngine> {
        &self.engine
    }

    pub async fn dispatch(&self, conversation: ConversationId, input: &UserInput) -> Result<Routed> {
        if let UserInput::Callback { data } = input {
            if let Some(id) = id_after(data, "category_") {
                return self.list_products(conversation, CategoryId(id)).await;
            }
            if let Some(id) = id_after(data, "delete_") {
                return self.delete_product(conversation, ProductId(id)).await;
            }
        }

        // Read without the conversation lock. If a wizard ends between this
        // check and the engine call, the input arrives at an idle session
        // and is ignored; a wizard starting in the gap makes `start` fail
        // with `SessionBusy`, which falls back to step input below.
        if self.engine.is_active(conversation).await {
            return self.to_engine(conversation, input).await;
        }

        match input {
            UserInput::Text { text } if text.trim() == ADMIN_COMMAND => self.show_menu(conversation).await,
            UserInput::Text { text } if *text == self.config.menu.add_product => {
                self.start(conversation, input, WizardKind::ProductUpsert).await
            }
            UserInput::Text { text } if *text == self.config.menu.banner => {
                self.start(conversation, input, WizardKind::BannerAssignment).await
            }
            UserInput::Text { text } if *text == self.config.menu.assortment => {
                self.list_categories(conversation).await
            }
            UserInput::Callback { data } => match id_after(data, "edit_") {
                Some(id) => self.start_edit(conversation, input, ProductId(id)).await,
                None => self.to_engine(conversation, input).await,
            },
            _ => self.to_engine(conversation, input).await,
        }
    }

    async fn to_engine(&self, conversation: ConversationId, input: &UserInput) -> Result<Routed> {
        Ok(Routed::Wizard(self.engine.handle(conversation, input).await?))
    }

    /// Start a wizard; if another input started one first, this input
    /// belongs to that wizard instead
    async fn start(&self, conversation: ConversationId, input: &UserInput, wizard: WizardKind) -> Result<Routed> {
        match self.engine.start(conversation, wizard).await {
            Ok(outcome) => Ok(Routed::Wizard(outcome)),
            Err(WizardError::SessionBusy { .. }) => self.to_engine(conversation, input).await,
            Err(err) => Err(err),
        }
    }

    async fn start_edit(&self, conversation: ConversationId, input: &UserInput, product_id: ProductId) -> Result<Routed> {
        match self.engine.start_edit(conversation, product_id).await {
            Ok(outcome) => Ok(Routed::Wizard(outcome)),
            Err(WizardError::SessionBusy { .. }) => self.to_engine(conversation, input).await,
            Err(WizardError::NotFound(_)) => {
                self.transport
                    .send_text(conversation, PRODUCT_NOT_FOUND, None)
                    .await?;
                Ok(Routed::ProductMissing(product_id))
            }
            Err(err) => Err(err),
        }
    }

    async fn show_menu(&self, conversation: ConversationId) -> Result<Routed> {
        self.transport
            .send_text(
                conversation,
                &self.config.menu.placeholder,
                Some(self.config.admin_keyboard()),
            )
            .await?;
        Ok(Routed::Menu)
    }

    async fn list_categories(&self, conversation: ConversationId) -> Result<Routed> {
        let categories = self.catalog.list_categories().await?;
        let buttons: Vec<(String, String)> = categories
            .iter()
            .map(|category| (category.name.clone(), format!("category_{}", category.id)))
            .collect();
        self.transport
            .send_text(conversation, CHOOSE_CATEGORY, Some(Keyboard::inline(buttons)))
            .await?;
        Ok(Routed::CategoriesListed(categories.len()))
    }

    async fn list_products(&self, conversation: ConversationId, category: CategoryId) -> Result<Routed> {
        let products = self.catalog.list_products(category).await?;
        debug!(%conversation, %category, count = products.len(), "listing products");

        for product in &products {
            let buttons = Keyboard::Inline {
                buttons: vec![
                    ("Delete".to_string(), format!("delete_{}", product.id)),
                    ("Edit".to_string(), format!("edit_{}", product.id)),
                ],
                row_width: 2,
            };
            self.transport
                .send_photo(conversation, &product.image, &product.caption(), Some(buttons))
                .await?;
        }
        self.transport
            .send_text(conversation, PRODUCTS_LISTED, None)
            .await?;
        Ok(Routed::ProductsListed(products.len()))
    }

    async fn delete_product(&self, conversation: ConversationId, product_id: ProductId) -> Result<Routed> {
        match self.catalog.delete_product(product_id).await {
            Ok(()) => {}
            Err(WizardError::NotFound(_)) => {
                self.transport
                    .send_text(conversation, PRODUCT_NOT_FOUND, None)
                    .await?;
                return Ok(Routed::ProductMissing(product_id));
            }
            Err(err) => return Err(err),
        }
        info!(%conversation, %product_id, "product deleted by admin");

        self.transport
            .send_animation(conversation, &self.config.deleted_animation)
            .await?;
        self.transport
            .send_text(conversation, PRODUCT_DELETED, None)
            .await?;
        Ok(Routed::Deleted(product_id))
    }
}

/// The numeric id in callback data like `delete_12`
fn id_after(data: &str, prefix: &str) -> Option<i64> {
    data.strip_prefix(prefix)?.parse().ok()
}
