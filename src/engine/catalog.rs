// Catalog persistence used by the admin panel

//! # Catalog Storage
//!
//! The wizards read categories and info pages from the catalog while
//! validating, and write products and banners to it on completion. The
//! [`CatalogStorage`] trait is that boundary; [`InMemoryCatalog`] is the
//! default backend used by the console and by tests.
//!
//! Every operation can fail. The engine turns a failure during completion
//! into a user-visible message and never retries it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{Category, CategoryId, InfoPage, PhotoRef, Product, ProductFields, ProductId};
use crate::{Result, WizardError};

/// Persistence operations the admin panel consumes
#[async_trait]
pub trait CatalogStorage: Send + Sync {
    /// All categories, in display order
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// All info pages, in display order
    async fn list_info_pages(&self) -> Result<Vec<InfoPage>>;

    /// Products of one category
    async fn list_products(&self, category: CategoryId) -> Result<Vec<Product>>;

    /// `Ok(None)` when no product has that id
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    async fn create_product(&self, fields: ProductFields) -> Result<Product>;

    async fn update_product(&self, id: ProductId, fields: ProductFields) -> Result<Product>;

    async fn delete_product(&self, id: ProductId) -> Result<()>;

    /// Attach `image` as the banner of the page called `page_name`
    async fn set_banner_image(&self, page_name: &str, image: PhotoRef) -> Result<()>;

    /// Insert, or update when `existing` names the record being edited
    async fn upsert_product(&self, fields: ProductFields, existing: Option<ProductId>) -> Result<Product> {
        match existing {
            Some(id) => self.update_product(id, fields).await,
            None => self.create_product(fields).await,
        }
    }
}

#[derive(Debug, Default)]
struct CatalogData {
    categories: Vec<Category>,
    info_pages: Vec<InfoPage>,
    products: BTreeMap<ProductId, Product>,
    next_product_id: i64,
}

/// In-memory catalog
///
/// Rejects products whose category does not exist, the same way a foreign
/// key would in a database-backed catalog.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    data: RwLock<CatalogData>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog with the given categories (ids from 1) and empty info pages
    pub fn with_seed<C, P>(categories: C, info_pages: P) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let categories = categories
            .into_iter()
            .zip(1..)
            .map(|(name, id)| Category {
                id: CategoryId(id),
                name: name.into(),
            })
            .collect();
        let info_pages = info_pages
            .into_iter()
            .map(|name| InfoPage {
                name: name.into(),
                image: None,
            })
            .collect();

        InMemoryCatalog {
            data: RwLock::new(CatalogData {
                categories,
                info_pages,
                products: BTreeMap::new(),
                next_product_id: 1,
            }),
        }
    }

    /// Banner currently attached to a page
    pub async fn banner_of(&self, page_name: &str) -> Option<PhotoRef> {
        let data = self.data.read().await;
        data.info_pages
            .iter()
            .find(|page| page.name == page_name)
            .and_then(|page| page.image.clone())
    }

    pub async fn product_count(&self) -> usize {
        self.data.read().await.products.len()
    }
}

fn check_category(data: &CatalogData, category: CategoryId) -> Result<()> {
    if data.categories.iter().any(|c| c.id == category) {
        Ok(())
    } else {
        Err(WizardError::InvalidInput(format!("category {} does not exist", category)))
    }
}

#[async_trait]
impl CatalogStorage for InMemoryCatalog {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.data.read().await.categories.clone())
    }

    async fn list_info_pages(&self) -> Result<Vec<InfoPage>> {
        Ok(self.data.read().await.info_pages.clone())
    }

    async fn list_products(&self, category: CategoryId) -> Result<Vec<Product>> {
        let data = self.data.read().await;
        Ok(data
            .products
            .values()
            .filter(|product| product.category_id == category)
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.data.read().await.products.get(&id).cloned())
    }

    async fn create_product(&self, fields: ProductFields) -> Result<Product> {
        let mut data = self.data.write().await;
        check_category(&data, fields.category_id)?;

        // Default-constructed catalogs start counting at 0
        let id = ProductId(data.next_product_id.max(1));
        data.next_product_id = id.0 + 1;

        let product = Product::from_fields(id, fields);
        data.products.insert(id, product.clone());
        info!(product_id = %id, name = %product.name, "product created");
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, fields: ProductFields) -> Result<Product> {
        let mut data = self.data.write().await;
        check_category(&data, fields.category_id)?;

        let slot = data
            .products
            .get_mut(&id)
            .ok_or_else(|| WizardError::NotFound(format!("product {}", id)))?;
        *slot = Product::from_fields(id, fields);
        info!(product_id = %id, "product updated");
        Ok(slot.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut data = self.data.write().await;
        match data.products.remove(&id) {
            Some(_) => {
                info!(product_id = %id, "product deleted");
                Ok(())
            }
            None => Err(WizardError::NotFound(format!("product {}", id))),
        }
    }

    async fn set_banner_image(&self, page_name: &str, image: PhotoRef) -> Result<()> {
        let mut data = self.data.write().await;
        let page = data
            .info_pages
            .iter_mut()
            .find(|page| page.name == page_name)
            .ok_or_else(|| WizardError::NotFound(format!("info page {}", page_name)))?;
        debug!(page = %page_name, image = %image, "banner set");
        page.image = Some(image);
        Ok(())
    }
}
