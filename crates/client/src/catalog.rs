//! Read-only catalog surface.
//!
//! Every call here classifies as standard, so an anonymous shopper can
//! browse the full catalog with no credentials at all.

use thiserror::Error;
use tracing::instrument;

use pawstore_core::{CategoryId, ProductId};

use crate::api::types::{CategoryRecord, InventoryRecord, SubcategoryRecord};
use crate::api::{ApiClient, ApiError};

/// Errors from catalog reads.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The backend does not know the requested product.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),
}

/// Typed read access to inventory, categories and subcategories.
#[derive(Clone)]
pub struct CatalogService {
    api: ApiClient,
}

impl CatalogService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Every inventory item, including ones hidden from the storefront.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn inventory(&self) -> Result<Vec<InventoryRecord>, CatalogError> {
        Ok(self.api.get("/inventory/").await?)
    }

    /// Inventory items shoppers may see, in listing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn visible_inventory(&self) -> Result<Vec<InventoryRecord>, CatalogError> {
        let items: Vec<InventoryRecord> = self.api.get("/inventory/").await?;
        Ok(items.into_iter().filter(|item| item.is_visible).collect())
    }

    /// A single product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] on a backend 404, or the
    /// underlying error otherwise.
    #[instrument(skip(self))]
    pub async fn product(&self, product_id: &ProductId) -> Result<InventoryRecord, CatalogError> {
        match self.api.get(&format!("/inventory/{product_id}")).await {
            Ok(record) => Ok(record),
            Err(ApiError::Status { status: 404, .. }) => {
                Err(CatalogError::ProductNotFound(product_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All pet categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<CategoryRecord>, CatalogError> {
        Ok(self.api.get("/categories/").await?)
    }

    /// Subcategories under one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn subcategories(
        &self,
        category_id: &CategoryId,
    ) -> Result<Vec<SubcategoryRecord>, CatalogError> {
        Ok(self
            .api
            .get(&format!("/subcategories/category/{category_id}"))
            .await?)
    }
}
