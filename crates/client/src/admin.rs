//! Privileged management surface.
//!
//! Every mutation here (and the user/order listings) classifies as
//! privileged, so requests go out under the admin credential or none at
//! all. Callers establish that credential through
//! [`SessionService::admin_login`](crate::session::SessionService::admin_login).

use thiserror::Error;
use tracing::instrument;

use pawstore_core::{CategoryId, OrderId, OrderStatus, ProductId, SubcategoryId, UserId,
    UserStatus};

use crate::api::types::{
    AdminUserRecord, CategoryRecord, CategoryUpsert, InventoryRecord, InventoryUpsert,
    NewSubcategory, OrderItemRecord, OrderRecord, OrderStatusUpdate, SubcategoryRecord,
    UserStatusUpdate,
};
use crate::api::{ApiClient, ApiError};

/// Errors from the management surface.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Typed privileged calls: inventory, categories, users and orders.
#[derive(Clone)]
pub struct AdminService {
    api: ApiClient,
}

impl AdminService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Create an inventory item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self, item), fields(name = %item.name))]
    pub async fn create_product(&self, item: &InventoryUpsert) -> Result<InventoryRecord, AdminError> {
        Ok(self.api.post("/inventory/", item).await?)
    }

    /// Replace an inventory item's details.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self, item))]
    pub async fn update_product(
        &self,
        product_id: &ProductId,
        item: &InventoryUpsert,
    ) -> Result<InventoryRecord, AdminError> {
        Ok(self.api.put(&format!("/inventory/{product_id}"), item).await?)
    }

    /// Delete an inventory item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: &ProductId) -> Result<(), AdminError> {
        Ok(self.api.delete(&format!("/inventory/{product_id}")).await?)
    }

    // =========================================================================
    // Categories & subcategories
    // =========================================================================

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self, category), fields(name = %category.name))]
    pub async fn create_category(
        &self,
        category: &CategoryUpsert,
    ) -> Result<CategoryRecord, AdminError> {
        Ok(self.api.post("/categories/", category).await?)
    }

    /// Rename a category or change its icon.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self, category))]
    pub async fn update_category(
        &self,
        category_id: &CategoryId,
        category: &CategoryUpsert,
    ) -> Result<CategoryRecord, AdminError> {
        Ok(self
            .api
            .put(&format!("/categories/{category_id}"), category)
            .await?)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: &CategoryId) -> Result<(), AdminError> {
        Ok(self.api.delete(&format!("/categories/{category_id}")).await?)
    }

    /// Add a subcategory under a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self), fields(name = %name))]
    pub async fn create_subcategory(
        &self,
        category_id: &CategoryId,
        name: &str,
    ) -> Result<SubcategoryRecord, AdminError> {
        Ok(self
            .api
            .post(
                "/subcategories/",
                &NewSubcategory {
                    category_id: category_id.clone(),
                    name: name.to_owned(),
                },
            )
            .await?)
    }

    /// Delete a subcategory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn delete_subcategory(
        &self,
        subcategory_id: &SubcategoryId,
    ) -> Result<(), AdminError> {
        Ok(self
            .api
            .delete(&format!("/subcategories/{subcategory_id}"))
            .await?)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// List every registered user with account standing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<AdminUserRecord>, AdminError> {
        Ok(self.api.get("/users/").await?)
    }

    /// Change a user's account standing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn set_user_status(
        &self,
        user_id: &UserId,
        status: UserStatus,
    ) -> Result<AdminUserRecord, AdminError> {
        Ok(self
            .api
            .put(&format!("/users/{user_id}"), &UserStatusUpdate { status })
            .await?)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// List every order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<OrderRecord>, AdminError> {
        Ok(self.api.get("/orders").await?)
    }

    /// Line items of one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItemRecord>, AdminError> {
        Ok(self.api.get(&format!("/orders/{order_id}/items")).await?)
    }

    /// Advance an order through its fulfillment states.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn set_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<OrderRecord, AdminError> {
        Ok(self
            .api
            .put(&format!("/orders/{order_id}"), &OrderStatusUpdate { status })
            .await?)
    }
}
