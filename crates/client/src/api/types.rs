//! Wire types for the PawStore REST backend.
//!
//! Field names mirror the backend's JSON exactly (document IDs arrive as
//! `_id`); everything else in the crate works with the core newtypes.

use pawstore_core::{
    CartLineId, CategoryId, OrderId, OrderStatus, Price, ProductId, SubcategoryId, UserId,
    UserStatus, WishlistEntryId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Authentication
// =============================================================================

/// Sealed login request body (see [`crate::api::envelope`]).
#[derive(Debug, Serialize)]
pub struct SealedLoginRequest {
    /// Base64 of the XOR-sealed `{"email": .., "password": ..}` JSON.
    pub encrypted: String,
}

/// Plaintext credentials, sealed before they go on the wire.
#[derive(Debug, Serialize)]
pub struct LoginCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Signup request body.
#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: String,
}

/// User record as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

/// Successful login/signup response.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[allow(dead_code)]
    pub token_type: String,
    pub user: UserRecord,
}

/// User record as seen through the admin listing, which carries account
/// standing on top of the profile fields.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUserRecord {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    /// Accounts created before standing existed report none; treat as active.
    #[serde(default = "default_user_status")]
    pub status: UserStatus,
}

fn default_user_status() -> UserStatus {
    UserStatus::Active
}

/// Request body for changing a user's account standing.
#[derive(Debug, Serialize)]
pub struct UserStatusUpdate {
    pub status: UserStatus,
}

// =============================================================================
// Cart & Wishlist
// =============================================================================

/// Request body for creating a remote cart line.
#[derive(Debug, Serialize)]
pub struct NewCartLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A remote cart line: product reference plus quantity, no product details.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLineRecord {
    #[serde(rename = "_id")]
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Request body for updating a remote cart line's quantity.
#[derive(Debug, Serialize)]
pub struct CartQuantityUpdate {
    pub quantity: u32,
}

/// Request body for creating a remote wishlist entry.
#[derive(Debug, Serialize)]
pub struct NewWishlistEntry {
    pub user_id: UserId,
    pub product_id: ProductId,
}

/// A remote wishlist entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WishlistEntryRecord {
    #[serde(rename = "_id")]
    pub id: WishlistEntryId,
    pub user_id: UserId,
    pub product_id: ProductId,
}

// =============================================================================
// Catalog
// =============================================================================

/// An inventory item as listed by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryRecord {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub discount: Option<f64>,
    pub category_id: CategoryId,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub is_visible: bool,
}

/// Request body for creating or updating an inventory item.
#[derive(Debug, Serialize)]
pub struct InventoryUpsert {
    pub name: String,
    pub price: Price,
    pub category_id: CategoryId,
    pub subcategory: Option<String>,
    pub stock: i64,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub is_visible: bool,
}

/// A pet category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRecord {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Request body for creating or renaming a category.
#[derive(Debug, Serialize)]
pub struct CategoryUpsert {
    pub name: String,
    pub icon: Option<String>,
}

/// A product subcategory within a category.
#[derive(Debug, Clone, Deserialize)]
pub struct SubcategoryRecord {
    #[serde(rename = "_id")]
    pub id: SubcategoryId,
    pub name: String,
}

/// Request body for creating a subcategory.
#[derive(Debug, Serialize)]
pub struct NewSubcategory {
    pub category_id: CategoryId,
    pub name: String,
}

// =============================================================================
// Orders
// =============================================================================

/// An order as listed by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecord {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Price,
}

/// A line item within a single order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRecord {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
}

/// Request body for updating an order's status.
#[derive(Debug, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Error detail shape the backend uses for failures.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}
