//! Cart and wishlist state across both realms.
//!
//! Items a shopper wants live in one of two realms:
//!
//! - **Guest realm** - keyed by the persistent [`GuestId`] in the local
//!   store; holds full product snapshots plus quantities. Every mutation is
//!   applied synchronously and written through to the store before the call
//!   returns.
//! - **Remote realm** - owned by the backend, keyed by [`UserId`]; holds
//!   product references plus quantities. Mutations are awaited first; the
//!   in-memory mirror only changes after the backend confirms. On failure
//!   the mirror is left at its last-known-good state.
//!
//! Signing in triggers the one-shot merge: guest items are pushed to the
//! remote realm item by item (best effort, failures logged and skipped), the
//! guest realm is deleted, and the remote realm becomes authoritative.
//! Signing out never deletes anything in either realm.
//!
//! Cart totals and counts are recomputed from the current line set on every
//! read, so they can never go stale.

mod merge;

pub use merge::{MergeItem, MergeOutcome, MergeReport};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use pawstore_core::{CartLineId, GuestId, Price, ProductId, UserId, WishlistEntryId};

use crate::api::types::{
    CartLineRecord, CartQuantityUpdate, InventoryRecord, NewCartLine, NewWishlistEntry,
    WishlistEntryRecord,
};
use crate::api::{ApiClient, ApiError};
use crate::store::{LocalStore, keys, load_or_create_guest_id};

/// Errors from cart and wishlist operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Transport or backend error; the in-memory mirror was not changed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Product details captured when an item enters a cart or wishlist.
///
/// The guest realm stores these snapshots whole; for the remote realm they
/// are re-joined from the catalog, since the backend keeps references only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Backend product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price at capture time.
    pub price: Price,
    /// Primary image URL, if any.
    pub image: Option<String>,
}

impl From<&InventoryRecord> for ProductSnapshot {
    fn from(record: &InventoryRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            price: record.price,
            image: record.images.first().cloned(),
        }
    }
}

/// One cart line: a product and a positive quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product in the line.
    pub product: ProductSnapshot,
    /// Units of the product; always at least 1.
    pub quantity: u32,
}

/// Where the shopper currently is in the identity lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopperState {
    /// No account; the guest realm is authoritative.
    Anonymous,
    /// The merge transition is in flight.
    Authenticating,
    /// The remote realm for this user is authoritative.
    Authenticated(UserId),
}

/// Mutable cart state behind one lock.
#[derive(Default)]
struct CartState {
    shopper: Option<ShopperState>,
    lines: Vec<CartLine>,
    wishlist: Vec<ProductSnapshot>,
    /// Remote cart line IDs by product, for targeted update/delete calls.
    remote_lines: HashMap<ProductId, CartLineId>,
    /// Remote wishlist entry IDs by product.
    remote_wishlist: HashMap<ProductId, WishlistEntryId>,
}

/// Cart and wishlist service.
pub struct CartService {
    api: ApiClient,
    store: Arc<dyn LocalStore>,
    guest_id: GuestId,
    state: Mutex<CartState>,
}

impl CartService {
    /// Create the service, loading the guest realms for the persisted (or
    /// freshly generated) guest ID into the mirror.
    #[must_use]
    pub fn new(api: ApiClient, store: Arc<dyn LocalStore>) -> Self {
        let guest_id = load_or_create_guest_id(store.as_ref());
        let service = Self {
            api,
            store,
            guest_id,
            state: Mutex::new(CartState::default()),
        };
        service.reload_guest_realms();
        service
    }

    /// The anonymous shopper ID scoping the guest realms.
    #[must_use]
    pub const fn guest_id(&self) -> &GuestId {
        &self.guest_id
    }

    fn locked(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Guest realm persistence
    // =========================================================================

    fn load_realm<T: serde::de::DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.store.get(key) else {
            return T::default();
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                // A corrupt realm is unrecoverable; drop it rather than fail
                // every subsequent cart operation.
                warn!(key, error = %e, "stored realm is corrupt; discarding");
                self.store.remove(key);
                T::default()
            }
        }
    }

    fn save_guest_cart(&self, lines: &[CartLine]) {
        if let Ok(raw) = serde_json::to_string(lines) {
            self.store.set(&keys::guest_cart(&self.guest_id), &raw);
        }
    }

    fn save_guest_wishlist(&self, wishlist: &[ProductSnapshot]) {
        if let Ok(raw) = serde_json::to_string(wishlist) {
            self.store.set(&keys::guest_wishlist(&self.guest_id), &raw);
        }
    }

    /// Replace the mirror with the guest realms as persisted.
    fn reload_guest_realms(&self) {
        let lines: Vec<CartLine> = self.load_realm(&keys::guest_cart(&self.guest_id));
        let wishlist: Vec<ProductSnapshot> =
            self.load_realm(&keys::guest_wishlist(&self.guest_id));

        let mut state = self.locked();
        state.shopper = Some(ShopperState::Anonymous);
        state.lines = lines;
        state.wishlist = wishlist;
        state.remote_lines.clear();
        state.remote_wishlist.clear();
    }

    // =========================================================================
    // Derived values (always recomputed, never cached)
    // =========================================================================

    /// Current cart lines, in insertion order.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.locked().lines.clone()
    }

    /// Current wishlist entries, in insertion order.
    #[must_use]
    pub fn wishlist(&self) -> Vec<ProductSnapshot> {
        self.locked().wishlist.clone()
    }

    /// Sum of `price x quantity` over all current lines.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.locked()
            .lines
            .iter()
            .map(|line| line.product.price.line_total(line.quantity))
            .sum()
    }

    /// Sum of quantities over all current lines.
    #[must_use]
    pub fn cart_count(&self) -> u32 {
        self.locked().lines.iter().map(|line| line.quantity).sum()
    }

    /// Quantity of one product in the cart (0 when absent).
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.locked()
            .lines
            .iter()
            .find(|line| line.product.id == *product_id)
            .map_or(0, |line| line.quantity)
    }

    /// Whether a product is on the wishlist.
    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.locked()
            .wishlist
            .iter()
            .any(|product| product.id == *product_id)
    }

    /// Current identity state.
    #[must_use]
    pub fn shopper_state(&self) -> ShopperState {
        self.locked()
            .shopper
            .clone()
            .unwrap_or(ShopperState::Anonymous)
    }

    fn authenticated_user(&self) -> Option<UserId> {
        match self.locked().shopper.clone() {
            Some(ShopperState::Authenticated(user_id)) => Some(user_id),
            _ => None,
        }
    }

    // =========================================================================
    // Cart operations
    // =========================================================================

    /// Add a product to the cart.
    ///
    /// Adding a product already in the cart increases its quantity; the cart
    /// never holds two lines for one product.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote mutation fails while authenticated;
    /// the mirror is left unchanged. Guest-realm adds are infallible.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(
        &self,
        product: ProductSnapshot,
        quantity: u32,
    ) -> Result<(), CartError> {
        let quantity = quantity.max(1);

        if let Some(user_id) = self.authenticated_user() {
            let record: CartLineRecord = self
                .api
                .post(
                    "/cart",
                    &NewCartLine {
                        user_id,
                        product_id: product.id.clone(),
                        quantity,
                    },
                )
                .await?;

            let mut state = self.locked();
            state
                .remote_lines
                .insert(product.id.clone(), record.id.clone());
            if let Some(line) = state
                .lines
                .iter_mut()
                .find(|line| line.product.id == product.id)
            {
                // The backend folded the add into the existing line.
                line.quantity = record.quantity;
            } else {
                state.lines.push(CartLine {
                    product,
                    quantity: record.quantity,
                });
            }
            return Ok(());
        }

        let mut state = self.locked();
        if let Some(line) = state
            .lines
            .iter_mut()
            .find(|line| line.product.id == product.id)
        {
            line.quantity += quantity;
        } else {
            state.lines.push(CartLine { product, quantity });
        }
        self.save_guest_cart(&state.lines);
        Ok(())
    }

    /// Remove a product's line from the cart. Removing an absent product is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote mutation fails; the mirror is left
    /// unchanged.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, product_id: &ProductId) -> Result<(), CartError> {
        if self.authenticated_user().is_some() {
            let remote_id = self.locked().remote_lines.get(product_id).cloned();
            if let Some(remote_id) = remote_id {
                self.api.delete(&format!("/cart/{remote_id}")).await?;
            }
        }

        let mut state = self.locked();
        state.lines.retain(|line| line.product.id != *product_id);
        state.remote_lines.remove(product_id);
        if matches!(state.shopper, Some(ShopperState::Anonymous)) {
            self.save_guest_cart(&state.lines);
        }
        Ok(())
    }

    /// Set a product's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote mutation fails; the mirror is left
    /// unchanged.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_from_cart(product_id).await;
        }

        if self.authenticated_user().is_some() {
            let remote_id = self.locked().remote_lines.get(product_id).cloned();
            if let Some(remote_id) = remote_id {
                let record: CartLineRecord = self
                    .api
                    .put(
                        &format!("/cart/{remote_id}"),
                        &CartQuantityUpdate { quantity },
                    )
                    .await?;
                if let Some(line) = self
                    .locked()
                    .lines
                    .iter_mut()
                    .find(|line| line.product.id == *product_id)
                {
                    line.quantity = record.quantity;
                }
            }
            return Ok(());
        }

        let mut state = self.locked();
        if let Some(line) = state
            .lines
            .iter_mut()
            .find(|line| line.product.id == *product_id)
        {
            line.quantity = quantity;
        }
        self.save_guest_cart(&state.lines);
        Ok(())
    }

    /// Remove every line from the cart.
    ///
    /// While authenticated each remote line is deleted in turn; a failure
    /// stops the sweep with already-deleted lines gone from the mirror.
    ///
    /// # Errors
    ///
    /// Returns the first remote deletion error.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), CartError> {
        if self.authenticated_user().is_some() {
            let targets: Vec<(ProductId, CartLineId)> = self
                .locked()
                .remote_lines
                .iter()
                .map(|(product, line)| (product.clone(), line.clone()))
                .collect();

            for (product_id, remote_id) in targets {
                self.api.delete(&format!("/cart/{remote_id}")).await?;
                let mut state = self.locked();
                state.lines.retain(|line| line.product.id != product_id);
                state.remote_lines.remove(&product_id);
            }
            return Ok(());
        }

        let mut state = self.locked();
        state.lines.clear();
        self.store.remove(&keys::guest_cart(&self.guest_id));
        Ok(())
    }

    // =========================================================================
    // Wishlist operations
    // =========================================================================

    /// Add a product to the wishlist. Adding a product already present is a
    /// no-op (set semantics).
    ///
    /// # Errors
    ///
    /// Returns an error if the remote mutation fails; the mirror is left
    /// unchanged.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_wishlist(&self, product: ProductSnapshot) -> Result<(), CartError> {
        if self.is_in_wishlist(&product.id) {
            return Ok(());
        }

        if let Some(user_id) = self.authenticated_user() {
            let record: WishlistEntryRecord = self
                .api
                .post(
                    "/wishlist",
                    &NewWishlistEntry {
                        user_id,
                        product_id: product.id.clone(),
                    },
                )
                .await?;

            let mut state = self.locked();
            state.remote_wishlist.insert(product.id.clone(), record.id);
            state.wishlist.push(product);
            return Ok(());
        }

        let mut state = self.locked();
        state.wishlist.push(product);
        self.save_guest_wishlist(&state.wishlist);
        Ok(())
    }

    /// Remove a product from the wishlist. Removing an absent product is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote mutation fails; the mirror is left
    /// unchanged.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(&self, product_id: &ProductId) -> Result<(), CartError> {
        if self.authenticated_user().is_some() {
            let remote_id = self.locked().remote_wishlist.get(product_id).cloned();
            if let Some(remote_id) = remote_id {
                self.api.delete(&format!("/wishlist/{remote_id}")).await?;
            }
        }

        let mut state = self.locked();
        state.wishlist.retain(|product| product.id != *product_id);
        state.remote_wishlist.remove(product_id);
        if matches!(state.shopper, Some(ShopperState::Anonymous)) {
            self.save_guest_wishlist(&state.wishlist);
        }
        Ok(())
    }

    // =========================================================================
    // Identity transitions
    // =========================================================================

    /// The `Anonymous -> Authenticated` merge transition. Call exactly once
    /// per login/signup event.
    ///
    /// Pushes every guest cart line and wishlist entry to the account's
    /// remote realm (best effort, per-item outcomes collected), deletes the
    /// guest realms, and loads the remote realms into the mirror. Quantity
    /// collisions are folded by the backend's own uniqueness invariant.
    ///
    /// # Errors
    ///
    /// Individual item failures do not error - they are reported in the
    /// [`MergeReport`]. An error is returned only if the remote realms
    /// cannot be loaded afterwards; the shopper is authenticated regardless
    /// and [`CartService::refresh`] can be retried.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn sign_in(&self, user_id: UserId) -> Result<MergeReport, CartError> {
        let (local_lines, local_wishlist) = {
            let mut state = self.locked();
            state.shopper = Some(ShopperState::Authenticating);
            drop(state);
            (
                self.load_realm::<Vec<CartLine>>(&keys::guest_cart(&self.guest_id)),
                self.load_realm::<Vec<ProductSnapshot>>(&keys::guest_wishlist(&self.guest_id)),
            )
        };

        let mut report = MergeReport::default();

        for line in &local_lines {
            let outcome = match self
                .api
                .post::<CartLineRecord, _>(
                    "/cart",
                    &NewCartLine {
                        user_id: user_id.clone(),
                        product_id: line.product.id.clone(),
                        quantity: line.quantity,
                    },
                )
                .await
            {
                Ok(_) => MergeOutcome::Migrated,
                Err(e) => {
                    warn!(product_id = %line.product.id, error = %e, "cart line migration failed; skipping");
                    MergeOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            report.cart.push(MergeItem {
                product_id: line.product.id.clone(),
                outcome,
            });
        }

        for product in &local_wishlist {
            let outcome = match self
                .api
                .post::<WishlistEntryRecord, _>(
                    "/wishlist",
                    &NewWishlistEntry {
                        user_id: user_id.clone(),
                        product_id: product.id.clone(),
                    },
                )
                .await
            {
                Ok(_) => MergeOutcome::Migrated,
                Err(e) => {
                    warn!(product_id = %product.id, error = %e, "wishlist migration failed; skipping");
                    MergeOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            report.wishlist.push(MergeItem {
                product_id: product.id.clone(),
                outcome,
            });
        }

        // The guest realms are consumed whether or not every item made it;
        // the report is the record of what was lost.
        self.store.remove(&keys::guest_cart(&self.guest_id));
        self.store.remove(&keys::guest_wishlist(&self.guest_id));

        {
            let mut state = self.locked();
            state.shopper = Some(ShopperState::Authenticated(user_id.clone()));
            state.lines.clear();
            state.wishlist.clear();
            state.remote_lines.clear();
            state.remote_wishlist.clear();
        }

        info!(migrated = report.migrated(), total = report.total(), "guest realms merged");

        self.refresh().await?;
        Ok(report)
    }

    /// Reload the remote cart and wishlist into the mirror, joining product
    /// details from the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three reads fail; the mirror keeps its
    /// previous contents.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), CartError> {
        let Some(user_id) = self.authenticated_user() else {
            return Ok(());
        };

        let cart: Vec<CartLineRecord> =
            self.api.get(&format!("/cart/user/{user_id}")).await?;
        let wishlist: Vec<WishlistEntryRecord> =
            self.api.get(&format!("/wishlist/user/{user_id}")).await?;
        let inventory: Vec<InventoryRecord> = self.api.get("/inventory/").await?;

        let catalog: HashMap<&ProductId, &InventoryRecord> =
            inventory.iter().map(|item| (&item.id, item)).collect();

        let mut lines = Vec::with_capacity(cart.len());
        let mut remote_lines = HashMap::new();
        for record in &cart {
            let Some(item) = catalog.get(&record.product_id) else {
                warn!(product_id = %record.product_id, "cart references unlisted product; hiding line");
                continue;
            };
            remote_lines.insert(record.product_id.clone(), record.id.clone());
            lines.push(CartLine {
                product: ProductSnapshot::from(*item),
                quantity: record.quantity,
            });
        }

        let mut wishlist_products = Vec::with_capacity(wishlist.len());
        let mut remote_wishlist = HashMap::new();
        for record in &wishlist {
            let Some(item) = catalog.get(&record.product_id) else {
                warn!(product_id = %record.product_id, "wishlist references unlisted product; hiding entry");
                continue;
            };
            remote_wishlist.insert(record.product_id.clone(), record.id.clone());
            wishlist_products.push(ProductSnapshot::from(*item));
        }

        let mut state = self.locked();
        state.lines = lines;
        state.wishlist = wishlist_products;
        state.remote_lines = remote_lines;
        state.remote_wishlist = remote_wishlist;
        Ok(())
    }

    /// The `Authenticated -> Anonymous` transition.
    ///
    /// Reverts the mirror to the guest realms as persisted. Deletes nothing:
    /// the remote realm stays with the account, the guest realm stays with
    /// the profile.
    #[instrument(skip(self))]
    pub fn sign_out(&self) {
        self.reload_guest_realms();
        info!("cart reverted to guest realm");
    }
}
