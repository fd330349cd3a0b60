//! PawStore client library.
//!
//! The non-presentational core of the PawStore pet-supplies storefront and
//! its admin back-office: everything a UI layer needs to talk to the PawStore
//! REST backend and to a local key-value store.
//!
//! # Architecture
//!
//! - [`api`] - HTTP transport with credential dispatch and 401 recovery
//! - [`session`] - login, signup, and credential lifecycle for both the
//!   shopper and administrator identities
//! - [`cart`] - guest and authenticated cart/wishlist state, including the
//!   one-shot guest-to-account merge on login
//! - [`catalog`] - read access to inventory, categories, and subcategories
//! - [`admin`] - privileged back-office operations
//! - [`store`] - the local persistence seam (browser-local-storage shaped)
//!
//! All services are constructed once at application start and threaded
//! through explicitly; there are no ambient singletons.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pawstore_client::{api::ApiClient, cart::CartService, config::ClientConfig};
//! use pawstore_client::nav::NoopNavigator;
//! use pawstore_client::session::SessionService;
//! use pawstore_client::store::MemoryStore;
//!
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(MemoryStore::new());
//! let api = ApiClient::new(&config, store.clone(), Arc::new(NoopNavigator));
//! let session = SessionService::new(api.clone());
//! let cart = CartService::new(api.clone(), store.clone());
//!
//! let profile = session.login("shopper@example.com", "hunter42").await?;
//! let report = cart.sign_in(profile.id.clone()).await?;
//! println!("{}", report.summary());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod nav;
pub mod session;
pub mod store;
