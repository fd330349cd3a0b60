//! PawStore Core - Shared types library.
//!
//! This crate provides common types used across all PawStore components:
//! - `client` - session, cart, and back-office client for the PawStore API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, tokens, prices, emails,
//!   and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
