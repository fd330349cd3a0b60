//! Credential persistence over the local store.
//!
//! The client holds at most one end-user session and at most one
//! administrator session at a time. Each session is a bearer token plus a
//! cached identity record; both live in the local store so they survive
//! reloads. The vault is the single place that knows their key layout -
//! dispatch, invalidation, and login/logout all go through it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pawstore_core::{BearerToken, CredentialKind, UserId};
use serde::{Deserialize, Serialize};

use crate::store::{LocalStore, keys};

/// Identity record cached alongside a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedIdentity {
    /// Backend user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
    /// Backend role string (`user` or `admin`).
    pub role: String,
    /// When this session was established.
    pub signed_in_at: DateTime<Utc>,
}

/// Typed access to the two persisted sessions.
#[derive(Clone)]
pub struct CredentialVault {
    store: Arc<dyn LocalStore>,
}

impl CredentialVault {
    /// Create a vault over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    fn token_key(kind: CredentialKind) -> &'static str {
        match kind {
            CredentialKind::User => keys::USER_TOKEN,
            CredentialKind::Admin => keys::ADMIN_TOKEN,
        }
    }

    fn identity_key(kind: CredentialKind) -> &'static str {
        match kind {
            CredentialKind::User => keys::USER_IDENTITY,
            CredentialKind::Admin => keys::ADMIN_IDENTITY,
        }
    }

    /// Read the bearer token for a session, if one is held.
    #[must_use]
    pub fn token(&self, kind: CredentialKind) -> Option<BearerToken> {
        self.store.get(Self::token_key(kind)).map(BearerToken::new)
    }

    /// Read the cached identity for a session.
    ///
    /// A record that no longer parses is treated as absent; it will be
    /// overwritten on the next login.
    #[must_use]
    pub fn identity(&self, kind: CredentialKind) -> Option<CachedIdentity> {
        let raw = self.store.get(Self::identity_key(kind))?;
        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(%kind, error = %e, "cached identity is corrupt; ignoring");
                None
            }
        }
    }

    /// Persist a session: token plus cached identity.
    pub fn store_session(
        &self,
        kind: CredentialKind,
        token: &BearerToken,
        identity: &CachedIdentity,
    ) {
        self.store.set(Self::token_key(kind), token.expose());
        if let Ok(raw) = serde_json::to_string(identity) {
            self.store.set(Self::identity_key(kind), &raw);
        }
    }

    /// Remove a session's token and cached identity.
    ///
    /// Never touches cart or wishlist keys: cart survival across credential
    /// loss is an explicit property of the client.
    pub fn clear_session(&self, kind: CredentialKind) {
        self.store.remove(Self::token_key(kind));
        self.store.remove(Self::identity_key(kind));
    }

    /// Whether a token is held for the given session.
    #[must_use]
    pub fn holds(&self, kind: CredentialKind) -> bool {
        self.store.get(Self::token_key(kind)).is_some()
    }
}
