//! Session service.
//!
//! Login, signup, and credential lifecycle for both identities: the shopper
//! session and the administrator session. Tokens and cached identity records
//! are persisted through the [`CredentialVault`]; cart and wishlist data are
//! never touched here - cart survival across logout is a deliberate property
//! of the client.

mod error;

pub use error::AuthError;

use chrono::Utc;
use secrecy::SecretString;
use tracing::{info, instrument};

use pawstore_core::{BearerToken, CredentialKind, Email, UserId};

use crate::api::envelope;
use crate::api::types::{
    AuthResponse, LoginCredentials, SealedLoginRequest, SignupRequest, UserRecord,
};
use crate::api::ApiClient;
use crate::credentials::CachedIdentity;

/// The signed-in identity handed back to the UI layer.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Backend user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
    /// Backend role string.
    pub role: String,
}

impl From<&UserRecord> for Profile {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.full_name.clone(),
            email: record.email.clone(),
            role: record.role.clone(),
        }
    }
}

/// Session service over the shared API client.
#[derive(Clone)]
pub struct SessionService {
    api: ApiClient,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Seal credentials for transport (obfuscation only; see
    /// [`crate::api::envelope`]).
    fn seal_credentials(
        email: &Email,
        password: &SecretString,
        key: &SecretString,
    ) -> Result<SealedLoginRequest, AuthError> {
        use secrecy::ExposeSecret;

        let plaintext = serde_json::to_string(&LoginCredentials {
            email: email.as_str(),
            password: password.expose_secret(),
        })
        .map_err(crate::api::ApiError::Decode)?;

        Ok(SealedLoginRequest {
            encrypted: envelope::seal(&plaintext, key),
        })
    }

    async fn login_request(
        &self,
        email: &str,
        password: SecretString,
    ) -> Result<AuthResponse, AuthError> {
        let email = Email::parse(email)?;
        let body = Self::seal_credentials(&email, &password, self.api.envelope_key())?;

        match self.api.post::<AuthResponse, _>("/users/login", &body).await {
            Ok(response) => Ok(response),
            Err(crate::api::ApiError::Status { status: 401 | 403, message }) => {
                Err(AuthError::InvalidCredentials(message))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn persist_session(&self, kind: CredentialKind, response: &AuthResponse) {
        let identity = CachedIdentity {
            id: response.user.id.clone(),
            name: response.user.full_name.clone(),
            email: response.user.email.clone(),
            role: response.user.role.clone(),
            signed_in_at: Utc::now(),
        };
        self.api.vault().store_session(
            kind,
            &BearerToken::new(response.access_token.clone()),
            &identity,
        );
    }

    // =========================================================================
    // Shopper session
    // =========================================================================

    /// Log in as a shopper.
    ///
    /// Any held admin session is dropped first so the fresher user token
    /// cannot be shadowed on shared endpoints.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the backend rejects the
    /// email/password pair.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: impl Into<SecretString>,
    ) -> Result<Profile, AuthError> {
        let response = self.login_request(email, password.into()).await?;

        self.api.vault().clear_session(CredentialKind::Admin);
        self.persist_session(CredentialKind::User, &response);
        info!(user_id = %response.user.id, "shopper signed in");

        Ok(Profile::from(&response.user))
    }

    /// Register a new shopper account and sign it in.
    ///
    /// The username defaults to the email's local part; the role is always
    /// `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is malformed or the backend rejects the
    /// registration.
    #[instrument(skip(self, password))]
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: impl Into<SecretString>,
    ) -> Result<Profile, AuthError> {
        use secrecy::ExposeSecret;

        let email = Email::parse(email)?;
        let password = password.into();
        let body = SignupRequest {
            username: email.local_part().to_owned(),
            email: email.as_str().to_owned(),
            full_name: name.to_owned(),
            password: password.expose_secret().to_owned(),
            role: "user".to_owned(),
        };

        let response: AuthResponse = self.api.post("/users/register", &body).await?;

        self.api.vault().clear_session(CredentialKind::Admin);
        self.persist_session(CredentialKind::User, &response);
        info!(user_id = %response.user.id, "shopper account created");

        Ok(Profile::from(&response.user))
    }

    /// Fetch the current user from the backend, validating the held token.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid user session is held.
    pub async fn current_user(&self) -> Result<Profile, AuthError> {
        let record: UserRecord = self.api.get("/users/me").await?;
        Ok(Profile::from(&record))
    }

    /// The cached shopper identity, if one is persisted.
    #[must_use]
    pub fn cached_user(&self) -> Option<CachedIdentity> {
        self.api.vault().identity(CredentialKind::User)
    }

    /// Log the shopper out.
    ///
    /// Clears both sessions (token-precedence hygiene) but leaves every cart
    /// and wishlist realm in place.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        self.api.vault().clear_session(CredentialKind::User);
        self.api.vault().clear_session(CredentialKind::Admin);
        info!("shopper signed out");
    }

    /// Request a password-reset email.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the request.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let _: serde_json::Value = self
            .api
            .post(
                "/users/forgot-password",
                &serde_json::json!({ "email": email.as_str() }),
            )
            .await?;
        Ok(())
    }

    /// Complete a password reset with the emailed token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or expired server-side.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: impl Into<SecretString>,
    ) -> Result<(), AuthError> {
        use secrecy::ExposeSecret;

        let password = new_password.into();
        let _: serde_json::Value = self
            .api
            .post(
                "/users/reset-password",
                &serde_json::json!({
                    "token": token,
                    "new_password": password.expose_secret(),
                }),
            )
            .await?;
        Ok(())
    }

    // =========================================================================
    // Administrator session
    // =========================================================================

    /// Log in as an administrator.
    ///
    /// Uses the same backend login endpoint as shoppers but requires the
    /// returned role to be `admin`; the session is stored under the admin
    /// credential slot.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAnAdmin` if the account lacks the admin role.
    #[instrument(skip(self, password))]
    pub async fn admin_login(
        &self,
        email: &str,
        password: impl Into<SecretString>,
    ) -> Result<Profile, AuthError> {
        let response = self.login_request(email, password.into()).await?;

        if response.user.role != "admin" {
            return Err(AuthError::NotAnAdmin);
        }

        self.persist_session(CredentialKind::Admin, &response);
        info!(user_id = %response.user.id, "administrator signed in");

        Ok(Profile::from(&response.user))
    }

    /// The cached administrator identity, if one is persisted.
    #[must_use]
    pub fn cached_admin(&self) -> Option<CachedIdentity> {
        self.api.vault().identity(CredentialKind::Admin)
    }

    /// Log the administrator out, leaving any shopper session in place.
    #[instrument(skip(self))]
    pub fn admin_logout(&self) {
        self.api.vault().clear_session(CredentialKind::Admin);
        info!("administrator signed out");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use crate::config::ClientConfig;
    use crate::nav::NoopNavigator;
    use crate::store::{keys, LocalStore, MemoryStore};

    fn auth_body(role: &str) -> serde_json::Value {
        serde_json::json!({
            "access_token": "tok-1",
            "token_type": "bearer",
            "user": {
                "_id": "u1",
                "username": "sam",
                "email": "sam@example.com",
                "full_name": "Sam Doe",
                "role": role,
            }
        })
    }

    fn service(server: &MockServer, store: Arc<MemoryStore>) -> SessionService {
        let config = ClientConfig::new(Url::parse(&server.uri()).unwrap(), "pawstore_secret_key");
        SessionService::new(ApiClient::new(&config, store, Arc::new(NoopNavigator)))
    }

    #[tokio::test]
    async fn test_login_seals_credentials_and_persists_session() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        // A stale admin session must be dropped by a shopper login.
        store.set(keys::ADMIN_TOKEN, "old-admin");

        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(move |request: &Request| {
                let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
                let sealed = body["encrypted"].as_str().unwrap();
                // Credentials must never travel in plaintext.
                let key: SecretString = "pawstore_secret_key".into();
                let opened = envelope::open(sealed, &key).unwrap();
                assert!(opened.contains("sam@example.com"));
                assert!(opened.contains("hunter42"));
                ResponseTemplate::new(200).set_body_json(auth_body("user"))
            })
            .expect(1)
            .mount(&server)
            .await;

        let session = service(&server, store.clone());
        let profile = session.login("sam@example.com", "hunter42").await.unwrap();

        assert_eq!(profile.id, UserId::new("u1"));
        assert_eq!(store.get(keys::USER_TOKEN), Some("tok-1".to_string()));
        assert_eq!(store.get(keys::ADMIN_TOKEN), None);
        assert_eq!(session.cached_user().unwrap().email, "sam@example.com");
    }

    #[tokio::test]
    async fn test_rejected_login_is_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let session = service(&server, Arc::new(MemoryStore::new()));
        let err = session.login("sam@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn test_signup_derives_username_from_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/register"))
            .respond_with(move |request: &Request| {
                let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
                assert_eq!(body["username"], "sam.doe");
                assert_eq!(body["role"], "user");
                ResponseTemplate::new(200).set_body_json(auth_body("user"))
            })
            .expect(1)
            .mount(&server)
            .await;

        let session = service(&server, Arc::new(MemoryStore::new()));
        session
            .signup("Sam Doe", "sam.doe@example.com", "hunter42")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_admin_login_requires_admin_role() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("user")))
            .mount(&server)
            .await;

        let session = service(&server, store.clone());
        let err = session
            .admin_login("sam@example.com", "hunter42")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::NotAnAdmin));
        assert_eq!(store.get(keys::ADMIN_TOKEN), None);
    }

    #[tokio::test]
    async fn test_admin_login_stores_admin_session() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("admin")))
            .mount(&server)
            .await;

        let session = service(&server, store.clone());
        session
            .admin_login("root@example.com", "hunter42")
            .await
            .unwrap();

        assert_eq!(store.get(keys::ADMIN_TOKEN), Some("tok-1".to_string()));
        assert_eq!(session.cached_admin().unwrap().role, "admin");
    }

    #[tokio::test]
    async fn test_logout_clears_sessions_but_never_cart_data() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USER_TOKEN, "t");
        store.set(keys::USER_IDENTITY, "{}");
        store.set(keys::ADMIN_TOKEN, "a");
        store.set("guest_cart_g1", "[{\"x\":1}]");
        store.set("guest_wishlist_g1", "[]");

        let session = service(&server, store.clone());
        session.logout();

        assert_eq!(store.get(keys::USER_TOKEN), None);
        assert_eq!(store.get(keys::USER_IDENTITY), None);
        assert_eq!(store.get(keys::ADMIN_TOKEN), None);
        assert_eq!(store.get("guest_cart_g1"), Some("[{\"x\":1}]".to_string()));
        assert_eq!(store.get("guest_wishlist_g1"), Some("[]".to_string()));
    }

    #[tokio::test]
    async fn test_admin_logout_keeps_user_session() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USER_TOKEN, "t");
        store.set(keys::ADMIN_TOKEN, "a");

        let session = service(&server, store.clone());
        session.admin_logout();

        assert_eq!(store.get(keys::ADMIN_TOKEN), None);
        assert_eq!(store.get(keys::USER_TOKEN), Some("t".to_string()));
    }
}
