//! PawStore REST API transport.
//!
//! [`ApiClient`] is the one path every request takes. It owns the three
//! transport-level concerns:
//!
//! - **Credential dispatch** - each request is classified by the access
//!   table in [`routes`] and carries the matching bearer token: privileged
//!   requests get the administrator token or nothing (never the user token);
//!   standard requests get the user token, falling back to the administrator
//!   token, falling back to anonymous. Login/registration requests carry no
//!   credential at all.
//! - **Authorization-failure recovery** - a 401 on a non-exempt request
//!   invalidates exactly the credential bucket that failed and signals a
//!   redirect to the matching login surface. Handling is single-flight and
//!   never retries; the user re-authenticates.
//! - **Envelope unwrapping** - response bodies wrapped in the XOR envelope
//!   are opened transparently (see [`envelope`]).

pub mod envelope;
pub mod routes;
pub mod types;

pub use routes::{AccessBucket, classify, is_auth_exempt};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use pawstore_core::{BearerToken, CredentialKind};

use crate::config::ClientConfig;
use crate::credentials::CredentialVault;
use crate::nav::{LoginSurface, Navigator};
use crate::store::LocalStore;

use envelope::SealedResponse;
use types::ErrorDetail;

/// Errors from the API transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authorization failed; the named session was invalidated (when held).
    #[error("authorization failed for {kind} session")]
    Unauthorized {
        /// The credential bucket the failing request belonged to.
        kind: CredentialKind,
    },

    /// The backend rejected the request.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Backend-provided detail, or a body excerpt.
        message: String,
    },

    /// A sealed response could not be opened.
    #[error("response envelope error: {0}")]
    Envelope(#[from] envelope::EnvelopeError),

    /// The response body was not the expected JSON shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request path did not join onto the base URL.
    #[error("invalid request path {path}")]
    InvalidPath {
        /// The offending path.
        path: String,
    },
}

/// Client for the PawStore REST backend.
///
/// Cheap to clone; all clones share transport state, including the
/// authorization-failure latch.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    envelope_key: SecretString,
    vault: CredentialVault,
    navigator: Arc<dyn Navigator>,
    /// Single-flight latch for 401 handling. Set while an invalidation is
    /// being processed; reset when handling completes and on the next
    /// successful response.
    invalidating: AtomicBool,
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn LocalStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                http: reqwest::Client::new(),
                base_url: config.api_base_url.clone(),
                envelope_key: config.envelope_key.clone(),
                vault: CredentialVault::new(store),
                navigator,
                invalidating: AtomicBool::new(false),
            }),
        }
    }

    /// The credential vault shared with the session service.
    #[must_use]
    pub fn vault(&self) -> &CredentialVault {
        &self.inner.vault
    }

    /// The shared envelope key, for sealing login credentials.
    #[must_use]
    pub(crate) fn envelope_key(&self) -> &SecretString {
        &self.inner.envelope_key
    }

    // =========================================================================
    // Typed request helpers
    // =========================================================================

    /// Issue a GET request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is rejected, or the body does
    /// not decode.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.execute(Method::GET, path, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Issue a POST request with a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is rejected, or the body does
    /// not decode.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let value = self.execute(Method::POST, path, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Issue a PUT request with a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is rejected, or the body does
    /// not decode.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let value = self.execute(Method::PUT, path, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Issue a DELETE request, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, None).await?;
        Ok(())
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Pick the credential for a request, per the dispatch contract.
    fn credential_for(&self, bucket: AccessBucket) -> Option<BearerToken> {
        match bucket {
            // No silent fallback to the user token: a privileged request
            // without an admin session goes out anonymous and fails
            // server-side.
            AccessBucket::Privileged => self.inner.vault.token(CredentialKind::Admin),
            // An administrator browsing shared endpoints may use their admin
            // credential when no user session exists.
            AccessBucket::Standard => self
                .inner
                .vault
                .token(CredentialKind::User)
                .or_else(|| self.inner.vault.token(CredentialKind::Admin)),
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        let bucket = routes::classify(&method, path);
        let exempt = routes::is_auth_exempt(path);

        let url = self
            .inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| ApiError::InvalidPath { path: path.to_owned() })?;

        let mut request = self.inner.http.request(method.clone(), url);
        if !exempt && let Some(token) = self.credential_for(bucket) {
            request = request.bearer_auth(token.expose());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        debug!(%method, path, ?bucket, "dispatching request");
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED && !exempt {
            self.handle_auth_failure(bucket);
            return Err(ApiError::Unauthorized {
                kind: match bucket {
                    AccessBucket::Privileged => CredentialKind::Admin,
                    AccessBucket::Standard => CredentialKind::User,
                },
            });
        }

        if status.is_success() {
            // A live response proves the held credential still works.
            self.inner.invalidating.store(false, Ordering::SeqCst);
        }

        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorDetail>(&text)
                .map_or_else(|_| text.chars().take(200).collect(), |d| d.detail);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if text.is_empty() {
            return Ok(serde_json::Value::Null);
        }

        let value: serde_json::Value = serde_json::from_str(&text)?;
        self.unwrap_envelope(value)
    }

    /// Open the XOR envelope if the body carries one.
    fn unwrap_envelope(&self, value: serde_json::Value) -> Result<serde_json::Value, ApiError> {
        let Ok(sealed) = serde_json::from_value::<SealedResponse>(value.clone()) else {
            return Ok(value);
        };
        let opened = envelope::open(&sealed.encrypted_response, &self.inner.envelope_key)?;
        Ok(serde_json::from_str(&opened)?)
    }

    // =========================================================================
    // Authorization-failure handling
    // =========================================================================

    /// Invalidate the credential behind a 401 and signal a redirect.
    ///
    /// Re-derives the bucket the same way dispatch did, clears only that
    /// bucket's session, and leaves the other session untouched. Nothing is
    /// retried. The latch keeps simultaneous 401s (several in-flight
    /// requests against the same expired credential) from clearing and
    /// redirecting more than once.
    fn handle_auth_failure(&self, bucket: AccessBucket) {
        if self
            .inner
            .invalidating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        match bucket {
            AccessBucket::Privileged => {
                if self.inner.vault.holds(CredentialKind::Admin) {
                    warn!("admin session rejected by backend; invalidating");
                    self.inner.vault.clear_session(CredentialKind::Admin);
                    let location = self.inner.navigator.current_location();
                    if location.starts_with("/admin") && location != LoginSurface::Admin.path() {
                        self.inner.navigator.redirect(LoginSurface::Admin);
                    }
                }
            }
            AccessBucket::Standard => {
                if self.inner.vault.holds(CredentialKind::User) {
                    warn!("user session rejected by backend; invalidating");
                    self.inner.vault.clear_session(CredentialKind::User);
                    if self.inner.navigator.current_location() != LoginSurface::Storefront.path() {
                        self.inner.navigator.redirect(LoginSurface::Storefront);
                    }
                }
            }
        }

        self.inner.invalidating.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use wiremock::matchers::{bearer_token, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::store::{MemoryStore, keys};

    /// Navigator that records redirects for assertions.
    #[derive(Default)]
    struct RecordingNavigator {
        location: Mutex<String>,
        redirects: Mutex<Vec<LoginSurface>>,
    }

    impl RecordingNavigator {
        fn at(location: &str) -> Self {
            Self {
                location: Mutex::new(location.to_owned()),
                redirects: Mutex::new(Vec::new()),
            }
        }

        fn recorded(&self) -> Vec<LoginSurface> {
            self.redirects.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn current_location(&self) -> String {
            self.location.lock().unwrap().clone()
        }

        fn redirect(&self, surface: LoginSurface) {
            self.redirects.lock().unwrap().push(surface);
        }
    }

    fn client_at(
        server: &MockServer,
        store: Arc<MemoryStore>,
        navigator: Arc<RecordingNavigator>,
    ) -> ApiClient {
        let config = ClientConfig::new(Url::parse(&server.uri()).unwrap(), "pawstore_secret_key");
        ApiClient::new(&config, store, navigator)
    }

    #[tokio::test]
    async fn test_standard_request_prefers_user_token() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USER_TOKEN, "user-tok");
        store.set(keys::ADMIN_TOKEN, "admin-tok");

        Mock::given(method("GET"))
            .and(path("/cart/user/u1"))
            .and(bearer_token("user-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let api = client_at(&server, store, Arc::new(RecordingNavigator::default()));
        let _: serde_json::Value = api.get("/cart/user/u1").await.unwrap();
    }

    #[tokio::test]
    async fn test_standard_request_falls_back_to_admin_token() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.set(keys::ADMIN_TOKEN, "admin-tok");

        Mock::given(method("GET"))
            .and(path("/orders/o1/items"))
            .and(bearer_token("admin-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let api = client_at(&server, store, Arc::new(RecordingNavigator::default()));
        let _: serde_json::Value = api.get("/orders/o1/items").await.unwrap();
    }

    #[tokio::test]
    async fn test_privileged_request_never_uses_user_token() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        // Only a user token is held; a privileged request must go out
        // anonymous rather than borrow it.
        store.set(keys::USER_TOKEN, "user-tok");

        Mock::given(method("GET"))
            .and(path("/orders"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let navigator = Arc::new(RecordingNavigator::at("/admin/orders"));
        let api = client_at(&server, store.clone(), navigator.clone());
        let err = api.get::<serde_json::Value>("/orders").await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::Unauthorized {
                kind: CredentialKind::Admin
            }
        ));
        // The user token was not the failing credential; it survives, and no
        // admin session existed to invalidate or redirect for.
        assert_eq!(store.get(keys::USER_TOKEN), Some("user-tok".to_string()));
        assert!(navigator.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_privileged_401_invalidates_only_admin_session() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USER_TOKEN, "user-tok");
        store.set(keys::USER_IDENTITY, "{}");
        store.set(keys::ADMIN_TOKEN, "admin-tok");
        store.set(keys::ADMIN_IDENTITY, "{}");
        store.set("guest_cart_g1", "[]");

        Mock::given(method("PUT"))
            .and(path("/orders/o1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let navigator = Arc::new(RecordingNavigator::at("/admin/orders"));
        let api = client_at(&server, store.clone(), navigator.clone());
        let err = api
            .put::<serde_json::Value, _>("/orders/o1", &serde_json::json!({"status": "dispatched"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert_eq!(store.get(keys::ADMIN_TOKEN), None);
        assert_eq!(store.get(keys::ADMIN_IDENTITY), None);
        // User session and cart data are untouched.
        assert_eq!(store.get(keys::USER_TOKEN), Some("user-tok".to_string()));
        assert_eq!(store.get("guest_cart_g1"), Some("[]".to_string()));
        assert_eq!(navigator.recorded(), vec![LoginSurface::Admin]);
    }

    #[tokio::test]
    async fn test_standard_401_invalidates_only_user_session() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USER_TOKEN, "stale");
        store.set(keys::USER_IDENTITY, "{}");
        store.set(keys::ADMIN_TOKEN, "admin-tok");

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let navigator = Arc::new(RecordingNavigator::at("/profile"));
        let api = client_at(&server, store.clone(), navigator.clone());
        let err = api.get::<serde_json::Value>("/users/me").await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::Unauthorized {
                kind: CredentialKind::User
            }
        ));
        assert_eq!(store.get(keys::USER_TOKEN), None);
        assert_eq!(store.get(keys::ADMIN_TOKEN), Some("admin-tok".to_string()));
        assert_eq!(navigator.recorded(), vec![LoginSurface::Storefront]);
    }

    #[tokio::test]
    async fn test_no_redirect_when_already_on_login_surface() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USER_TOKEN, "stale");

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let navigator = Arc::new(RecordingNavigator::at("/auth"));
        let api = client_at(&server, store, navigator.clone());
        let _ = api.get::<serde_json::Value>("/users/me").await;

        assert!(navigator.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_login_endpoint_is_exempt_from_invalidation() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USER_TOKEN, "still-good");

        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "bad password"})),
            )
            .mount(&server)
            .await;

        let navigator = Arc::new(RecordingNavigator::at("/auth"));
        let api = client_at(&server, store.clone(), navigator.clone());
        let err = api
            .post::<serde_json::Value, _>("/users/login", &serde_json::json!({"encrypted": "x"}))
            .await
            .unwrap_err();

        // A failed login is an ordinary rejection, not a session loss.
        assert!(matches!(err, ApiError::Status { status: 401, .. }));
        assert_eq!(store.get(keys::USER_TOKEN), Some("still-good".to_string()));
        assert!(navigator.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_simultaneous_401s_redirect_once() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USER_TOKEN, "stale");

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let navigator = Arc::new(RecordingNavigator::at("/profile"));
        let api = client_at(&server, store, navigator.clone());

        let (a, b) = tokio::join!(
            api.get::<serde_json::Value>("/users/me"),
            api.get::<serde_json::Value>("/users/me"),
        );
        assert!(a.is_err() && b.is_err());

        // Whichever response lands second finds the token already gone and
        // must not clear or redirect again.
        assert_eq!(navigator.recorded(), vec![LoginSurface::Storefront]);
    }

    #[tokio::test]
    async fn test_sealed_response_is_opened() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());

        let key: SecretString = "pawstore_secret_key".into();
        let sealed = envelope::seal(r#"{"hello":"world"}"#, &key);
        Mock::given(method("GET"))
            .and(path("/inventory/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"encrypted_response": sealed})),
            )
            .mount(&server)
            .await;

        let api = client_at(&server, store, Arc::new(RecordingNavigator::default()));
        let body: serde_json::Value = api.get("/inventory/").await.unwrap();
        assert_eq!(body, serde_json::json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn test_backend_detail_surfaces_in_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inventory/"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"detail": "bad filter"})),
            )
            .mount(&server)
            .await;

        let api = client_at(
            &server,
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNavigator::default()),
        );
        let err = api.get::<serde_json::Value>("/inventory/").await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "bad filter");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
