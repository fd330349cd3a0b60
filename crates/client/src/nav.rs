//! Navigation seam for credential-invalidation redirects.
//!
//! When an authorization failure invalidates a credential, the client asks
//! the embedding UI to move the user to the matching login surface. The
//! client never navigates on its own; it only signals through this trait.

/// The two login entry points of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginSurface {
    /// Standard shopper login page (`/auth`).
    Storefront,
    /// Administrator login page (`/admin/login`).
    Admin,
}

impl LoginSurface {
    /// Path of the login surface within the application.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Storefront => "/auth",
            Self::Admin => "/admin/login",
        }
    }
}

/// Host-side navigation hooks.
pub trait Navigator: Send + Sync {
    /// Current application-relative location (e.g. `/admin/orders`).
    fn current_location(&self) -> String;

    /// Navigate to a login surface.
    fn redirect(&self, surface: LoginSurface);
}

/// A [`Navigator`] that reports no location and ignores redirects.
///
/// Suitable for headless embedders that surface invalidation through the
/// returned errors instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_location(&self) -> String {
        String::new()
    }

    fn redirect(&self, _surface: LoginSurface) {}
}
