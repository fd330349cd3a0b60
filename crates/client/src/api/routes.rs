//! Declarative request-access classification.
//!
//! Every outgoing request is classified as `Privileged` (administrator
//! credential required) or `Standard` by a single table consulted both when
//! attaching a bearer token and when deciding which credential an
//! authorization failure invalidates. Using one table for both keeps the two
//! decisions identical by construction.
//!
//! Classification is a pure function of `(method, path)`. Trailing slashes
//! are insignificant (`/inventory/` and `/inventory` classify alike).

use reqwest::Method;

/// The credential bucket a request falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessBucket {
    /// Requires the administrator credential; the user credential is never
    /// substituted.
    Privileged,
    /// Uses the user credential, falling back to the administrator
    /// credential, falling back to anonymous.
    Standard,
}

/// A single row of the access table. `*` matches exactly one path segment.
struct Rule {
    method: Method,
    pattern: &'static str,
}

/// Self-service user endpoints that stay `Standard` even though they live
/// under `/users`.
const SELF_SERVICE_USERS: &[&str] = &[
    "/users/me",
    "/users/login",
    "/users/register",
    "/users/forgot-password",
    "/users/reset-password",
    "/users/change-password",
];

/// Endpoints that carry no credential and are exempt from 401 handling:
/// a rejected login attempt must not invalidate an unrelated session.
const AUTH_EXEMPT: &[&str] = &[
    "/users/login",
    "/users/register",
    "/users/forgot-password",
    "/users/reset-password",
];

/// Administrative resources, by method and path pattern.
///
/// Reads of inventory, categories, and subcategories stay `Standard`: the
/// storefront browses them anonymously. Single-order item reads
/// (`GET /orders/*/items`) are shared with shoppers and stay `Standard` too.
fn privileged_rules() -> &'static [Rule] {
    static RULES: &[Rule] = &[
        // User management (list + mutate); self-service paths are carved out
        // before this table is consulted.
        Rule { method: Method::GET, pattern: "/users" },
        Rule { method: Method::PUT, pattern: "/users/*" },
        Rule { method: Method::DELETE, pattern: "/users/*" },
        // Inventory management.
        Rule { method: Method::POST, pattern: "/inventory" },
        Rule { method: Method::PUT, pattern: "/inventory/*" },
        Rule { method: Method::DELETE, pattern: "/inventory/*" },
        // Category management.
        Rule { method: Method::POST, pattern: "/categories" },
        Rule { method: Method::PUT, pattern: "/categories/*" },
        Rule { method: Method::DELETE, pattern: "/categories/*" },
        // Subcategory mutation (reads are shared).
        Rule { method: Method::POST, pattern: "/subcategories" },
        Rule { method: Method::PUT, pattern: "/subcategories/*" },
        Rule { method: Method::DELETE, pattern: "/subcategories/*" },
        // Full order listing and single-order status mutation.
        Rule { method: Method::GET, pattern: "/orders" },
        Rule { method: Method::PUT, pattern: "/orders/*" },
    ];
    RULES
}

/// Strip query string and trailing slash, keeping the leading one.
fn normalize(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// Segment-wise pattern match; `*` matches exactly one segment.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.trim_matches('/').split('/');
    let mut path_segments = path.trim_matches('/').split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) => {
                if p != "*" && p != s {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Classify a request into its credential bucket.
#[must_use]
pub fn classify(method: &Method, path: &str) -> AccessBucket {
    let path = normalize(path);

    if SELF_SERVICE_USERS.contains(&path) {
        return AccessBucket::Standard;
    }

    let privileged = privileged_rules()
        .iter()
        .any(|r| r.method == *method && pattern_matches(r.pattern, path));

    if privileged {
        AccessBucket::Privileged
    } else {
        AccessBucket::Standard
    }
}

/// Whether a request is a login/registration request, exempt from both
/// credential attachment and 401 invalidation handling.
#[must_use]
pub fn is_auth_exempt(path: &str) -> bool {
    AUTH_EXEMPT.contains(&normalize(path))
}
