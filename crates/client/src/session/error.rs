//! Session error types.

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] pawstore_core::EmailError),

    /// The backend rejected the credentials.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Login succeeded but the account does not hold the admin role.
    #[error("account is not an administrator")]
    NotAnAdmin,

    /// Transport or backend error.
    #[error(transparent)]
    Api(#[from] ApiError),
}
