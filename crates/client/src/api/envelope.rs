//! Response envelope and credential sealing.
//!
//! The backend optionally wraps JSON bodies in
//! `{"encrypted_response": "<base64(xor(body, key))>"}` and accepts login
//! credentials sealed the same way. The XOR keystream is a repeating shared
//! secret.
//!
//! This is obfuscation, NOT encryption: it only keeps credentials and
//! profile data out of plaintext transport logs. Transport security comes
//! from TLS; nothing in this module may be relied on as a security
//! mechanism.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Errors opening a sealed payload.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Unsealed bytes are not valid UTF-8 (wrong key, most likely).
    #[error("unsealed payload is not valid UTF-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

/// Wire shape of an enveloped response body.
#[derive(Debug, Deserialize)]
pub(crate) struct SealedResponse {
    pub encrypted_response: String,
}

fn xor(data: &[u8], key: &str) -> Vec<u8> {
    let key = key.as_bytes();
    data.iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect()
}

/// Seal a plaintext payload: XOR with the repeating key, then base64.
#[must_use]
pub fn seal(plaintext: &str, key: &SecretString) -> String {
    BASE64.encode(xor(plaintext.as_bytes(), key.expose_secret()))
}

/// Open a sealed payload.
///
/// # Errors
///
/// Returns an error if the payload is not base64 or does not unseal to
/// UTF-8 text.
pub fn open(sealed: &str, key: &SecretString) -> Result<String, EnvelopeError> {
    let raw = BASE64.decode(sealed)?;
    Ok(String::from_utf8(xor(&raw, key.expose_secret()))?)
}
