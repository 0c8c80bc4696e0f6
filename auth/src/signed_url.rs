//! HMAC-signed URLs.
//!
//! A signed URL carries an `expires` timestamp (optional) and a `signature`
//! query parameter: the base64url HMAC-SHA256 of `path?query`, where `query`
//! is every other parameter in its original order and encoding.
//!
//! ```
//! use dreamstart_auth::UrlSigner;
//! use chrono::Duration;
//!
//! let signer = UrlSigner::new("https://app.example.com", "app-key");
//! let url = signer.make_signed("/email-login", &[("email", "a@b.co")], Some(Duration::hours(1)));
//!
//! let parsed = url::Url::parse(&url).unwrap();
//! assert!(signer.verify(parsed.path(), parsed.query()).is_ok());
//! ```

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Query parameter holding the MAC.
pub const SIGNATURE_PARAM: &str = "signature";

/// Query parameter holding the expiry (unix seconds).
pub const EXPIRES_PARAM: &str = "expires";

/// Why a signed URL was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    /// No `signature` parameter.
    #[error("The URL is not signed")]
    Missing,

    /// The signature does not match.
    #[error("The URL signature is invalid")]
    Invalid,

    /// The signature matches but `expires` has passed.
    #[error("The URL signature has expired")]
    Expired,
}

/// Signs and verifies URLs with the application key.
#[derive(Clone)]
pub struct UrlSigner {
    base_url: String,
    secret: Vec<u8>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl UrlSigner {
    /// Create a signer rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Build an absolute signed URL for `path` with `params`.
    ///
    /// With `expires_in`, an `expires` parameter is appended before signing.
    #[must_use]
    pub fn make_signed(&self, path: &str, params: &[(&str, &str)], expires_in: Option<Duration>) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            query.append_pair(key, value);
        }
        if let Some(ttl) = expires_in {
            let expires = (Utc::now() + ttl).timestamp();
            query.append_pair(EXPIRES_PARAM, &expires.to_string());
        }
        let query = query.finish();

        let signature = self.sign(path, &query);
        let separator = if query.is_empty() { "" } else { "&" };

        format!(
            "{}{path}?{query}{separator}{SIGNATURE_PARAM}={signature}",
            self.base_url
        )
    }

    /// Verify a request's `path` and raw `query`.
    ///
    /// # Errors
    ///
    /// - [`SignatureError::Missing`] if there is no `signature` parameter
    /// - [`SignatureError::Invalid`] if the MAC does not match
    /// - [`SignatureError::Expired`] if `expires` is in the past
    pub fn verify(&self, path: &str, query: Option<&str>) -> Result<(), SignatureError> {
        let query = query.unwrap_or_default();

        let mut signature = None;
        let mut signed = Vec::new();
        for segment in query.split('&').filter(|s| !s.is_empty()) {
            let key = segment.split_once('=').map_or(segment, |(k, _)| k);
            if key == SIGNATURE_PARAM {
                signature = segment.split_once('=').map(|(_, v)| v);
            } else {
                signed.push(segment);
            }
        }

        let signature = signature.ok_or(SignatureError::Missing)?;
        let expected = self.sign(path, &signed.join("&"));
        if !constant_time_eq::constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(SignatureError::Invalid);
        }

        let expires = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == EXPIRES_PARAM)
            .map(|(_, v)| v.parse::<i64>());
        match expires {
            None => Ok(()),
            Some(Ok(at)) if at > Utc::now().timestamp() => Ok(()),
            Some(Ok(_)) => Err(SignatureError::Expired),
            Some(Err(_)) => Err(SignatureError::Invalid),
        }
    }

    fn sign(&self, path: &str, query: &str) -> String {
        // HMAC accepts keys of any length.
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret) else {
            return String::new();
        };
        mac.update(path.as_bytes());
        mac.update(b"?");
        mac.update(query.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}
