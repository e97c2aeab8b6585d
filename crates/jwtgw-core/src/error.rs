//! # Error Types — Authentication Failure Taxonomy
//!
//! Defines the error types used throughout jwtgw. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Per-request errors ([`SignatureError`], [`DecryptionError`],
//!   [`AuthError`]) are internal. The filter boundary collapses every one of
//!   them into the same 401 response; the variants exist for logs and
//!   metrics only.
//! - [`DecryptionError`] has a single variant. Padding failures, tag
//!   mismatches, and malformed segments are indistinguishable by type.
//! - [`KeyLoadError`] is startup-only and fatal: the process refuses to
//!   serve when any key slot fails to load.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while verifying a signed (JWS) token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The compact form could not be decoded (bad base64url, header is not
    /// a JSON object, missing `alg`, unsupported critical headers).
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The header declared an algorithm outside the HS256/RS256/ES256
    /// allow-list. No key material was consulted.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature did not verify against the configured key.
    #[error("signature invalid")]
    SignatureInvalid,
}

/// Failure while decrypting an encrypted (JWE) token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptionError {
    /// Decryption or integrity-tag verification did not succeed.
    #[error("decryption failed")]
    DecryptionFailed,
}

/// Per-request authentication failure, as seen by the filter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// `Authorization` header absent, not ASCII, or not `Bearer `-prefixed.
    #[error("missing or malformed authorization header")]
    MissingOrMalformedHeader,

    /// Signed-token path failed.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Encrypted-token path failed.
    #[error(transparent)]
    Decryption(#[from] DecryptionError),
}

impl AuthError {
    /// Stable label for logs and metrics.
    ///
    /// Never sent to the caller.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingOrMalformedHeader => "missing_or_malformed_header",
            Self::Signature(SignatureError::MalformedToken(_)) => "malformed_token",
            Self::Signature(SignatureError::UnsupportedAlgorithm(_)) => "unsupported_algorithm",
            Self::Signature(SignatureError::SignatureInvalid) => "signature_invalid",
            Self::Decryption(DecryptionError::DecryptionFailed) => "decryption_failed",
        }
    }
}

/// One of the four key slots the filter needs before it can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySlot {
    /// Shared secret for HS256.
    Hs256Secret,
    /// RSA public key for RS256.
    Rs256PublicKey,
    /// P-256 public key for ES256.
    Es256PublicKey,
    /// RSA private key for JWE key unwrapping.
    JwePrivateKey,
}

impl KeySlot {
    /// All slots, in load order.
    pub const ALL: [KeySlot; 4] = [
        Self::Hs256Secret,
        Self::Rs256PublicKey,
        Self::Es256PublicKey,
        Self::JwePrivateKey,
    ];

    /// Environment variable that names the source file for this slot.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Hs256Secret => "HS256_SECRET_FILE",
            Self::Rs256PublicKey => "RS256_PUBLIC_KEY",
            Self::Es256PublicKey => "ES256_PUBLIC_KEY",
            Self::JwePrivateKey => "JWE_PRIVATE_KEY",
        }
    }

    /// Return the string representation of this slot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hs256Secret => "hs256_secret",
            Self::Rs256PublicKey => "rs256_public_key",
            Self::Es256PublicKey => "es256_public_key",
            Self::JwePrivateKey => "jwe_private_key",
        }
    }
}

impl std::fmt::Display for KeySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Startup-time failure to load key material. Fatal.
#[derive(Error, Debug)]
pub enum KeyLoadError {
    /// No source was configured for the slot.
    #[error("{key}: no source configured (set {})", .key.env_var())]
    Missing {
        /// The slot without a source.
        key: KeySlot,
    },

    /// The source file could not be read.
    #[error("{key}: cannot read {}: {source}", .path.display())]
    Unreadable {
        /// The slot being loaded.
        key: KeySlot,
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source was read but is not a usable key of the expected type.
    #[error("{key}: invalid key material: {reason}")]
    Invalid {
        /// The slot being loaded.
        key: KeySlot,
        /// What was wrong with it.
        reason: String,
    },
}

impl KeyLoadError {
    /// The slot that failed.
    pub fn slot(&self) -> KeySlot {
        match self {
            Self::Missing { key } | Self::Unreadable { key, .. } | Self::Invalid { key, .. } => {
                *key
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_are_distinct() {
        let errors = [
            AuthError::MissingOrMalformedHeader,
            SignatureError::MalformedToken("x".into()).into(),
            SignatureError::UnsupportedAlgorithm("none".into()).into(),
            SignatureError::SignatureInvalid.into(),
            DecryptionError::DecryptionFailed.into(),
        ];
        let mut reasons: Vec<&str> = errors.iter().map(AuthError::reason).collect();
        reasons.sort_unstable();
        reasons.dedup();
        assert_eq!(reasons.len(), errors.len());
    }

    #[test]
    fn signature_error_converts_transparently() {
        let err: AuthError = SignatureError::UnsupportedAlgorithm("HS512".into()).into();
        assert_eq!(err.to_string(), "unsupported algorithm: HS512");
        assert_eq!(err.reason(), "unsupported_algorithm");
    }

    #[test]
    fn decryption_error_display_carries_no_detail() {
        let err: AuthError = DecryptionError::DecryptionFailed.into();
        assert_eq!(err.to_string(), "decryption failed");
    }

    #[test]
    fn missing_key_names_env_var() {
        let err = KeyLoadError::Missing {
            key: KeySlot::JwePrivateKey,
        };
        let msg = err.to_string();
        assert!(msg.contains("jwe_private_key"));
        assert!(msg.contains("JWE_PRIVATE_KEY"));
        assert_eq!(err.slot(), KeySlot::JwePrivateKey);
    }

    #[test]
    fn unreadable_key_includes_path_and_cause() {
        let err = KeyLoadError::Unreadable {
            key: KeySlot::Hs256Secret,
            path: PathBuf::from("/run/secrets/hs256"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/run/secrets/hs256"));
        assert!(msg.contains("file missing"));
    }

    #[test]
    fn slot_env_vars_are_unique() {
        let mut vars: Vec<&str> = KeySlot::ALL.iter().map(KeySlot::env_var).collect();
        vars.sort_unstable();
        vars.dedup();
        assert_eq!(vars.len(), 4);
    }
}
