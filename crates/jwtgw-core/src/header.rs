//! # JOSE Header Model
//!
//! The protected header shared by JWS and JWE compact tokens, plus the
//! closed algorithm enums the verifiers dispatch on.
//!
//! ## Security Invariant
//!
//! The algorithm is attacker-supplied: it is read from the token, not pinned
//! by configuration. Every algorithm enum here is closed over the allow-list
//! with an explicit `Unsupported` variant, so dispatch is an exhaustive
//! `match` and an unknown name can never reach a verifier. `none` is not
//! special-cased; it is simply `Unsupported("none")`.

use serde::Deserialize;

/// Decoded JOSE protected header.
///
/// Only the parameters jwtgw acts on are modelled. Unknown parameters are
/// ignored unless listed in `crit`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoseHeader {
    /// Signature or key-management algorithm.
    pub alg: String,
    /// Content-encryption algorithm (JWE only).
    #[serde(default)]
    pub enc: Option<String>,
    /// Media type of the complete token.
    #[serde(default)]
    pub typ: Option<String>,
    /// Media type of the payload.
    #[serde(default)]
    pub cty: Option<String>,
    /// Key identifier. Informational; jwtgw holds one key per slot.
    #[serde(default)]
    pub kid: Option<String>,
    /// Extension parameters the recipient must understand.
    #[serde(default)]
    pub crit: Option<Vec<String>>,
}

impl JoseHeader {
    /// Parse a header from its decoded JSON bytes.
    ///
    /// The header must be a JSON object with a string `alg`. Derived
    /// `Deserialize` also accepts a JSON array in field order, so the shape
    /// is checked before mapping.
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid JOSE header: {e}"))?;
        if !value.is_object() {
            return Err("invalid JOSE header: not a JSON object".to_string());
        }
        serde_json::from_value(value).map_err(|e| format!("invalid JOSE header: {e}"))
    }

    /// Whether the header marks any parameter as critical.
    ///
    /// jwtgw understands no extension parameters, so any `crit` entry makes
    /// the token unprocessable. An empty list is itself invalid per RFC 7515.
    pub fn has_critical_params(&self) -> bool {
        self.crit.is_some()
    }

    /// The declared signature algorithm.
    pub fn jws_algorithm(&self) -> JwsAlgorithm {
        JwsAlgorithm::from_name(&self.alg)
    }

    /// The declared key-management algorithm.
    pub fn key_management(&self) -> KeyManagementAlgorithm {
        KeyManagementAlgorithm::from_name(&self.alg)
    }

    /// The declared content-encryption algorithm.
    pub fn content_encryption(&self) -> ContentEncryption {
        match &self.enc {
            Some(enc) => ContentEncryption::from_name(enc),
            None => ContentEncryption::Unsupported(String::new()),
        }
    }
}

/// Signature algorithms accepted on the signed-token path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JwsAlgorithm {
    /// HMAC with SHA-256 over the shared secret.
    Hs256,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    Rs256,
    /// ECDSA on P-256 with SHA-256.
    Es256,
    /// Anything else, including `none`. Carries the declared name for logs.
    Unsupported(String),
}

impl JwsAlgorithm {
    /// Map a header `alg` value. Case-sensitive, per RFC 7515.
    pub fn from_name(name: &str) -> Self {
        match name {
            "HS256" => Self::Hs256,
            "RS256" => Self::Rs256,
            "ES256" => Self::Es256,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Return the JOSE name of this algorithm.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hs256 => "HS256",
            Self::Rs256 => "RS256",
            Self::Es256 => "ES256",
            Self::Unsupported(name) => name,
        }
    }
}

impl std::fmt::Display for JwsAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-management algorithms accepted on the encrypted-token path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyManagementAlgorithm {
    /// RSAES-OAEP with SHA-1 and MGF1-SHA-1.
    RsaOaep,
    /// RSAES-OAEP with SHA-256 and MGF1-SHA-256.
    RsaOaep256,
    /// Anything else (`RSA1_5`, `dir`, `ECDH-ES`, ...).
    Unsupported(String),
}

impl KeyManagementAlgorithm {
    /// Map a header `alg` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "RSA-OAEP" => Self::RsaOaep,
            "RSA-OAEP-256" => Self::RsaOaep256,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

/// Content-encryption algorithms accepted on the encrypted-token path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentEncryption {
    /// AES-128 in Galois/Counter Mode.
    A128Gcm,
    /// AES-192 in Galois/Counter Mode.
    A192Gcm,
    /// AES-256 in Galois/Counter Mode.
    A256Gcm,
    /// Anything else, including the CBC-HMAC family.
    Unsupported(String),
}

impl ContentEncryption {
    /// Map a header `enc` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "A128GCM" => Self::A128Gcm,
            "A192GCM" => Self::A192Gcm,
            "A256GCM" => Self::A256Gcm,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Required content-encryption key length in bytes.
    pub fn key_len(&self) -> Option<usize> {
        match self {
            Self::A128Gcm => Some(16),
            Self::A192Gcm => Some(24),
            Self::A256Gcm => Some(32),
            Self::Unsupported(_) => None,
        }
    }
}

/// GCM initialization vector length mandated by RFC 7518 §5.3.
pub const GCM_IV_LEN: usize = 12;

/// GCM authentication tag length mandated by RFC 7518 §5.3.
pub const GCM_TAG_LEN: usize = 16;
