//! # Key Material
//!
//! Loads the four keys the filter needs and holds them, immutable, for the
//! life of the process.
//!
//! ## Security Invariant
//!
//! - [`KeyMaterial`] can only be built by [`KeyMaterial::load`], which
//!   parses every slot. A value of this type is proof that all four keys
//!   are usable; there is no partially-loaded state.
//! - Secret bytes (the HS256 secret and the JWE private key) are zeroized
//!   on drop and never appear in `Debug` output.
//! - Loading happens once at startup. Nothing here runs per request.

use std::fmt;
use std::path::{Path, PathBuf};

use jwtgw_core::{KeyLoadError, KeySlot};
use p256::pkcs8::DecodePublicKey as _;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::der::pem;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

/// Minimum HS256 secret length in bytes (256 bits, RFC 7518 §3.2).
pub const MIN_HMAC_SECRET_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where one key slot is read from.
#[derive(Clone)]
pub enum KeySource {
    /// In-memory contents.
    Bytes(Vec<u8>),
    /// A file read at load time.
    File(PathBuf),
}

impl KeySource {
    /// Interpret a configured location.
    ///
    /// A leading `file:` prefix is accepted and stripped, so values written
    /// for Spring-style resource locations keep working.
    pub fn from_location(location: &str) -> Self {
        let path = location.strip_prefix("file:").unwrap_or(location);
        Self::File(PathBuf::from(path))
    }

    fn read(&self, key: KeySlot) -> Result<Zeroizing<Vec<u8>>, KeyLoadError> {
        match self {
            Self::Bytes(bytes) => Ok(Zeroizing::new(bytes.clone())),
            Self::File(path) => std::fs::read(path)
                .map(Zeroizing::new)
                .map_err(|source| KeyLoadError::Unreadable {
                    key,
                    path: path.clone(),
                    source,
                }),
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "Bytes([REDACTED; {}])", bytes.len()),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// Configured sources for all four key slots.
#[derive(Debug, Clone, Default)]
pub struct KeySources {
    pub hs256_secret: Option<KeySource>,
    pub rs256_public_key: Option<KeySource>,
    pub es256_public_key: Option<KeySource>,
    pub jwe_private_key: Option<KeySource>,
}

impl KeySources {
    /// Read slot locations from the process environment.
    ///
    /// Each slot's variable is named by [`KeySlot::env_var`]. Unset or empty
    /// variables leave the slot unconfigured; [`KeyMaterial::load`] reports
    /// them as [`KeyLoadError::Missing`].
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build sources from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut sources = Self::default();
        for slot in KeySlot::ALL {
            if let Some(location) = lookup(slot.env_var()).filter(|v| !v.trim().is_empty()) {
                sources.set(slot, KeySource::from_location(location.trim()));
            }
        }
        sources
    }

    /// The source configured for `slot`, if any.
    pub fn get(&self, slot: KeySlot) -> Option<&KeySource> {
        match slot {
            KeySlot::Hs256Secret => self.hs256_secret.as_ref(),
            KeySlot::Rs256PublicKey => self.rs256_public_key.as_ref(),
            KeySlot::Es256PublicKey => self.es256_public_key.as_ref(),
            KeySlot::JwePrivateKey => self.jwe_private_key.as_ref(),
        }
    }

    /// Configure `slot`, replacing any previous source.
    pub fn set(&mut self, slot: KeySlot, source: KeySource) {
        let field = match slot {
            KeySlot::Hs256Secret => &mut self.hs256_secret,
            KeySlot::Rs256PublicKey => &mut self.rs256_public_key,
            KeySlot::Es256PublicKey => &mut self.es256_public_key,
            KeySlot::JwePrivateKey => &mut self.jwe_private_key,
        };
        *field = Some(source);
    }

    /// Override `slot` with a file path.
    pub fn with_file(mut self, slot: KeySlot, path: impl AsRef<Path>) -> Self {
        self.set(slot, KeySource::File(path.as_ref().to_path_buf()));
        self
    }

    fn read(&self, slot: KeySlot) -> Result<Zeroizing<Vec<u8>>, KeyLoadError> {
        self.get(slot)
            .ok_or(KeyLoadError::Missing { key: slot })?
            .read(slot)
    }
}

// ---------------------------------------------------------------------------
// KeyMaterial
// ---------------------------------------------------------------------------

/// The loaded, validated key set.
///
/// Shared across request tasks behind an `Arc`; every accessor takes `&self`.
pub struct KeyMaterial {
    hmac_secret: Zeroizing<Vec<u8>>,
    rsa_verify_key: rsa::pkcs1v15::VerifyingKey<Sha256>,
    rsa_verify_bits: usize,
    ec_verify_key: p256::ecdsa::VerifyingKey,
    rsa_decrypt_key: RsaPrivateKey,
}

impl KeyMaterial {
    /// Read and parse every slot.
    ///
    /// Slots are loaded in [`KeySlot::ALL`] order and the first failure is
    /// returned.
    pub fn load(sources: &KeySources) -> Result<Self, KeyLoadError> {
        let hmac_secret = parse_hmac_secret(sources.read(KeySlot::Hs256Secret)?)?;

        let rsa_public = with_pem(sources, KeySlot::Rs256PublicKey, parse_rsa_public)?;
        let rsa_verify_bits = rsa_public.size() * 8;

        let ec_verify_key = with_pem(sources, KeySlot::Es256PublicKey, parse_ec_public)?;
        let rsa_decrypt_key = with_pem(sources, KeySlot::JwePrivateKey, parse_rsa_private)?;

        Ok(Self {
            hmac_secret,
            rsa_verify_key: rsa::pkcs1v15::VerifyingKey::new(rsa_public),
            rsa_verify_bits,
            ec_verify_key,
            rsa_decrypt_key,
        })
    }

    /// One human-readable line per slot, for operator output.
    ///
    /// Describes key types and sizes only. Never includes key bytes.
    pub fn describe(&self) -> Vec<(KeySlot, String)> {
        vec![
            (
                KeySlot::Hs256Secret,
                format!("{}-byte shared secret", self.hmac_secret.len()),
            ),
            (
                KeySlot::Rs256PublicKey,
                format!("RSA-{} public key", self.rsa_verify_bits),
            ),
            (KeySlot::Es256PublicKey, "P-256 public key".to_string()),
            (
                KeySlot::JwePrivateKey,
                format!("RSA-{} private key", self.rsa_decrypt_key.size() * 8),
            ),
        ]
    }

    pub(crate) fn hmac_secret(&self) -> &[u8] {
        &self.hmac_secret
    }

    pub(crate) fn rsa_verify_key(&self) -> &rsa::pkcs1v15::VerifyingKey<Sha256> {
        &self.rsa_verify_key
    }

    pub(crate) fn ec_verify_key(&self) -> &p256::ecdsa::VerifyingKey {
        &self.ec_verify_key
    }

    pub(crate) fn rsa_decrypt_key(&self) -> &RsaPrivateKey {
        &self.rsa_decrypt_key
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("hmac_secret", &"[REDACTED]")
            .field("rsa_verify_bits", &self.rsa_verify_bits)
            .field("ec_verify_key", &"P-256")
            .field("rsa_decrypt_key", &"[REDACTED]")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Surrounding ASCII whitespace is dropped, as token producers trim the
/// same secret file before signing.
fn parse_hmac_secret(raw: Zeroizing<Vec<u8>>) -> Result<Zeroizing<Vec<u8>>, KeyLoadError> {
    let start = raw.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(raw.len());
    let end = raw
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |last| last + 1);
    let bytes = Zeroizing::new(raw[start..end].to_vec());
    if bytes.len() < MIN_HMAC_SECRET_LEN {
        return Err(KeyLoadError::Invalid {
            key: KeySlot::Hs256Secret,
            reason: format!(
                "secret must be at least {MIN_HMAC_SECRET_LEN} bytes, got {}",
                bytes.len()
            ),
        });
    }
    Ok(bytes)
}

/// Read `slot` as UTF-8 PEM text and hand it to `parse`.
fn with_pem<T>(
    sources: &KeySources,
    slot: KeySlot,
    parse: fn(&str) -> Result<T, String>,
) -> Result<T, KeyLoadError> {
    let bytes = sources.read(slot)?;
    let invalid = |reason: String| KeyLoadError::Invalid { key: slot, reason };
    let pem = std::str::from_utf8(&bytes).map_err(|_| invalid("PEM is not UTF-8".into()))?;
    parse(pem).map_err(invalid)
}

/// Type label of a PEM document, e.g. `PUBLIC KEY`, read with the same
/// RFC 7468 grammar the key decoders apply.
fn pem_label(pem: &str) -> Result<&str, String> {
    pem::decode_label(pem.as_bytes()).map_err(|e| format!("no PEM block found ({e})"))
}

fn parse_rsa_public(pem: &str) -> Result<RsaPublicKey, String> {
    match pem_label(pem)? {
        "PUBLIC KEY" => RsaPublicKey::from_public_key_pem(pem).map_err(|e| e.to_string()),
        "RSA PUBLIC KEY" => RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| e.to_string()),
        "PRIVATE KEY" | "RSA PRIVATE KEY" => parse_rsa_private(pem).map(|key| key.to_public_key()),
        other => Err(format!("unexpected PEM block {other:?} for an RSA key")),
    }
}

fn parse_rsa_private(pem: &str) -> Result<RsaPrivateKey, String> {
    let key = match pem_label(pem)? {
        "PRIVATE KEY" => RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| e.to_string())?,
        "RSA PRIVATE KEY" => RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| e.to_string())?,
        other => return Err(format!("unexpected PEM block {other:?} for an RSA private key")),
    };
    key.validate().map_err(|e| e.to_string())?;
    Ok(key)
}

fn parse_ec_public(pem: &str) -> Result<p256::ecdsa::VerifyingKey, String> {
    let public = match pem_label(pem)? {
        "PUBLIC KEY" => {
            return p256::ecdsa::VerifyingKey::from_public_key_pem(pem).map_err(|e| e.to_string())
        }
        "PRIVATE KEY" => {
            use p256::pkcs8::DecodePrivateKey as _;
            p256::SecretKey::from_pkcs8_pem(pem)
                .map_err(|e| e.to_string())?
                .public_key()
        }
        "EC PRIVATE KEY" => p256::SecretKey::from_sec1_pem(pem)
            .map_err(|e| e.to_string())?
            .public_key(),
        other => return Err(format!("unexpected PEM block {other:?} for a P-256 key")),
    };
    Ok(p256::ecdsa::VerifyingKey::from(public))
}
