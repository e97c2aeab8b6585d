//! # Signed-Token Verification
//!
//! Verifies compact JWS tokens against the configured [`KeyMaterial`].
//!
//! ## Security Invariant
//!
//! The token's own `alg` header selects the verifier, so the choice is
//! attacker-controlled. Dispatch is an exhaustive `match` over
//! [`JwsAlgorithm`] and each allowed algorithm is bound to exactly one key
//! slot:
//!
//! | `alg`   | key                        |
//! |---------|----------------------------|
//! | `HS256` | shared secret              |
//! | `RS256` | RSA public key             |
//! | `ES256` | P-256 public key           |
//!
//! `none`, other HMAC widths, and every other name are rejected before any
//! key is read. A public key can never be used as an HMAC secret because the
//! HMAC arm only ever sees the shared secret.

use hmac::{Hmac, Mac};
use jwtgw_core::{JwsAlgorithm, SignatureError, SignedToken};
use sha2::Sha256;

use crate::keys::KeyMaterial;

type HmacSha256 = Hmac<Sha256>;

/// Verify a signed token and return the algorithm that verified it.
pub fn verify(token: &SignedToken<'_>, keys: &KeyMaterial) -> Result<JwsAlgorithm, SignatureError> {
    let parsed = token.parse()?;
    let algorithm = parsed.header.jws_algorithm();
    let input = parsed.signing_input;
    let signature = parsed.signature.as_slice();

    match &algorithm {
        JwsAlgorithm::Hs256 => verify_hs256(keys.hmac_secret(), input, signature)?,
        JwsAlgorithm::Rs256 => verify_rs256(keys.rsa_verify_key(), input, signature)?,
        JwsAlgorithm::Es256 => verify_es256(keys.ec_verify_key(), input, signature)?,
        JwsAlgorithm::Unsupported(name) => {
            return Err(SignatureError::UnsupportedAlgorithm(name.clone()))
        }
    }
    Ok(algorithm)
}

fn verify_hs256(secret: &[u8], input: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::SignatureInvalid)?;
    mac.update(input);
    // Constant-time; also rejects truncated tags.
    mac.verify_slice(signature)
        .map_err(|_| SignatureError::SignatureInvalid)
}

fn verify_rs256(
    key: &rsa::pkcs1v15::VerifyingKey<Sha256>,
    input: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let signature = rsa::pkcs1v15::Signature::try_from(signature)
        .map_err(|_| SignatureError::SignatureInvalid)?;
    rsa::signature::Verifier::verify(key, input, &signature)
        .map_err(|_| SignatureError::SignatureInvalid)
}

/// ES256 signatures are the fixed-width `r || s` encoding (RFC 7518 §3.4),
/// not DER.
fn verify_es256(
    key: &p256::ecdsa::VerifyingKey,
    input: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let signature = p256::ecdsa::Signature::from_slice(signature)
        .map_err(|_| SignatureError::SignatureInvalid)?;
    p256::ecdsa::signature::Verifier::verify(key, input, &signature)
        .map_err(|_| SignatureError::SignatureInvalid)
}
