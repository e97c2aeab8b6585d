//! # Compact Serialization and Token Classification
//!
//! Splits a bearer credential into its dot-separated base64url segments and
//! decides which verification path it takes.
//!
//! ## Classification Rule
//!
//! Exactly three segments is a signed token (JWS). Every other segment count
//! is handed to the encrypted path (JWE) without checking for the five
//! segments a JWE actually has, so a 2- or 4-segment string fails during
//! decryption rather than during classification. [`classify`] is not a
//! format validator.
//!
//! ## Borrowing
//!
//! Classified tokens borrow from the header value. Nothing outlives the
//! request that carried it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{DecryptionError, SignatureError};
use crate::header::JoseHeader;

/// Decode one base64url segment (RFC 7515 §2: no padding).
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(segment)
}

/// Encode bytes as one base64url segment without padding.
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Result of classifying a compact token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// Three segments: header, payload, signature.
    Signed(SignedToken<'a>),
    /// Any other shape. Expected to be a five-segment JWE.
    Encrypted(EncryptedToken<'a>),
}

/// Classify a compact-serialized token by segment count.
///
/// Pure and total: every input maps to exactly one variant.
pub fn classify(token: &str) -> TokenKind<'_> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None) => TokenKind::Signed(SignedToken {
            raw: token,
            header,
            payload,
            signature,
        }),
        _ => TokenKind::Encrypted(EncryptedToken { raw: token }),
    }
}

// ---------------------------------------------------------------------------
// Signed tokens
// ---------------------------------------------------------------------------

/// A three-segment token, still base64url-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedToken<'a> {
    raw: &'a str,
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

/// A signed token with its header and signature decoded.
#[derive(Debug, Clone)]
pub struct ParsedJws<'a> {
    /// Decoded protected header.
    pub header: JoseHeader,
    /// ASCII `header "." payload` exactly as received; the bytes that were signed.
    pub signing_input: &'a [u8],
    /// Decoded signature bytes.
    pub signature: Vec<u8>,
}

impl<'a> SignedToken<'a> {
    /// Decode the segments.
    ///
    /// The payload is checked for valid base64url but never interpreted.
    /// A header carrying `crit` is rejected here, before any algorithm
    /// dispatch.
    pub fn parse(&self) -> Result<ParsedJws<'a>, SignatureError> {
        let header_bytes = decode_segment(self.header)
            .map_err(|e| SignatureError::MalformedToken(format!("header: {e}")))?;
        let header = JoseHeader::from_json(&header_bytes).map_err(SignatureError::MalformedToken)?;
        if header.has_critical_params() {
            return Err(SignatureError::MalformedToken(
                "critical header parameters are not supported".to_string(),
            ));
        }

        decode_segment(self.payload)
            .map_err(|e| SignatureError::MalformedToken(format!("payload: {e}")))?;
        let signature = decode_segment(self.signature)
            .map_err(|e| SignatureError::MalformedToken(format!("signature: {e}")))?;

        let signed_len = self.header.len() + 1 + self.payload.len();
        Ok(ParsedJws {
            header,
            signing_input: &self.raw.as_bytes()[..signed_len],
            signature,
        })
    }
}

// ---------------------------------------------------------------------------
// Encrypted tokens
// ---------------------------------------------------------------------------

/// A token routed to the decryption path. Its shape is not yet checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptedToken<'a> {
    raw: &'a str,
}

/// A five-segment JWE with every segment decoded.
#[derive(Debug, Clone)]
pub struct ParsedJwe<'a> {
    /// Decoded protected header.
    pub header: JoseHeader,
    /// Additional authenticated data: the ASCII protected-header segment.
    pub aad: &'a [u8],
    /// RSA-wrapped content-encryption key.
    pub encrypted_key: Vec<u8>,
    /// Initialization vector.
    pub iv: Vec<u8>,
    /// Ciphertext without the tag.
    pub ciphertext: Vec<u8>,
    /// Authentication tag.
    pub tag: Vec<u8>,
}

impl<'a> EncryptedToken<'a> {
    /// Split into exactly five segments and decode them.
    ///
    /// This is the first place a wrong segment count is noticed. Every
    /// failure is the same [`DecryptionError::DecryptionFailed`].
    pub fn parse(&self) -> Result<ParsedJwe<'a>, DecryptionError> {
        let segments: Vec<&'a str> = self.raw.split('.').collect();
        let [header, encrypted_key, iv, ciphertext, tag] = segments[..] else {
            return Err(DecryptionError::DecryptionFailed);
        };

        let decode = |segment: &str| {
            decode_segment(segment).map_err(|_| DecryptionError::DecryptionFailed)
        };

        let header_bytes = decode(header)?;
        let parsed_header =
            JoseHeader::from_json(&header_bytes).map_err(|_| DecryptionError::DecryptionFailed)?;
        if parsed_header.has_critical_params() {
            return Err(DecryptionError::DecryptionFailed);
        }

        Ok(ParsedJwe {
            header: parsed_header,
            aad: header.as_bytes(),
            encrypted_key: decode(encrypted_key)?,
            iv: decode(iv)?,
            ciphertext: decode(ciphertext)?,
            tag: decode(tag)?,
        })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Classification is decided by segment count alone.
        #[test]
        fn classification_follows_segment_count(token in "[A-Za-z0-9_.-]{0,64}") {
            let segments = token.split('.').count();
            match classify(&token) {
                TokenKind::Signed(_) => prop_assert_eq!(segments, 3),
                TokenKind::Encrypted(_) => prop_assert_ne!(segments, 3),
            }
        }

        /// Parsing arbitrary input never panics on either path.
        #[test]
        fn parsing_never_panics(token in "\\PC{0,128}") {
            match classify(&token) {
                TokenKind::Signed(signed) => { let _ = signed.parse(); }
                TokenKind::Encrypted(encrypted) => { let _ = encrypted.parse(); }
            }
        }

        /// Arbitrary bytes survive the segment codec.
        #[test]
        fn segment_codec_round_trips(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let encoded = encode_segment(&bytes);
            prop_assert!(!encoded.contains('='));
            prop_assert_eq!(decode_segment(&encoded).unwrap(), bytes);
        }
    }
}
