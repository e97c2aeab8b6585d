//! # Test Fixtures
//!
//! Freshly generated key pairs and helpers that mint compact tokens signed
//! or encrypted with them. Used by the unit tests here and, through the
//! `test-fixtures` feature, by the integration tests of dependent crates.
//!
//! Not a token issuer. Every helper panics on failure.

use std::sync::OnceLock;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use hmac::{Hmac, Mac};
use jwtgw_core::{encode_segment, ContentEncryption, KeyManagementAlgorithm};
use p256::pkcs8::{EncodePrivateKey as _, EncodePublicKey as _};
use rand_core::{OsRng, RngCore};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::{Oaep, RsaPrivateKey};
use serde_json::{json, Value};
use sha1::Sha1;
use sha2::Sha256;

use crate::keys::{KeyMaterial, KeySource, KeySources};

/// RSA modulus size for generated keys. Small to keep debug-profile test
/// runs fast; never used outside tests.
const RSA_BITS: usize = 1024;

/// A full set of freshly generated keys.
pub struct FixtureKeys {
    hmac_secret: [u8; 32],
    rsa_signing: RsaPrivateKey,
    ec_signing: p256::ecdsa::SigningKey,
    rsa_encryption: RsaPrivateKey,
}

impl FixtureKeys {
    /// Generate a new key set. RSA generation is slow; prefer [`Self::shared`].
    pub fn generate() -> Self {
        const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut hmac_secret = [0u8; 32];
        OsRng.fill_bytes(&mut hmac_secret);
        // Printable, like the secret files the load-test tools read.
        for byte in &mut hmac_secret {
            *byte = ALPHABET[usize::from(*byte) % ALPHABET.len()];
        }
        Self {
            hmac_secret,
            rsa_signing: RsaPrivateKey::new(&mut OsRng, RSA_BITS).expect("RSA keygen"),
            ec_signing: p256::ecdsa::SigningKey::random(&mut OsRng),
            rsa_encryption: RsaPrivateKey::new(&mut OsRng, RSA_BITS).expect("RSA keygen"),
        }
    }

    /// One key set per test binary.
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<FixtureKeys> = OnceLock::new();
        SHARED.get_or_init(Self::generate)
    }

    /// In-memory sources for all four slots.
    pub fn sources(&self) -> KeySources {
        let bytes = |s: String| Some(KeySource::Bytes(s.into_bytes()));
        KeySources {
            hs256_secret: Some(KeySource::Bytes(self.hmac_secret.to_vec())),
            rs256_public_key: bytes(self.rsa_public_pem()),
            es256_public_key: bytes(self.ec_public_pem()),
            jwe_private_key: bytes(self.jwe_private_pem()),
        }
    }

    /// Load [`KeyMaterial`] matching these keys.
    pub fn key_material(&self) -> KeyMaterial {
        KeyMaterial::load(&self.sources()).expect("fixture keys load")
    }

    // -- PEM renderings -----------------------------------------------------

    pub fn hmac_secret(&self) -> &[u8] {
        &self.hmac_secret
    }

    /// RS256 verification key, SPKI.
    pub fn rsa_public_pem(&self) -> String {
        self.rsa_signing
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .expect("encode RSA public key")
    }

    /// RS256 verification key, PKCS#1.
    pub fn rsa_public_pkcs1_pem(&self) -> String {
        self.rsa_signing
            .to_public_key()
            .to_pkcs1_pem(LineEnding::LF)
            .expect("encode RSA public key")
    }

    /// RS256 signing key, PKCS#8.
    pub fn rsa_signing_private_pem(&self) -> String {
        self.rsa_signing
            .to_pkcs8_pem(LineEnding::LF)
            .expect("encode RSA private key")
            .to_string()
    }

    /// ES256 verification key, SPKI.
    pub fn ec_public_pem(&self) -> String {
        self.ec_signing
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .expect("encode P-256 public key")
    }

    /// ES256 signing key, PKCS#8.
    pub fn ec_private_pem(&self) -> String {
        self.ec_secret()
            .to_pkcs8_pem(LineEnding::LF)
            .expect("encode P-256 private key")
            .to_string()
    }

    /// ES256 signing key, SEC1.
    pub fn ec_sec1_pem(&self) -> String {
        self.ec_secret()
            .to_sec1_pem(LineEnding::LF)
            .expect("encode P-256 private key")
            .to_string()
    }

    /// JWE decryption key, PKCS#8.
    pub fn jwe_private_pem(&self) -> String {
        self.rsa_encryption
            .to_pkcs8_pem(LineEnding::LF)
            .expect("encode RSA private key")
            .to_string()
    }

    /// JWE decryption key, PKCS#1.
    pub fn jwe_private_pkcs1_pem(&self) -> String {
        self.rsa_encryption
            .to_pkcs1_pem(LineEnding::LF)
            .expect("encode RSA private key")
            .to_string()
    }

    fn ec_secret(&self) -> p256::SecretKey {
        p256::SecretKey::from_bytes(&self.ec_signing.to_bytes()).expect("P-256 scalar")
    }

    // -- Signed tokens ------------------------------------------------------

    /// Mint a JWS with header `{"alg": alg, "typ": "JWT"}`.
    ///
    /// HS256/RS256/ES256 are signed with the matching key; `none` gets an
    /// empty signature; any other name is signed with the HMAC secret so it
    /// looks plausible on the wire.
    pub fn sign(&self, alg: &str, claims: &Value) -> String {
        self.sign_with_header(&json!({"alg": alg, "typ": "JWT"}), claims)
    }

    /// Mint a JWS with an arbitrary header, signing per its `alg`.
    pub fn sign_with_header(&self, header: &Value, claims: &Value) -> String {
        let input = signing_input(header, claims);
        let signature = match header["alg"].as_str().unwrap_or_default() {
            "RS256" => {
                let key = rsa::pkcs1v15::SigningKey::<Sha256>::new(self.rsa_signing.clone());
                let signature: rsa::pkcs1v15::Signature =
                    rsa::signature::Signer::sign(&key, input.as_bytes());
                rsa::signature::SignatureEncoding::to_bytes(&signature).to_vec()
            }
            "ES256" => {
                let signature: p256::ecdsa::Signature =
                    p256::ecdsa::signature::Signer::sign(&self.ec_signing, input.as_bytes());
                signature.to_bytes().to_vec()
            }
            "none" => Vec::new(),
            _ => hmac_sha256(&self.hmac_secret, input.as_bytes()),
        };
        format!("{input}.{}", encode_segment(&signature))
    }

    /// Mint an HS256 JWS keyed with an arbitrary secret.
    pub fn sign_hs256_with_secret(&self, secret: &[u8], claims: &Value) -> String {
        let input = signing_input(&json!({"alg": "HS256", "typ": "JWT"}), claims);
        let signature = hmac_sha256(secret, input.as_bytes());
        format!("{input}.{}", encode_segment(&signature))
    }

    // -- Encrypted tokens ---------------------------------------------------

    /// Mint a JWE for the configured decryption key.
    ///
    /// `alg` must be `RSA-OAEP` or `RSA-OAEP-256`; `enc` one of the AES-GCM
    /// names.
    pub fn encrypt(&self, alg: &str, enc: &str, claims: &Value) -> String {
        let header = encode_segment(json!({"alg": alg, "enc": enc}).to_string().as_bytes());
        let key_len = ContentEncryption::from_name(enc)
            .key_len()
            .expect("AES-GCM content encryption");

        let mut cek = vec![0u8; key_len];
        OsRng.fill_bytes(&mut cek);
        let mut iv = [0u8; 12];
        OsRng.fill_bytes(&mut iv);

        let padding = match KeyManagementAlgorithm::from_name(alg) {
            KeyManagementAlgorithm::RsaOaep => Oaep::new::<Sha1>(),
            KeyManagementAlgorithm::RsaOaep256 => Oaep::new::<Sha256>(),
            KeyManagementAlgorithm::Unsupported(name) => panic!("cannot wrap with {name}"),
        };
        let encrypted_key = self
            .rsa_encryption
            .to_public_key()
            .encrypt(&mut OsRng, padding, &cek)
            .expect("RSA-OAEP wrap");

        let plaintext = claims.to_string();
        let payload = Payload {
            msg: plaintext.as_bytes(),
            aad: header.as_bytes(),
        };
        let mut sealed = match key_len {
            16 => Aes128Gcm::new_from_slice(&cek)
                .expect("key length")
                .encrypt(&iv.into(), payload),
            24 => aes_gcm::AesGcm::<aes::Aes192, aes_gcm::aead::consts::U12>::new_from_slice(&cek)
                .expect("key length")
                .encrypt(&iv.into(), payload),
            _ => Aes256Gcm::new_from_slice(&cek)
                .expect("key length")
                .encrypt(&iv.into(), payload),
        }
        .expect("AES-GCM seal");
        let tag = sealed.split_off(sealed.len() - 16);

        format!(
            "{header}.{}.{}.{}.{}",
            encode_segment(&encrypted_key),
            encode_segment(&iv),
            encode_segment(&sealed),
            encode_segment(&tag)
        )
    }
}

fn signing_input(header: &Value, claims: &Value) -> String {
    format!(
        "{}.{}",
        encode_segment(header.to_string().as_bytes()),
        encode_segment(claims.to_string().as_bytes())
    )
}

fn hmac_sha256(secret: &[u8], input: &[u8]) -> Vec<u8> {
    let mut mac =
        <Hmac<Sha256> as Mac>::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(input);
    mac.finalize().into_bytes().to_vec()
}
