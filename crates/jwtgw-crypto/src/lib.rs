//! # jwtgw-crypto — Token Verification
//!
//! Everything that needs key material:
//!
//! - **Key loading** ([`keys`]): the HS256 secret and three PEM keys, read
//!   once at startup into an immutable [`KeyMaterial`].
//! - **JWS verification** ([`jws`]): HS256, RS256 and ES256, dispatched on
//!   the token's own `alg` over a closed allow-list.
//! - **JWE decryption** ([`jwe`]): RSA-OAEP / RSA-OAEP-256 key unwrap with
//!   AES-GCM content decryption.
//!
//! ## Crate Policy
//!
//! - Depends only on `jwtgw-core` internally.
//! - RustCrypto primitives throughout; no hand-rolled cryptography.
//! - No mocking of cryptographic operations in tests. Tests mint real
//!   tokens with real keys via [`fixtures`](crate::fixtures).

pub mod jwe;
pub mod jws;
pub mod keys;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use keys::{KeyMaterial, KeySource, KeySources};
