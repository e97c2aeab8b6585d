//! # jwtgw-core — Foundational Types for the Bearer-Token Filter
//!
//! This crate defines everything about a token that can be decided without
//! key material: how a compact string is split, which verification path it
//! takes, what its header declares, and how failures are named. Every other
//! crate in the workspace depends on `jwtgw-core`; it depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **Classification is by segment count only.** Three segments is a JWS,
//!    anything else goes to the JWE path. See [`compact`].
//!
//! 2. **Closed algorithm enums.** [`JwsAlgorithm`], [`KeyManagementAlgorithm`]
//!    and [`ContentEncryption`] each carry an explicit `Unsupported` variant,
//!    so the allow-list is enforced by exhaustive `match`.
//!
//! 3. **Internal errors, uniform outcome.** The error enums in [`error`]
//!    distinguish failure causes for logs and metrics; the filter collapses
//!    them all into one 401.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `jwtgw-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests. Inputs are untrusted.

pub mod compact;
pub mod error;
pub mod header;

// Re-export primary types for ergonomic imports.
pub use compact::{
    classify, decode_segment, encode_segment, EncryptedToken, ParsedJwe, ParsedJws, SignedToken,
    TokenKind,
};
pub use error::{AuthError, DecryptionError, KeyLoadError, KeySlot, SignatureError};
pub use header::{ContentEncryption, JoseHeader, JwsAlgorithm, KeyManagementAlgorithm};
