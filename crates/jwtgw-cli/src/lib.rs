//! # jwtgw-cli — Operator Tooling
//!
//! Provides the `jwtgw` command-line interface. It loads the same key
//! slots as the gateway and runs the same filter logic, without a server.
//!
//! ## Subcommands
//!
//! - `jwtgw keys check`: load every key slot and report what loaded.
//! - `jwtgw verify`: admit or deny tokens given inline or one per line in
//!   a file.
//!
//! ```bash
//! jwtgw keys check --hs256-secret secrets/hs256-secret.txt ...
//! jwtgw verify --file output/hs256-tokens.txt
//! ```
//!
//! Key flags fall back to the gateway's environment variables, so a shell
//! configured for `jwtgw-api` needs no flags at all.

pub mod keys;
pub mod verify;
