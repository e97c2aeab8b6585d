//! # Gateway Configuration
//!
//! Read once from the environment at startup.
//!
//! | Variable                 | Default | Meaning                          |
//! |--------------------------|---------|----------------------------------|
//! | `PORT`                   | `8080`  | Listen port                      |
//! | `JWTGW_METRICS_ENABLED`  | `true`  | Mount `/metrics`, count requests |
//! | `HS256_SECRET_FILE`      | (none)  | HS256 shared secret file         |
//! | `RS256_PUBLIC_KEY`       | (none)  | RS256 public key PEM file        |
//! | `ES256_PUBLIC_KEY`       | (none)  | ES256 public key PEM file        |
//! | `JWE_PRIVATE_KEY`        | (none)  | JWE RSA private key PEM file     |
//!
//! Key variables are not checked here. A missing one surfaces as
//! `KeyLoadError::Missing` when the keys are loaded.

use jwtgw_crypto::KeySources;

use crate::error::StartupError;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Everything the binary needs to start serving.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub keys: KeySources,
    pub metrics_enabled: bool,
}

impl GatewayConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StartupError> {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| StartupError::Config {
                var: "PORT",
                reason: format!("{raw:?}: {e}"),
            })?,
            None => DEFAULT_PORT,
        };

        // Anything other than "false" leaves metrics on.
        let metrics_enabled = lookup("JWTGW_METRICS_ENABLED")
            .map(|v| !v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Ok(Self {
            port,
            keys: KeySources::from_lookup(&lookup),
            metrics_enabled,
        })
    }
}
