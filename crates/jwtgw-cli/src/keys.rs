//! # Keys Subcommand
//!
//! Loads the four key slots the gateway needs and reports the outcome,
//! so a broken deployment is caught before the server refuses to start.

use std::io::Write;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use jwtgw_core::KeySlot;
use jwtgw_crypto::{KeyMaterial, KeySources};

/// Key slot locations shared by every subcommand that needs keys.
///
/// Each flag falls back to the environment variable the gateway reads.
/// A `file:` prefix on a value is accepted and stripped.
#[derive(Args, Debug, Clone, Default)]
pub struct KeyFlags {
    /// HS256 shared secret file (surrounding whitespace trimmed, at least 32 bytes).
    #[arg(long, env = "HS256_SECRET_FILE", value_name = "PATH")]
    pub hs256_secret: Option<String>,

    /// RS256 verification key (PEM).
    #[arg(long, env = "RS256_PUBLIC_KEY", value_name = "PATH")]
    pub rs256_public_key: Option<String>,

    /// ES256 verification key (PEM, P-256).
    #[arg(long, env = "ES256_PUBLIC_KEY", value_name = "PATH")]
    pub es256_public_key: Option<String>,

    /// RSA private key for JWE decryption (PEM).
    #[arg(long, env = "JWE_PRIVATE_KEY", value_name = "PATH")]
    pub jwe_private_key: Option<String>,
}

impl KeyFlags {
    /// Resolve the flags into key sources, under the same location rules
    /// the gateway applies to its environment.
    pub fn sources(&self) -> KeySources {
        KeySources::from_lookup(|var| {
            KeySlot::ALL
                .into_iter()
                .find(|slot| slot.env_var() == var)
                .and_then(|slot| self.location(slot))
                .map(str::to_string)
        })
    }

    /// Load every slot.
    pub fn load(&self) -> Result<KeyMaterial> {
        KeyMaterial::load(&self.sources()).context("loading key material")
    }

    fn location(&self, slot: KeySlot) -> Option<&str> {
        match slot {
            KeySlot::Hs256Secret => self.hs256_secret.as_deref(),
            KeySlot::Rs256PublicKey => self.rs256_public_key.as_deref(),
            KeySlot::Es256PublicKey => self.es256_public_key.as_deref(),
            KeySlot::JwePrivateKey => self.jwe_private_key.as_deref(),
        }
    }
}

/// Arguments for the `jwtgw keys` subcommand.
#[derive(Args, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

/// Keys subcommands.
#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Load all key slots and print which loaded.
    Check {
        #[command(flatten)]
        keys: KeyFlags,
    },
}

/// Execute the keys subcommand.
pub fn run_keys(args: &KeysArgs) -> Result<u8> {
    match &args.command {
        KeysCommand::Check { keys } => {
            let stdout = std::io::stdout();
            cmd_check(keys, &mut stdout.lock())
        }
    }
}

/// Load `flags` and write one line per slot to `out`.
///
/// Returns exit code 0 when every slot loaded and 1 otherwise. Only the
/// failing slot is named on failure; loading stops at the first error.
pub fn cmd_check(flags: &KeyFlags, out: &mut impl Write) -> Result<u8> {
    match KeyMaterial::load(&flags.sources()) {
        Ok(material) => {
            for (slot, description) in material.describe() {
                writeln!(out, "OK: {slot}: {description}")?;
            }
            tracing::info!("all key slots loaded");
            Ok(0)
        }
        Err(e) => {
            writeln!(out, "FAIL: {e}")?;
            tracing::warn!(slot = %e.slot(), "key slot failed to load");
            Ok(1)
        }
    }
}

/// Write every fixture key to `dir` and return flags naming the files.
#[cfg(test)]
pub(crate) fn fixture_flags(dir: &std::path::Path) -> KeyFlags {
    let fx = jwtgw_crypto::fixtures::FixtureKeys::shared();
    let write = |name: &str, contents: &[u8]| {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path.display().to_string()
    };
    KeyFlags {
        hs256_secret: Some(write("hs256-secret.txt", fx.hmac_secret())),
        rs256_public_key: Some(write("rs256-public.pem", fx.rsa_public_pem().as_bytes())),
        es256_public_key: Some(write("es256-public.pem", fx.ec_public_pem().as_bytes())),
        jwe_private_key: Some(write("jwe-private.pem", fx.jwe_private_pem().as_bytes())),
    }
}
