//! # Verify Subcommand
//!
//! Runs the gateway's admission logic over tokens supplied on the command
//! line or in a token file (one compact token per line, the format the
//! load-test generators write). Nothing is decoded beyond what the filter
//! itself inspects; claims are never printed.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use jwtgw_api::auth::AuthenticationFilter;

use crate::keys::KeyFlags;

/// Arguments for the `jwtgw verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// A single compact token.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub token: Option<String>,

    /// A file holding one compact token per line. Blank lines are skipped.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub keys: KeyFlags,
}

/// Admission counts for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub admitted: usize,
    pub denied: usize,
}

impl Tally {
    /// Exit code: 0 when every token was admitted, 2 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.denied == 0 {
            0
        } else {
            2
        }
    }
}

/// Execute the verify subcommand.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let tokens = match (&args.token, &args.file) {
        (Some(token), _) => vec![token.trim().to_string()],
        (None, Some(path)) => read_tokens(path)?,
        (None, None) => bail!("either --token or --file is required"),
    };
    if tokens.is_empty() {
        bail!("no tokens to verify");
    }

    let filter = AuthenticationFilter::new(Arc::new(args.keys.load()?));
    let stdout = std::io::stdout();
    let tally = verify_all(&filter, &tokens, &mut stdout.lock())?;
    Ok(tally.exit_code())
}

/// Read a token file, skipping blank lines.
pub fn read_tokens(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading token file {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Verify each token, writing one verdict line per token and a summary.
pub fn verify_all(
    filter: &AuthenticationFilter,
    tokens: &[String],
    out: &mut impl Write,
) -> Result<Tally> {
    let mut tally = Tally::default();
    for (index, token) in tokens.iter().enumerate() {
        let line = index + 1;
        match filter.verify_token(token) {
            Ok(verified) => {
                tally.admitted += 1;
                tracing::debug!(line, reason = verified.reason(), "token admitted");
                writeln!(out, "{line}: ADMIT")?;
            }
            Err(e) => {
                tally.denied += 1;
                tracing::debug!(line, reason = e.reason(), "token denied: {e}");
                writeln!(out, "{line}: DENY ({})", e.reason())?;
            }
        }
    }
    writeln!(out, "admitted: {}, denied: {}", tally.admitted, tally.denied)?;
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::fixture_flags;
    use jwtgw_crypto::fixtures::FixtureKeys;
    use serde_json::json;

    fn filter() -> AuthenticationFilter {
        AuthenticationFilter::new(Arc::new(FixtureKeys::shared().key_material()))
    }

    fn claims() -> serde_json::Value {
        json!({"sub": "load-test", "iat": 1700000000, "rnd": "x1"})
    }

    #[test]
    fn mixed_tokens_are_tallied() {
        let fx = FixtureKeys::shared();
        let tokens = vec![
            fx.sign("HS256", &claims()),
            fx.sign("RS256", &claims()),
            fx.sign("ES256", &claims()),
            fx.encrypt("RSA-OAEP-256", "A256GCM", &claims()),
            fx.sign("none", &claims()),
            "a.b.c.d".to_string(),
        ];

        let mut out = Vec::new();
        let tally = verify_all(&filter(), &tokens, &mut out).unwrap();
        assert_eq!(tally, Tally { admitted: 4, denied: 2 });
        assert_eq!(tally.exit_code(), 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "1: ADMIT");
        assert_eq!(lines[3], "4: ADMIT");
        assert_eq!(lines[4], "5: DENY (unsupported_algorithm)");
        assert_eq!(lines[5], "6: DENY (decryption_failed)");
        assert_eq!(lines[6], "admitted: 4, denied: 2");
    }

    #[test]
    fn all_admitted_exits_zero() {
        let fx = FixtureKeys::shared();
        let tokens = vec![fx.sign("HS256", &claims())];

        let mut out = Vec::new();
        let tally = verify_all(&filter(), &tokens, &mut out).unwrap();
        assert_eq!(tally.exit_code(), 0);
    }

    #[test]
    fn token_file_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hs256-tokens.txt");
        std::fs::write(&path, "aaa.bbb.ccc\n\n   \nddd.eee.fff\n").unwrap();

        let tokens = read_tokens(&path).unwrap();
        assert_eq!(tokens, vec!["aaa.bbb.ccc", "ddd.eee.fff"]);
    }

    #[test]
    fn missing_token_file_is_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_tokens(&dir.path().join("absent.txt")).unwrap_err();
        assert!(format!("{err:#}").contains("absent.txt"));
    }

    #[test]
    fn run_verify_reads_file_and_keys() {
        let dir = tempfile::tempdir().unwrap();
        let fx = FixtureKeys::shared();
        let path = dir.path().join("tokens.txt");
        std::fs::write(
            &path,
            format!("{}\n{}\n", fx.sign("HS256", &claims()), fx.sign("ES256", &claims())),
        )
        .unwrap();

        let args = VerifyArgs {
            token: None,
            file: Some(path),
            keys: fixture_flags(dir.path()),
        };
        assert_eq!(run_verify(&args).unwrap(), 0);
    }

    #[test]
    fn run_verify_denied_token_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        let args = VerifyArgs {
            token: Some("not-a-token".to_string()),
            file: None,
            keys: fixture_flags(dir.path()),
        };
        assert_eq!(run_verify(&args).unwrap(), 2);
    }

    #[test]
    fn run_verify_without_keys_is_setup_error() {
        let args = VerifyArgs {
            token: Some("a.b.c".to_string()),
            file: None,
            keys: KeyFlags::default(),
        };
        assert!(run_verify(&args).is_err());
    }

    #[test]
    fn empty_token_file_is_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "\n\n").unwrap();
        let args = VerifyArgs {
            token: None,
            file: Some(path),
            keys: fixture_flags(dir.path()),
        };
        assert!(run_verify(&args).is_err());
    }
}
