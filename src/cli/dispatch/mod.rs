//! Map validated CLI arguments to the action the binary runs.

use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let token_secret = matches
        .get_one::<String>("token-secret")
        .cloned()
        .context("missing required argument: --token-secret")?;

    let mut globals = GlobalArgs::new(SecretString::from(token_secret));

    if let Some(ttl) = matches.get_one::<i64>("token-ttl").copied() {
        globals = globals.with_token_ttl_seconds(ttl);
    }

    Ok(Action::Server { port, dsn, globals })
}
