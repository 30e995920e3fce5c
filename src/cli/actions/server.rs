use crate::cli::{actions::Action, telemetry};
use crate::fitlog::{new, store::PgStore, token::TokenSigner};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Handle the server action
///
/// # Errors
/// Returns an error if the database is unreachable, the schema cannot be
/// applied or the server fails to start.
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server { port, dsn, globals } => {
            info!("Connecting to database: {}", redact_dsn(&dsn));

            let store = PgStore::connect(&dsn).await?;
            store.apply_schema().await?;

            let signer = TokenSigner::new(globals.token_secret, globals.token_ttl_seconds);

            let result = new(port, Arc::new(store), Arc::new(signer)).await;

            telemetry::shutdown_tracer();

            result?;
        }
    }

    Ok(())
}

/// Strip the password from a DSN so it can be logged.
fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<invalid dsn>".to_string(),
    }
}
