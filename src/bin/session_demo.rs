//! Walks an interactive session through sign-in, a burst of concurrent
//! calls, and a sign-out seen by a second context on the same device.
//!
//! $ cargo run --bin session_demo -- --settings=settings/dev.toml

use futures_util::future::join_all;
use std::sync::Arc;
use tollgate::domain_model::*;
use tollgate::domain_port::SessionStore;
use tollgate::logger::*;
use tollgate::server::*;
use tollgate::settings::*;

struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, destination: &str) {
        info!(destination, "navigate");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new_bootstrap();
    let settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig {
        filter: settings.log.filter.clone(),
    })?;

    let server = Server::try_new(&settings).await?;
    let device = Server::new_device_id();
    let store = server.device_store(&device);

    let first = server.open_interactive(&device, store.clone(), Arc::new(LogNavigator));
    let second = server.open_interactive(&device, store.clone(), Arc::new(LogNavigator));

    let user = first
        .sign_in(SignInCredentials {
            email: "admin@example.com".to_string(),
            password: "123456".to_string(),
        })
        .await?;
    info!(?user, "signed in");

    let calls = (0..5).map(|_| first.api().get_json::<User>("/me"));
    for (i, result) in join_all(calls).await.into_iter().enumerate() {
        match result {
            Ok(me) => info!(i, email = %me.email, "call succeeded"),
            Err(e) => warn!(i, "call failed: {}", e),
        }
    }

    second.sign_out().await?;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    info!(
        signed_in = store.access_token().await?.is_some(),
        "first context after remote sign-out"
    );

    server.shutdown().await;
    Ok(())
}
