use std::fs;
use std::sync::Arc;
use tokio::signal;
use tollgate::logger::*;
use tollgate::pages;
use tollgate::server::*;
use tollgate::settings::*;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;
    let tls = match (&project_settings.http.cert_path, &project_settings.http.key_path) {
        (Some(cert_path), Some(key_path)) => {
            if !fs::metadata(cert_path)?.is_file() {
                return Err(anyhow::anyhow!(
                    "TLS cert is not a regular file: {:?}",
                    cert_path
                ));
            }
            if !fs::metadata(key_path)?.is_file() {
                return Err(anyhow::anyhow!("TLS key is not a regular file: {:?}", key_path));
            }
            Some((cert_path.clone(), key_path.clone()))
        }
        (None, None) => None,
        _ => {
            return Err(anyhow::anyhow!(
                "http.cert_path and http.key_path must be set together"
            ));
        }
    };

    let server = Arc::new(Server::try_new(&project_settings).await?);

    let routes = pages::routes(server.clone())
        .recover(pages::recover_error)
        .with(warp::trace::request());

    let shutdown = async {
        signal::ctrl_c().await.expect("Could not register SIGINT");
    };
    match tls {
        Some((cert_path, key_path)) => {
            info!(%address, "serving pages over TLS");
            warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .bind_with_graceful_shutdown(address, shutdown)
                .1
                .await;
        }
        None => {
            info!(%address, "serving pages");
            warp::serve(routes)
                .bind_with_graceful_shutdown(address, shutdown)
                .1
                .await;
        }
    }

    let shutdown_timeout = std::time::Duration::from_secs(10);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => tracing::info!("server shutdown successfully"),
        Err(_) => tracing::error!("server shutdown timed out"),
    }

    Ok(())
}
