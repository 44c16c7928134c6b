pub mod config;
pub mod serializers;
pub mod services;
pub mod views;

use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::{config::CONFIG, views::get_router};


#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    let _guard = sentry::init((
        CONFIG.sentry_dsn.clone(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(sentry_tracing::layer())
        .init();

    let addr = format!("{}:{}", CONFIG.host, CONFIG.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Start webserver on {addr}");

    axum::serve(listener, get_router().await).await?;

    info!("Webserver shutdown");

    Ok(())
}
