use anyhow::Context;
use db::DBService;
use server::{AppState, router};
use services::services::{auth::IdentityClient, config::Config};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::logging::init("info");

    let config = Config::from_env().context("loading configuration")?;
    let db = DBService::new(&config.database_url)
        .await
        .context("connecting to database")?;
    let identity = IdentityClient::new(&config.identity_base_url, &config.identity_api_key)?;

    let state = AppState::new(db, identity);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "portal server listening");

    axum::serve(listener, router(state))
        .await
        .context("server error")?;

    Ok(())
}
