mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;

use neomind_core::NeomindConfig;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = NeomindConfig::load()?;
    let state = AppState::new(&config)?;

    let app = routes::app(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    log::info!("neomind-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
