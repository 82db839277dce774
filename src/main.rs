mod config;
mod frame;
mod routes;
mod services;
mod state;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = match config::ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let state = state::AppState::from_config(&config);
    let history_limit = state.board.history_limit();

    let app = match &config.static_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "serving static files");
            routes::app_with_static(state, dir)
        }
        None => routes::app(state),
    };

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    info!(
        %addr,
        ?history_limit,
        event_buffer = config.event_buffer,
        "drawboard listening"
    );
    axum::serve(listener, app).await.expect("server failed");
}
