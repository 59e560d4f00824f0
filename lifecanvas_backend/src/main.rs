use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use config::Config;
use life::Board;
use simulation::SimulationHandle;
use std::{error::Error, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod handlers;
mod life;
mod simulation;
mod websocket;

#[derive(Clone)]
pub struct AppState {
    pub simulation: SimulationHandle,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifecanvas_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    // --- Board Setup ---
    let mut board = Board::new(config.topology());
    if config.seed_cells > 0 {
        let added = board.seed(config.seed_cells, config.seed_spread, &mut fastrand::Rng::new());
        info!("Seeded the board with {} cells.", added);
    }
    let (simulation, simulation_task) = simulation::spawn(board, config.tick_interval());

    if !config.static_dir.is_dir() {
        warn!(
            "Static directory {} does not exist; only the API and websocket will be served.",
            config.static_dir.display()
        );
    }

    let address = config.address.clone();
    let app_state = AppState {
        simulation,
        config: Arc::new(config),
    };
    let app = router(app_state);

    // --- Server Launch ---
    let listener = TcpListener::bind(&address).await?;
    info!("🚀 Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Open websocket sessions may still hold handles, so stop the task directly.
    simulation_task.abort();
    info!("Server stopped.");
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/board", get(handlers::get_board))
        .route("/api/board/cells", post(handlers::add_cells))
        .route("/api/board/seed", post(handlers::seed_board))
        .route("/ws", get(websocket::websocket_handler))
        .fallback_service(static_files)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, draining connections.");
}
