use labthings_core::layers;
use labthings_runtime::server::{ServerBuilder, ServerConfig};
use labthings_server::AppState;

use labthings_demo_counter::Counter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    layers::init_tracing();

    let config = ServerConfig {
        settings_folder: "./settings".into(),
        ..Default::default()
    };

    let counter = Counter::new("counter");
    let server = ServerBuilder::new(config)
        .add_thing("counter", counter)
        .build()
        .await?;

    let state = AppState::new(server.clone(), "http://0.0.0.0:7125");
    let app = labthings_server::build_router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:7125").await?;
    tracing::info!("labthings counter demo listening on 0.0.0.0:7125");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    labthings_runtime::server::shutdown(&server).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for Ctrl-C");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
