use std::sync::Arc;
use std::time::Duration;

use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use fitout_api::{config, db, events, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config()?;
    config::init_tracing(&app_config.log_level, app_config.log_json);
    info!(environment = %app_config.environment, "starting fitout-api");

    let connection = db::establish_connection_from_app_config(&app_config).await?;
    if app_config.auto_migrate {
        db::run_migrations(&connection).await?;
        info!("migrations applied");
    }
    let connection = Arc::new(connection);

    let (event_sender, event_receiver) = events::channel(256);
    tokio::spawn(events::process_events(event_receiver));

    let addr = format!("{}:{}", app_config.host, app_config.port);
    let state = AppState::new(connection, app_config, event_sender);

    let app = fitout_api::app_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false)),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
        return;
    }
    info!("shutdown signal received");
}
