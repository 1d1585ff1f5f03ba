// 24+1 core - entry point and application setup

use std::path::Path;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twentyfive::app;
use twentyfive::error::Result;
use twentyfive::identity::{Identity, StaticIdentity};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twentyfive=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting 24+1 core");

    let data_dir = std::env::var("TWENTYFIVE_DATA_DIR").unwrap_or_else(|_| "data".into());
    let state = app::setup(Path::new(&data_dir)).await?;

    // Session bootstrap: initialize the signed-in user once per launch.
    // Repeated launches are no-ops thanks to idempotent initialization.
    let identity = StaticIdentity::from_env();
    match identity.current_user() {
        Some(session) => {
            state
                .engine
                .initialize_user(&session.user_id, &session.name, &session.email)
                .await?;
        }
        None => tracing::info!("No session user configured"),
    }

    state.maintenance.clone().start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}
