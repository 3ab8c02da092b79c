use anyhow::Context;
use classroom::logging::init_tracing;
use classroom::router::init_router;
use classroom::state::init_app_state;
use classroom_config::ServerConfig;
use classroom_db::{init_db_pool, run_migrations};
use dotenvy::dotenv;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let server = ServerConfig::from_env();
    init_tracing(&server.log_dir).context("failed to initialize logging")?;

    let pool = init_db_pool()
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let state = init_app_state(pool);
    let app = init_router(state);

    let address = server.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(%address, "Server running");
    tracing::info!("Scalar UI available at http://{address}/scalar");
    axum::serve(listener, app).await?;

    Ok(())
}
