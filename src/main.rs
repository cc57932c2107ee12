use anyhow::Context;
use std::sync::Arc;
use storefront::{
    api::routes::create_router,
    cli::{Cli, Commands},
    media::CloudinaryClient,
    utils::config::LogFormat,
    AppState, Config, DatabaseProvider,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "storefront=info,storefront_server=info,tower_http=info";

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.env_file {
        Some(path) => Config::from_env_file(path),
        None => Config::from_env(),
    }
    .context("Invalid configuration")?;

    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let config = load_config(&cli)?;

    if cli.command == Some(Commands::CheckConfig) {
        println!("Configuration OK");
        println!("  listen:      {}:{}", config.server.host, config.server.port);
        println!(
            "  database:    {}",
            DatabaseProvider::from_config(&config.database).describe()
        );
        println!("  cloudinary:  {}", config.cloudinary.cloud_name);
        println!("  environment: {:?}", config.environment);
        return Ok(());
    }

    init_tracing(config.server.log_format);

    let provider = DatabaseProvider::from_config(&config.database);
    let db = provider
        .create_client()
        .await
        .with_context(|| format!("Failed to open database ({})", provider.describe()))?;
    tracing::info!(database = %provider.describe(), "database ready");

    let images = Arc::new(
        CloudinaryClient::new(&config.cloudinary).context("Failed to set up image host")?,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let environment = config.environment;

    let state = AppState::new(config, db, images).context("Failed to build application state")?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(%addr, ?environment, "storefront server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
