use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payment_intake::cli::{Cli, Commands, DbCommands, PaymentCommands};
use payment_intake::config::{Config, LogFormat};
use payment_intake::{cli, create_app, db, startup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = Config::from_env()?;

    // Setup logging
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Config => cli::handle_config_validate(&config).await,
        Commands::Payments(command) => match command {
            PaymentCommands::Show { reference } => {
                cli::handle_payment_show(&config, &reference).await
            }
            PaymentCommands::Resolve { reference, status } => {
                cli::handle_payment_resolve(&config, &reference, &status).await
            }
            PaymentCommands::ExpireStale { older_than_minutes } => {
                cli::handle_payment_expire_stale(&config, older_than_minutes).await
            }
        },
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    // Database pool
    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    let state = startup::build_state(&config, pool)?;
    let app = create_app(state, &config.cors_allowed_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
