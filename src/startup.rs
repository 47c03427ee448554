use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;

use crate::adapters::{HttpProvider, PostgresPaymentRepository, SimulatedProvider};
use crate::config::{Config, ProviderMode};
use crate::domain::ReferenceGenerator;
use crate::ports::MobileMoneyProvider;
use crate::AppState;

pub struct ValidationReport {
    pub environment: bool,
    pub database: bool,
    pub migrations: bool,
    pub provider: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.environment && self.database && self.migrations && self.provider
    }

    pub fn print(&self) {
        println!("\n=== Startup Validation Report ===");
        println!("Environment Variables: {}", status(self.environment));
        println!("Database Connectivity: {}", status(self.database));
        println!("Migrations Applied:    {}", status(self.migrations));
        println!("Payment Provider:      {}", status(self.provider));

        if !self.errors.is_empty() {
            println!("\nErrors:");
            for error in &self.errors {
                println!("  ❌ {}", error);
            }
        }

        println!("\nOverall Status: {}", if self.is_valid() { "✅ PASS" } else { "❌ FAIL" });
        println!("=================================\n");
    }
}

fn status(ok: bool) -> &'static str {
    if ok { "✅ OK" } else { "❌ FAIL" }
}

/// Picks the provider implementation named by `PROVIDER_MODE`.
pub fn build_provider(config: &Config) -> Result<Arc<dyn MobileMoneyProvider>> {
    match config.provider_mode {
        ProviderMode::Simulated => Ok(Arc::new(SimulatedProvider::new())),
        ProviderMode::Http => {
            let base_url = config
                .provider_base_url
                .clone()
                .context("PROVIDER_BASE_URL is required when PROVIDER_MODE=http")?;
            Ok(Arc::new(HttpProvider::new(
                base_url,
                config.provider_api_key.clone(),
                config.provider_timeout(),
            )))
        }
    }
}

pub fn build_state(config: &Config, pool: PgPool) -> Result<AppState> {
    let provider = build_provider(config)?;
    tracing::info!(provider = provider.name(), "Payment provider initialized");

    Ok(AppState::new(
        Arc::new(PostgresPaymentRepository::new(pool)),
        provider,
        ReferenceGenerator::new(config.reference_prefix.clone()),
    )
    .with_callback_secret(config.provider_callback_secret.clone()))
}

pub async fn validate_environment(config: &Config, pool: Option<&PgPool>) -> ValidationReport {
    let mut report = ValidationReport {
        environment: true,
        database: true,
        migrations: true,
        provider: true,
        errors: Vec::new(),
    };

    if let Err(e) = validate_env_vars(config) {
        report.environment = false;
        report.errors.push(format!("Environment: {}", e));
    }

    match pool {
        Some(pool) => {
            if let Err(e) = validate_database(pool).await {
                report.database = false;
                report.errors.push(format!("Database: {:#}", e));
            }
            if let Err(e) = validate_migrations(pool).await {
                report.migrations = false;
                report.errors.push(format!("Migrations: {:#}", e));
            }
        }
        None => {
            report.database = false;
            report.migrations = false;
            report.errors.push("Database: could not open a connection".to_string());
        }
    }

    match build_provider(config) {
        Ok(provider) => {
            if let Err(e) = provider.ping().await {
                report.provider = false;
                report.errors.push(format!("Provider: {}", e));
            }
        }
        Err(e) => {
            report.provider = false;
            report.errors.push(format!("Provider: {}", e));
        }
    }

    report
}

fn validate_env_vars(config: &Config) -> Result<()> {
    if config.database_url.is_empty() {
        anyhow::bail!("DATABASE_URL is empty");
    }
    if config.server_port == 0 {
        anyhow::bail!("SERVER_PORT must be greater than 0");
    }
    if config.database_max_connections == 0 {
        anyhow::bail!("DATABASE_MAX_CONNECTIONS must be greater than 0");
    }
    Ok(())
}

async fn validate_database(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Failed to connect to database")?;

    Ok(())
}

async fn validate_migrations(pool: &PgPool) -> Result<()> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to check migrations table")?;

    if applied == 0 {
        anyhow::bail!("No migrations applied");
    }

    Ok(())
}
