use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::adapters::PostgresPaymentRepository;
use crate::config::Config;
use crate::domain::PaymentStatus;
use crate::ports::PaymentRepository;
use crate::use_cases::{ExpireStalePayments, PaymentStatusQuery, ResolvePayment};

/// Longest age accepted by `payments expire-stale` (one year).
pub const MAX_STALE_MINUTES: i64 = 60 * 24 * 365;

#[derive(Parser)]
#[command(name = "payment-intake")]
#[command(about = "Mobile-money payment intake service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,

    /// Payment administration commands
    #[command(subcommand)]
    Payments(PaymentCommands),
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Show a payment and its event log
    Show {
        #[arg(value_name = "REFERENCE")]
        reference: String,
    },

    /// Settle a pending payment by hand
    Resolve {
        #[arg(value_name = "REFERENCE")]
        reference: String,

        /// Terminal status to apply (successful or failed)
        #[arg(short, long)]
        status: String,
    },

    /// Mark pending payments older than the cutoff as failed
    ExpireStale {
        #[arg(
            long,
            default_value_t = 60,
            value_parser = clap::value_parser!(i64).range(1..=MAX_STALE_MINUTES)
        )]
        older_than_minutes: i64,
    },
}

async fn repository(config: &Config) -> anyhow::Result<Arc<dyn PaymentRepository>> {
    let pool = crate::db::create_pool(config).await?;
    Ok(Arc::new(PostgresPaymentRepository::new(pool)))
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;

    println!("✓ Database migrations completed");
    Ok(())
}

pub async fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Database URL: {}", config.redacted_database_url());
    println!("  Reference Prefix: {}", config.reference_prefix);
    println!("  Provider Mode: {:?}", config.provider_mode);
    if let Some(base_url) = &config.provider_base_url {
        println!("  Provider URL: {}", base_url);
    }
    println!(
        "  Callback Signatures: {}",
        if config.provider_callback_secret.is_some() { "required" } else { "disabled" }
    );

    let pool = crate::db::create_pool(config).await.ok();
    let report = crate::startup::validate_environment(config, pool.as_ref()).await;
    report.print();

    if !report.is_valid() {
        anyhow::bail!("Configuration validation failed");
    }

    println!("✓ Configuration is valid");
    Ok(())
}

pub async fn handle_payment_show(config: &Config, reference: &str) -> anyhow::Result<()> {
    let payments = repository(config).await?;
    let payment = PaymentStatusQuery::new(payments.clone())
        .execute(reference)
        .await?;

    println!("Payment {}", payment.transaction_reference);
    println!("  ID:       {}", payment.id);
    println!("  Phone:    {}", payment.phone_number);
    println!("  Amount:   {}", payment.amount);
    println!("  Status:   {}", payment.status);
    println!("  Provider: {}", payment.provider);
    println!("  Created:  {}", payment.created_at);
    println!("  Updated:  {}", payment.updated_at);

    let events = payments.list_events(reference).await?;
    if !events.is_empty() {
        println!("Events:");
        for event in events {
            println!(
                "  {} {:<18} {}",
                event.created_at,
                event.event_type,
                event.message.unwrap_or_default()
            );
        }
    }

    Ok(())
}

pub async fn handle_payment_resolve(
    config: &Config,
    reference: &str,
    status: &str,
) -> anyhow::Result<()> {
    let status: PaymentStatus = status.parse()?;
    let payments = repository(config).await?;

    let payment = ResolvePayment::new(payments).execute(reference, status).await?;

    tracing::info!(reference = %reference, status = %payment.status, "Payment resolved manually");
    println!("✓ Payment {} marked as {}", reference, payment.status);
    Ok(())
}

pub async fn handle_payment_expire_stale(
    config: &Config,
    older_than_minutes: i64,
) -> anyhow::Result<()> {
    let max_age = stale_age(older_than_minutes)?;

    let payments = repository(config).await?;
    let expired = ExpireStalePayments::new(payments).execute(max_age).await?;

    for reference in &expired {
        println!("  {}", reference);
    }
    println!("✓ {} stale payment(s) marked as failed", expired.len());
    Ok(())
}

fn stale_age(older_than_minutes: i64) -> anyhow::Result<chrono::Duration> {
    if !(1..=MAX_STALE_MINUTES).contains(&older_than_minutes) {
        anyhow::bail!(
            "--older-than-minutes must be between 1 and {}",
            MAX_STALE_MINUTES
        );
    }
    Ok(chrono::Duration::minutes(older_than_minutes))
}
