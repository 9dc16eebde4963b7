use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use paysim::application::selector::{MemoizedPaymentService, PaymentServiceFactory};
use paysim::application::simulator::ACCEPTED_3DS_CODE;
use paysim::config::PaymentConfig;
use paysim::domain::payment::{Amount, BuyerInfo, CreatePaymentRequest, PaymentStatusView};
use paysim::domain::ports::{KeyValueStoreBox, KeyValueStoreFactory, PaymentService};
use paysim::infrastructure::in_memory::InMemoryKeyValueStore;
use paysim::interfaces::json::status_writer::StatusWriter;
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a mock payment and wait until it settles
    Create {
        amount: Decimal,
        currency: String,
        listing_id: String,

        #[arg(long)]
        locale: Option<String>,

        #[arg(long)]
        buyer_name: Option<String>,

        #[arg(long)]
        buyer_email: Option<String>,

        /// Code sent to the 3-D Secure challenge when one is required
        #[arg(long, default_value = ACCEPTED_3DS_CODE)]
        otp: String,
    },
    /// Print the status of a previously created payment
    Status { id: String },
}

fn in_memory_store_factory() -> KeyValueStoreFactory {
    let store = InMemoryKeyValueStore::new();
    Box::new(move || Box::new(store.clone()) as KeyValueStoreBox)
}

#[cfg(feature = "storage-rocksdb")]
fn persistent_store_factory(db_path: PathBuf) -> Result<KeyValueStoreFactory> {
    let store = paysim::infrastructure::rocksdb::RocksDBStore::open(db_path).into_diagnostic()?;
    Ok(Box::new(move || Box::new(store.clone()) as KeyValueStoreBox))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn persistent_store_factory(db_path: PathBuf) -> Result<KeyValueStoreFactory> {
    tracing::warn!(
        path = %db_path.display(),
        "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
    );
    Ok(in_memory_store_factory())
}

/// Polls until the payment reaches a terminal status or `limit` elapses.
async fn wait_for_settlement(
    service: &dyn PaymentService,
    id: &str,
    limit: Duration,
) -> Result<PaymentStatusView> {
    let poll = async {
        loop {
            match service.get_payment_status(id).await {
                Ok(status) if !status.status.is_terminal() => continue,
                result => return result,
            }
        }
    };

    match tokio::time::timeout(limit, poll).await {
        Ok(result) => result.into_diagnostic(),
        Err(_) => {
            tracing::warn!(payment_id = %id, "payment did not settle in time");
            service.get_payment_status(id).await.into_diagnostic()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = PaymentConfig::from_env();
    let webhook_delay = config
        .mock
        .as_ref()
        .map(|mock| mock.webhook_delay())
        .unwrap_or_default();

    let store_factory = match cli.db_path {
        Some(db_path) => persistent_store_factory(db_path)?,
        None => in_memory_store_factory(),
    };
    let factory = PaymentServiceFactory::new().with_store_factory(store_factory);
    let service = MemoizedPaymentService::new(factory, config)
        .get()
        .into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = StatusWriter::new(stdout.lock());

    match cli.command {
        Command::Create {
            amount,
            currency,
            listing_id,
            locale,
            buyer_name,
            buyer_email,
            otp,
        } => {
            let request = CreatePaymentRequest {
                amount: Amount::new(amount).into_diagnostic()?,
                currency: currency.parse().into_diagnostic()?,
                listing_id,
                buyer_info: BuyerInfo {
                    name: buyer_name,
                    email: buyer_email,
                    phone: None,
                },
                locale,
            };

            let created = service.create_payment(request).await.into_diagnostic()?;
            tracing::info!(
                payment_id = %created.id,
                redirect_url = %created.redirect_url,
                "payment created"
            );

            if created.requires_3ds
                && !service
                    .handle_3d_secure(&created.id, &otp)
                    .await
                    .into_diagnostic()?
            {
                tracing::warn!(payment_id = %created.id, "3-D Secure authentication failed");
            }

            let limit = webhook_delay * 2 + Duration::from_secs(10);
            let status = wait_for_settlement(service.as_ref(), &created.id, limit).await?;
            writer.write_status(&status).into_diagnostic()?;
        }
        Command::Status { id } => {
            let status = service.get_payment_status(&id).await.into_diagnostic()?;
            writer.write_status(&status).into_diagnostic()?;
        }
    }

    service.cleanup().await;
    Ok(())
}
