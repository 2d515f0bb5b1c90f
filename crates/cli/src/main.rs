//! CIMA Watch command-line interface.
//!
//! `cimawatch check` is the scheduler entry point: an external daily cron
//! invokes it with no payload and it runs the whole pipeline once.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cimawatch_core::parse_catalog;
use cimawatch_feed::FeedClient;
use cimawatch_mail::FileMailer;
use cimawatch_pipeline::{run_daily, RunOutcome};
use cimawatch_store::{FileStore, SubscriptionUpdate};
use cimawatch_types::EmailAddress;

#[derive(Parser)]
#[command(name = "cimawatch")]
#[command(about = "CIMA shortage watcher for hospital catalogs")]
struct Cli {
    /// Store root directory
    #[arg(long, env = "CIMAWATCH_DATA_DIR", default_value = "cimawatch_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daily shortage check once (fetch, diff, mail, snapshot)
    Check {
        /// Feed endpoint override (tests, mirrors)
        #[arg(long, env = "CIMAWATCH_FEED_URL")]
        feed_url: Option<String>,
        /// Directory the file mailer writes messages into
        #[arg(long, env = "CIMAWATCH_OUTBOX_DIR", default_value = "cimawatch_outbox")]
        outbox_dir: PathBuf,
    },
    /// Show the current subscription configuration
    ShowConfig,
    /// Parse a CSV catalog file and upsert the subscription
    ImportCatalog {
        /// CSV/TSV file with a code column ("CN", "Código", ...)
        file: PathBuf,
        /// Recipient emails, comma-separated
        #[arg(long, value_delimiter = ',')]
        emails: Vec<String>,
        /// Hospital display name
        #[arg(long, default_value = "Hospital")]
        hospital: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cimawatch=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let store = FileStore::open(&cli.data_dir)?;

    match cli.command {
        Commands::Check {
            feed_url,
            outbox_dir,
        } => {
            let feed = match feed_url {
                Some(url) => FeedClient::with_base_url(url),
                None => FeedClient::new(),
            };
            let mailer = FileMailer::new(outbox_dir);

            match run_daily(&store, &feed, &mailer, Utc::now()).await? {
                RunOutcome::Skipped(reason) => {
                    println!("Nothing to do: {reason:?}");
                }
                RunOutcome::Completed(summary) => {
                    println!(
                        "New: {}, Continuing: {}, Resolved: {}",
                        summary.new_count, summary.continuing_count, summary.resolved_count
                    );
                    println!(
                        "Delivered: {}, Failed: {}, Snapshot saved: {}, Pruned: {}",
                        summary.delivery.delivered,
                        summary.delivery.failed,
                        summary.snapshot_saved,
                        summary.snapshots_pruned
                    );
                }
            }
        }
        Commands::ShowConfig => match store.load_subscription()? {
            None => println!("No subscription configured."),
            Some(s) => {
                println!("Hospital: {}", s.hospital_name);
                println!(
                    "Recipients: {}",
                    s.emails
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                println!("Catalog codes: {}", s.catalog_codes.len());
                println!("Updated: {}", s.updated_at);
            }
        },
        Commands::ImportCatalog {
            file,
            emails,
            hospital,
        } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let catalog = parse_catalog(&text)?;

            let mut parsed_emails = Vec::new();
            for raw in &emails {
                parsed_emails.push(
                    EmailAddress::new(raw)
                        .with_context(|| format!("invalid email: {raw}"))?,
                );
            }
            // Keep existing recipients when none are passed.
            if parsed_emails.is_empty() {
                if let Some(existing) = store.load_subscription()? {
                    parsed_emails = existing.emails;
                }
            }

            let subscription = store.save_subscription(SubscriptionUpdate {
                emails: parsed_emails,
                catalog_codes: catalog.sorted_codes(),
                hospital_name: hospital,
            })?;
            println!(
                "Imported {} codes for {} ({} recipients)",
                subscription.catalog_codes.len(),
                subscription.hospital_name,
                subscription.emails.len()
            );
        }
    }

    Ok(())
}
