//! ShopDesk invoice tracking CLI
//!
//! Drives the tracking service against a directory of invoice documents.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use sd_core::config::{AppConfig, LogFormat, LoggingConfig};
use sd_core::result::ServiceResult;
use sd_models::{MilestoneType, Stage};
use sd_services::{InvoiceStore, InvoiceTrackingService, JsonFileStore, MilestoneParams};
use sd_tracking::{tracking_status, CompletionRequest, MilestoneOutcome, TrackingEngine};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    cli.apply(&mut config);

    init_tracing(&config.logging);
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.storage.data_dir.display(),
        write_policy = ?config.tracking.write_policy,
        reinit_policy = ?config.tracking.reinit_policy,
        strict = config.tracking.strict_amounts,
        "Starting shopdesk-tracking"
    );

    let store = Arc::new(JsonFileStore::new(config.storage.data_dir.clone()));
    let service = InvoiceTrackingService::new(
        store.clone(),
        TrackingEngine::system(),
        config.tracking.clone(),
    );

    match cli.command {
        Command::List => {
            let invoices = store.list().await?;
            if invoices.is_empty() {
                info!(data_dir = %config.storage.data_dir.display(), "No invoices found");
            }
            for invoice in invoices {
                let status = tracking_status(&invoice);
                let (stage, completion, payment) = invoice
                    .tracking
                    .as_ref()
                    .map_or(("-", 0, 0.0), |t| {
                        (t.current_stage.as_str(), t.completion_percentage, t.payment_percentage)
                    });
                println!(
                    "{:<24} {:<12} {:<20} {:>3}% done {:>5.1}% paid",
                    invoice.display_ref(),
                    stage,
                    status.presentation().label,
                    completion,
                    payment
                );
            }
        }
        Command::Init { id } => {
            let invoice = finish(service.initialize(&id).await)?;
            println!(
                "{}: tracking {}",
                invoice.display_ref(),
                invoice
                    .tracking
                    .as_ref()
                    .map_or(Stage::Created, |t| t.current_stage)
            );
        }
        Command::Add {
            id,
            milestone_type,
            notes,
            amount_paid,
            data,
        } => {
            let mut params = MilestoneParams::new(MilestoneType::from(milestone_type.as_str()))
                .with_notes(notes);
            for (key, value) in data {
                params = params.with_data(key, value);
            }
            if let Some(amount) = amount_paid {
                params = params.with_data("amountPaid", amount);
            }
            report(finish(service.add_milestone(&id, params).await)?);
        }
        Command::Complete {
            id,
            paid,
            amount_paid,
            notes,
        } => {
            let request = if paid {
                CompletionRequest::paid()
            } else {
                CompletionRequest::partial(amount_paid)
            }
            .with_notes(notes);
            report(finish(service.mark_completed(&id, request).await)?);
        }
        Command::Archive { id, notes } => {
            report(finish(service.archive(&id, notes).await)?);
        }
        Command::Summary { id } => match finish(service.summary(&id).await)? {
            Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
            None => println!("null"),
        },
        Command::Status { id, json } => {
            let status = finish(service.status(&id).await)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status.presentation())?);
            } else {
                println!("{}", status.presentation().label);
            }
        }
    }

    Ok(())
}

/// Initialize structured logging on stderr
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Turn a failed service result into an error listing its messages
fn finish<T>(result: ServiceResult<T>) -> anyhow::Result<T> {
    if result.is_success() {
        return Ok(result.into_result()?);
    }
    let code = result.error_code.unwrap_or("error");
    let messages = result.errors.full_messages();
    bail!("{}: {}", code, messages.join("; "))
}

fn report(outcome: MilestoneOutcome) {
    if outcome.auto_initialized {
        info!(invoice = %outcome.invoice.display_ref(), "Tracking was initialized first");
    }
    let status = tracking_status(&outcome.invoice);
    if let Some(t) = outcome.tracking() {
        println!(
            "{}: {} ({}% done, {:.1}% paid, {} milestones)",
            outcome.invoice.display_ref(),
            status.presentation().label,
            t.completion_percentage,
            t.payment_percentage,
            t.milestones.len()
        );
    }
}
