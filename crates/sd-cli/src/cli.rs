use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sd_core::config::{AppConfig, ReinitPolicy, WritePolicy};
use serde_json::Value;

/// Track repair invoices from service through payment.
#[derive(Parser, Debug)]
#[command(name = "shopdesk-tracking", version)]
pub struct Cli {
    /// Directory holding one JSON document per invoice
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Reject unreadable amounts and unknown milestone types
    #[arg(long, global = true)]
    pub strict: bool,

    /// Refuse saves of invoices changed since they were read
    #[arg(long, global = true)]
    pub optimistic: bool,

    /// Keep existing history when `init` runs on a tracked invoice
    #[arg(long, global = true)]
    pub preserve_history: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List stored invoices with their tracking status
    List,

    /// Start tracking an invoice
    Init { id: String },

    /// Append a milestone
    Add {
        id: String,

        /// created, parts_added, service_completed, customer_approved,
        /// payment_received, payment_partial or archived
        #[arg(value_name = "TYPE")]
        milestone_type: String,

        #[arg(long, default_value = "")]
        notes: String,

        /// Payment amount carried by the milestone
        #[arg(long)]
        amount_paid: Option<f64>,

        /// Extra milestone data as key=value (value parsed as JSON when possible)
        #[arg(long = "data", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        data: Vec<(String, Value)>,
    },

    /// Mark the service completed, optionally recording a payment
    Complete {
        id: String,

        /// Paid in full
        #[arg(long, conflicts_with = "amount_paid")]
        paid: bool,

        /// Partial payment taken at completion
        #[arg(long, default_value_t = 0.0)]
        amount_paid: f64,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Archive an invoice
    Archive {
        id: String,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Print the tracking summary as JSON
    Summary { id: String },

    /// Print the display status
    Status {
        id: String,

        /// Print label, tone and icon as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = dir.clone();
        }
        if self.strict {
            config.tracking.strict_amounts = true;
        }
        if self.optimistic {
            config.tracking.write_policy = WritePolicy::Optimistic;
        }
        if self.preserve_history {
            config.tracking.reinit_policy = ReinitPolicy::Preserve;
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", raw))?;
    if key.is_empty() {
        return Err("key must not be empty".to_string());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
