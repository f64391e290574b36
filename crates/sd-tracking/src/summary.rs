//! Read-only projection of an invoice's tracking state

use chrono::{DateTime, Duration, Utc};
use sd_models::{Invoice, MilestoneType, Stage, Tracking};
use serde::{Serialize, Serializer};

use crate::status::TrackingStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSummary {
    pub status: TrackingStatus,
    pub stage: Stage,
    pub completion_percentage: u8,
    pub payment_percentage: f64,
    /// From `created` to `service_completed`
    #[serde(serialize_with = "serialize_millis")]
    pub time_to_complete: Option<Duration>,
    /// From `service_completed` to `payment_received`
    #[serde(serialize_with = "serialize_millis")]
    pub time_to_pay: Option<Duration>,
    pub last_activity: Option<LastActivity>,
    pub milestone_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastActivity {
    #[serde(rename = "type")]
    pub milestone_type: MilestoneType,
    pub timestamp: DateTime<Utc>,
    pub notes: String,
}

impl TrackingSummary {
    pub fn from_tracking(tracking: &Tracking) -> Self {
        Self {
            status: TrackingStatus::derive(tracking.current_stage, tracking.payment_percentage),
            stage: tracking.current_stage,
            completion_percentage: tracking.completion_percentage,
            payment_percentage: tracking.payment_percentage,
            time_to_complete: between(
                tracking,
                &MilestoneType::Created,
                &MilestoneType::ServiceCompleted,
            ),
            time_to_pay: between(
                tracking,
                &MilestoneType::ServiceCompleted,
                &MilestoneType::PaymentReceived,
            ),
            last_activity: tracking.last_milestone().map(|m| LastActivity {
                milestone_type: m.milestone_type.clone(),
                timestamp: m.timestamp,
                notes: m.notes.clone(),
            }),
            milestone_count: tracking.milestone_count(),
        }
    }

    pub fn time_to_complete_ms(&self) -> Option<i64> {
        self.time_to_complete.map(|d| d.num_milliseconds())
    }

    pub fn time_to_pay_ms(&self) -> Option<i64> {
        self.time_to_pay.map(|d| d.num_milliseconds())
    }
}

/// Summary of an invoice's tracking; `None` when it is untracked
pub fn tracking_summary(invoice: &Invoice) -> Option<TrackingSummary> {
    invoice.tracking.as_ref().map(TrackingSummary::from_tracking)
}

/// Time between the first milestones of two types
fn between(tracking: &Tracking, from: &MilestoneType, to: &MilestoneType) -> Option<Duration> {
    let start = tracking.first_of(from)?;
    let end = tracking.first_of(to)?;
    Some(end.timestamp - start.timestamp)
}

fn serialize_millis<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&d.num_milliseconds()),
        None => serializer.serialize_none(),
    }
}
