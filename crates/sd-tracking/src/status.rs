//! Display status of a tracked invoice
//!
//! `TrackingStatus` is the domain answer; `StatusPresentation` is what a UI
//! shows for it. Web front ends map `Tone` to CSS with `web_color_class`.

use sd_models::{Invoice, Stage};
use serde::{Deserialize, Serialize};

use crate::summary::tracking_summary;

/// Finer-grained status than `Stage`, taking payment into account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    /// No tracking on the invoice
    Untracked,
    Pending,
    CompletedUnpaid,
    CompletedPaid,
    Paid,
    Archived,
}

impl TrackingStatus {
    pub fn derive(stage: Stage, payment_percentage: f64) -> Self {
        match stage {
            Stage::Completed if payment_percentage < 100.0 => Self::CompletedUnpaid,
            Stage::Completed => Self::CompletedPaid,
            Stage::Paid => Self::Paid,
            Stage::Archived => Self::Archived,
            Stage::Created | Stage::InProgress => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untracked => "untracked",
            Self::Pending => "pending",
            Self::CompletedUnpaid => "completed_unpaid",
            Self::CompletedPaid => "completed_paid",
            Self::Paid => "paid",
            Self::Archived => "archived",
        }
    }

    pub fn presentation(&self) -> StatusPresentation {
        let (label, tone, icon) = match self {
            Self::CompletedUnpaid => ("Completed (Unpaid)", Tone::Warning, StatusIcon::AlertCircle),
            Self::CompletedPaid => ("Completed (Paid)", Tone::Success, StatusIcon::CheckCircle),
            Self::Paid => ("Paid", Tone::Info, StatusIcon::DollarSign),
            Self::Archived => ("Archived", Tone::Muted, StatusIcon::Archive),
            Self::Pending | Self::Untracked => ("Pending", Tone::Neutral, StatusIcon::Clock),
        };
        StatusPresentation { label, tone, icon }
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic colour of a status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Warning,
    Success,
    Info,
    Muted,
}

impl Tone {
    /// Tailwind classes used by the web dashboard
    pub fn web_color_class(&self) -> &'static str {
        match self {
            Self::Neutral => "bg-gray-100 text-gray-800",
            Self::Warning => "bg-yellow-100 text-yellow-800",
            Self::Success => "bg-green-100 text-green-800",
            Self::Info => "bg-blue-100 text-blue-800",
            Self::Muted => "bg-gray-100 text-gray-500",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIcon {
    Clock,
    AlertCircle,
    CheckCircle,
    DollarSign,
    Archive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusPresentation {
    pub label: &'static str,
    pub tone: Tone,
    pub icon: StatusIcon,
}

/// Status of an invoice; `Untracked` when it has no tracking
pub fn tracking_status(invoice: &Invoice) -> TrackingStatus {
    tracking_summary(invoice).map_or(TrackingStatus::Untracked, |summary| summary.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive() {
        assert_eq!(TrackingStatus::derive(Stage::Created, 0.0), TrackingStatus::Pending);
        assert_eq!(TrackingStatus::derive(Stage::InProgress, 50.0), TrackingStatus::Pending);
        assert_eq!(
            TrackingStatus::derive(Stage::Completed, 99.9),
            TrackingStatus::CompletedUnpaid
        );
        assert_eq!(
            TrackingStatus::derive(Stage::Completed, 100.0),
            TrackingStatus::CompletedPaid
        );
        assert_eq!(TrackingStatus::derive(Stage::Paid, 0.0), TrackingStatus::Paid);
        assert_eq!(TrackingStatus::derive(Stage::Archived, 100.0), TrackingStatus::Archived);
    }

    #[test]
    fn test_presentation_labels() {
        let labels: Vec<_> = [
            TrackingStatus::Untracked,
            TrackingStatus::Pending,
            TrackingStatus::CompletedUnpaid,
            TrackingStatus::CompletedPaid,
            TrackingStatus::Paid,
            TrackingStatus::Archived,
        ]
        .iter()
        .map(|s| s.presentation().label)
        .collect();

        assert_eq!(
            labels,
            vec![
                "Pending",
                "Pending",
                "Completed (Unpaid)",
                "Completed (Paid)",
                "Paid",
                "Archived"
            ]
        );
    }

    #[test]
    fn test_web_adapter() {
        let p = TrackingStatus::CompletedUnpaid.presentation();
        assert_eq!(p.tone.web_color_class(), "bg-yellow-100 text-yellow-800");
        assert_eq!(p.icon, StatusIcon::AlertCircle);
    }

    #[test]
    fn test_untracked_invoice() {
        assert_eq!(tracking_status(&Invoice::new(10.0)), TrackingStatus::Untracked);
    }
}
