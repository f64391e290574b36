//! Tracking data embedded in an invoice document
//!
//! `Tracking` is the append-only milestone log plus the values derived from
//! it. The rules that derive them live in `sd-tracking`; this module only
//! describes the stored shape.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Free-form auxiliary payload attached to a milestone (e.g. `amountPaid`)
pub type MilestoneData = serde_json::Map<String, serde_json::Value>;

/// Coarse lifecycle state of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Created,
    InProgress,
    Completed,
    Paid,
    Archived,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Created,
        Stage::InProgress,
        Stage::Completed,
        Stage::Paid,
        Stage::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Paid => "paid",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown stage {:?}", s))
    }
}

/// Kind of event recorded in an invoice's history.
///
/// Types written by other clients that this build does not know are kept
/// verbatim in `Unknown` so they survive a load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MilestoneType {
    Created,
    PartsAdded,
    ServiceCompleted,
    CustomerApproved,
    PaymentReceived,
    PaymentPartial,
    Archived,
    Unknown(String),
}

impl MilestoneType {
    pub const KNOWN: [MilestoneType; 7] = [
        MilestoneType::Created,
        MilestoneType::PartsAdded,
        MilestoneType::ServiceCompleted,
        MilestoneType::CustomerApproved,
        MilestoneType::PaymentReceived,
        MilestoneType::PaymentPartial,
        MilestoneType::Archived,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::PartsAdded => "parts_added",
            Self::ServiceCompleted => "service_completed",
            Self::CustomerApproved => "customer_approved",
            Self::PaymentReceived => "payment_received",
            Self::PaymentPartial => "payment_partial",
            Self::Archived => "archived",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<&str> for MilestoneType {
    fn from(s: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|t| t.as_str() == s)
            .unwrap_or_else(|| Self::Unknown(s.to_string()))
    }
}

impl From<String> for MilestoneType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<MilestoneType> for String {
    fn from(t: MilestoneType) -> Self {
        match t {
            MilestoneType::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for MilestoneType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for MilestoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped, typed entry in the milestone log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(rename = "type")]
    pub milestone_type: MilestoneType,
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: MilestoneData,
}

/// Stored documents may carry an explicit `null` where the field was left unset
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Milestone {
    pub fn new(milestone_type: MilestoneType, timestamp: DateTime<Utc>) -> Self {
        Self {
            milestone_type,
            timestamp,
            notes: String::new(),
            data: MilestoneData::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_data(mut self, data: MilestoneData) -> Self {
        self.data = data;
        self
    }

    pub fn is(&self, milestone_type: &MilestoneType) -> bool {
        &self.milestone_type == milestone_type
    }
}

/// Tracking state embedded in an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    pub current_stage: Stage,
    /// Chronological, append-only
    pub milestones: Vec<Milestone>,
    /// 0-100
    pub completion_percentage: u8,
    /// 0-100
    pub payment_percentage: f64,
    pub last_updated: DateTime<Utc>,
}

impl Tracking {
    /// Most recently appended milestone
    pub fn last_milestone(&self) -> Option<&Milestone> {
        self.milestones.last()
    }

    /// First milestone of the given type, in log order
    pub fn first_of(&self, milestone_type: &MilestoneType) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.is(milestone_type))
    }

    pub fn has(&self, milestone_type: &MilestoneType) -> bool {
        self.first_of(milestone_type).is_some()
    }

    pub fn milestone_count(&self) -> usize {
        self.milestones.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_milestone_type_names() {
        for t in MilestoneType::KNOWN {
            assert_eq!(MilestoneType::from(t.as_str()), t);
        }
        assert_eq!(
            MilestoneType::from("warranty_claim"),
            MilestoneType::Unknown("warranty_claim".to_string())
        );
        assert!(!MilestoneType::from("warranty_claim").is_known());
    }

    #[test]
    fn test_unknown_type_survives_serde() {
        let raw = json!({
            "type": "warranty_claim",
            "timestamp": "2024-03-01T09:00:00Z",
            "notes": "",
            "data": {}
        });
        let milestone: Milestone = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(
            milestone.milestone_type,
            MilestoneType::Unknown("warranty_claim".to_string())
        );
        assert_eq!(serde_json::to_value(&milestone).unwrap(), raw);
    }

    #[test]
    fn test_null_notes_and_data_read_as_empty() {
        let milestone: Milestone = serde_json::from_value(json!({
            "type": "created",
            "timestamp": "2024-03-01T09:00:00Z",
            "notes": null,
            "data": null
        }))
        .unwrap();
        assert_eq!(milestone.notes, "");
        assert!(milestone.data.is_empty());

        let bare: Milestone = serde_json::from_value(json!({
            "type": "parts_added",
            "timestamp": "2024-03-01T09:00:00Z"
        }))
        .unwrap();
        assert!(bare.is(&MilestoneType::PartsAdded));
        assert!(bare.data.is_empty());
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        assert_eq!(serde_json::to_value(Stage::InProgress).unwrap(), json!("in_progress"));
        assert_eq!("completed".parse::<Stage>(), Ok(Stage::Completed));
        assert!("done".parse::<Stage>().is_err());
    }

    #[test]
    fn test_tracking_uses_camel_case_fields() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let tracking = Tracking {
            current_stage: Stage::Created,
            milestones: vec![Milestone::new(MilestoneType::Created, at).with_notes("Invoice created")],
            completion_percentage: 10,
            payment_percentage: 0.0,
            last_updated: at,
        };

        let value = serde_json::to_value(&tracking).unwrap();
        assert_eq!(value["currentStage"], json!("created"));
        assert_eq!(value["completionPercentage"], json!(10));
        assert_eq!(value["milestones"][0]["type"], json!("created"));
        assert!(value.get("lastUpdated").is_some());
    }

    #[test]
    fn test_first_of_and_last() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let tracking = Tracking {
            current_stage: Stage::Completed,
            milestones: vec![
                Milestone::new(MilestoneType::Created, at),
                Milestone::new(MilestoneType::ServiceCompleted, at).with_notes("first"),
                Milestone::new(MilestoneType::ServiceCompleted, at).with_notes("second"),
            ],
            completion_percentage: 60,
            payment_percentage: 0.0,
            last_updated: at,
        };

        assert_eq!(
            tracking.first_of(&MilestoneType::ServiceCompleted).map(|m| m.notes.as_str()),
            Some("first")
        );
        assert_eq!(tracking.last_milestone().map(|m| m.notes.as_str()), Some("second"));
        assert!(!tracking.has(&MilestoneType::PaymentReceived));
        assert_eq!(tracking.milestone_count(), 3);
    }
}
