//! Milestone policy tables
//!
//! Two lookups drive everything the engine derives from a milestone's type:
//! how far along the work is, and which stage the invoice moves to.

use sd_models::{MilestoneType, Stage};

/// Completion weight per milestone type. Types not listed weigh 0.
static COMPLETION_WEIGHTS: &[(MilestoneType, u8)] = &[
    (MilestoneType::Created, 10),
    (MilestoneType::PartsAdded, 30),
    (MilestoneType::ServiceCompleted, 60),
    (MilestoneType::CustomerApproved, 100),
];

/// Stage an invoice moves to when a milestone of the type is appended.
/// Types not listed leave the stage unchanged.
static STAGE_OVERRIDES: &[(MilestoneType, Stage)] = &[
    (MilestoneType::ServiceCompleted, Stage::Completed),
    (MilestoneType::PaymentReceived, Stage::Paid),
    (MilestoneType::Archived, Stage::Archived),
];

pub fn completion_weight(milestone_type: &MilestoneType) -> u8 {
    COMPLETION_WEIGHTS
        .iter()
        .find(|(t, _)| t == milestone_type)
        .map_or(0, |(_, weight)| *weight)
}

pub fn stage_override(milestone_type: &MilestoneType) -> Option<Stage> {
    STAGE_OVERRIDES
        .iter()
        .find(|(t, _)| t == milestone_type)
        .map(|(_, stage)| *stage)
}
