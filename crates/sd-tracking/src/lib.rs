//! # sd-tracking
//!
//! Invoice lifecycle tracking for ShopDesk RS.
//!
//! An invoice moves through coarse stages (created, completed, paid,
//! archived) while an append-only log of milestones records what happened
//! and when. Completion and payment percentages, the current stage and the
//! display status are all derived from that log.
//!
//! The engine never touches storage: callers load an invoice, run it through
//! [`TrackingEngine`], and write the whole returned document back.

pub mod engine;
pub mod policy;
pub mod status;
pub mod summary;

pub use engine::{CompletionRequest, MilestoneOutcome, TrackingEngine, INITIAL_NOTES};
pub use policy::{completion_weight, stage_override};
pub use status::{tracking_status, StatusIcon, StatusPresentation, Tone, TrackingStatus};
pub use summary::{tracking_summary, LastActivity, TrackingSummary};
