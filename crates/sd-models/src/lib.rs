//! # sd-models
//!
//! Domain models for ShopDesk RS.
//!
//! Invoices are plain documents owned by an external store; this crate gives
//! them a typed shape while keeping every field the store hands back.

pub use sd_core::traits::{Entity, Identifiable, Lockable};

pub mod amount;
pub mod invoice;
pub mod tracking;

pub use amount::Amount;
pub use invoice::Invoice;
pub use tracking::{Milestone, MilestoneData, MilestoneType, Stage, Tracking};
