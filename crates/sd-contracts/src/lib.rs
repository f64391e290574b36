//! # sd-contracts
//!
//! Contract validation for ShopDesk RS.
//!
//! Contracts check records at the boundary, before they reach the tracking
//! engine, so malformed data-entry surfaces as validation errors instead of
//! being silently coerced.

pub mod base;
pub mod invoices;
pub mod milestones;

pub use base::*;
pub use invoices::InvoiceAmountContract;
pub use milestones::{MilestoneContract, MilestoneInput};
