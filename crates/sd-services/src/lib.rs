//! # sd-services
//!
//! Invoice tracking services for ShopDesk RS.
//!
//! Services sit between callers and the document store: they load an invoice,
//! run it through the tracking engine, and write the whole document back.

pub mod file_store;
pub mod store;
pub mod tracking;

pub use file_store::JsonFileStore;
pub use store::{InvoiceStore, MemoryInvoiceStore};
pub use tracking::{InvoiceTrackingService, MilestoneParams};
