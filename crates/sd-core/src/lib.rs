//! # sd-core
//!
//! Core types, traits, and utilities for ShopDesk RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - Result type aliases and the service result pattern (ServiceResult)
//! - Core traits (Identifiable, Lockable, Entity)
//! - Injectable time sources (Clock)
//! - Configuration types

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use clock::*;
pub use error::*;
pub use result::*;
pub use traits::*;
