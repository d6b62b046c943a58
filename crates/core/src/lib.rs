//! Bazaar Core - Shared types and business rules.
//!
//! This crate provides the pieces every Bazaar component agrees on:
//! - `server` - Storefront, vendor, salesperson, admin and POS web app
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere, and makes the money math trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, percentages, emails, statuses
//! - [`role`] - Roles, protected areas and the role guard decision
//! - [`pricing`] - Cart totals, tax, shipping and commission math
//! - [`analytics`] - Revenue aggregation for dashboards

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod pricing;
pub mod role;
pub mod types;

pub use role::{Area, GuardDecision, Role, guard};
pub use types::*;
