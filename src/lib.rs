//! plangate - tiered content catalog
//!
//! Decides which learning materials a subscriber sees and may open, given
//! their plan tier.
//!
//! ## Components
//!
//! - **Plan**: the ordered Demo < Essential < Growth < Prime tiers plus the
//!   Admin sentinel, and compact plan sets
//! - **Catalog**: the compiled-in fixed activities merged with admin-authored
//!   dynamic items and per-item overrides
//! - **Store**: the catalog store port, with in-memory and MongoDB backends
//! - **Auth**: effective plan, admin plan simulation and access evaluation
//! - **Features**: the administrator-editable plan/feature matrix
//! - **Logging**: JSONL audit trail of administrator actions

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod features;
pub mod logging;
pub mod plan;
pub mod store;
pub mod types;

pub use config::Args;
pub use plan::{PlanSet, PlanTier};
pub use types::{GateError, Result};
