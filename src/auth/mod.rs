//! Authorization for subscriber content
//!
//! Provides:
//! - The identity shape handed in by the host application
//! - Effective plan resolution with admin plan simulation
//! - Item and feature access evaluation

pub mod access;
pub mod identity;
pub mod simulation;

pub use access::{admin_bypass, can_access, required_tier_for, upgrade_hint};
pub use identity::Identity;
pub use simulation::{EffectivePlan, MemorySessionStore, PlanSimulator, SessionStore};
