//! Cycleflow - Regulatory Test-Cycle Workflow Engine
//!
//! This crate implements the core workflow machinery that drives a report
//! through an ordered sequence of testing phases: phase state and schedule
//! tracking, per-phase activity gating, versioned phase artifacts with an
//! independent approval lifecycle, and assignment fan-out that routes
//! approved decisions to the responsible party for each line of business.
//!
//! The HTTP layer, identity/RBAC storage, and notification delivery are
//! external collaborators consumed through the ports in [`ports`].

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
