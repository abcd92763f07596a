//! Application handlers.
//!
//! Services that orchestrate domain operations.

pub mod proposal;
