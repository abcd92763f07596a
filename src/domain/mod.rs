//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `proposal` - Proposal aggregate, vote values and lookup filters

pub mod foundation;
pub mod proposal;
