//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - axum REST endpoints over `ProposalService`
//! - `memory` - In-process stores for tests and local runs
//! - `postgres` - sqlx-backed stores and the transactional unit of work

pub mod http;
pub mod memory;
pub mod postgres;
