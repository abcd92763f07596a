//! Argviewer - Proposal graph service
//!
//! Stores proposals (statements in a debate), the reply links between them,
//! a per-user vote ledger with denormalized tallies, and follower sets. The
//! `ProposalService` in the application layer is the single entry point for
//! every operation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
