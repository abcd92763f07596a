//! Application layer - Services that orchestrate domain operations over ports.

pub mod handlers;

pub use handlers::proposal::ProposalService;
