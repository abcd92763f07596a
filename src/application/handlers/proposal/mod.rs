//! Proposal handlers.
//!
//! `ProposalService` is the entry point; the other components each own one
//! concern and are reachable through it.

mod follower_registry;
mod proposal_service;
mod query_engine;
mod reply_graph;
mod vote_ledger;

pub use follower_registry::FollowerRegistry;
pub use proposal_service::ProposalService;
pub use query_engine::ProposalQueryEngine;
pub use reply_graph::ReplyGraph;
pub use vote_ledger::VoteLedger;
