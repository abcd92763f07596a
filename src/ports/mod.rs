//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `ProposalRepository` - Proposal records, tag/reply/follower links
//! - `VoteLedgerRepository` - Read access to the `(user, proposal)` vote ledger
//! - `ProposalUnitOfWork` - Scoped transactions for multi-write operations
//!
//! ## Collaborator Ports
//!
//! - `UserDirectory` - User existence checks

mod proposal_repository;
mod unit_of_work;
mod user_directory;
mod vote_ledger_repository;

pub use proposal_repository::ProposalRepository;
pub use unit_of_work::{ProposalTransaction, ProposalUnitOfWork};
pub use user_directory::UserDirectory;
pub use vote_ledger_repository::VoteLedgerRepository;
