//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresProposalRepository` - Proposals and their tag/reply/follower links
//! - `PostgresVoteLedgerRepository` - Read access to the vote ledger
//! - `PostgresUnitOfWork` - Row-locking transactions for multi-write operations
//! - `PostgresUserDirectory` - User existence checks
//!
//! Schema lives in `migrations/` at the crate root.

mod proposal_repository;
mod proposal_rows;
mod unit_of_work;
mod user_directory;
mod vote_ledger_repository;

pub use proposal_repository::PostgresProposalRepository;
pub use unit_of_work::{PostgresProposalTransaction, PostgresUnitOfWork};
pub use user_directory::PostgresUserDirectory;
pub use vote_ledger_repository::PostgresVoteLedgerRepository;
