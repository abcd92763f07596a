//! In-memory adapters for the storage and user ports.

mod proposal_store;
mod user_directory;

pub use proposal_store::InMemoryProposalStore;
pub use user_directory::InMemoryUserDirectory;
