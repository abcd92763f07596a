//! Proposal repository port.
//!
//! Defines the contract for storing and retrieving Proposal aggregates,
//! their tag links, reply links and follower sets.
//!
//! # Design
//!
//! - **Single-write operations only**: anything that must change two records
//!   together goes through `ProposalUnitOfWork`
//! - **No cascades**: deleting a proposal removes its own rows and nothing
//!   else; reply links held by other proposals and ledger entries stay

use crate::domain::foundation::{DomainError, ProposalId, Timestamp, UserId};
use crate::domain::proposal::{Proposal, ProposalDraft, ProposalEdit, ProposalQuery};
use async_trait::async_trait;

/// Repository port for Proposal persistence.
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Find a proposal by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: ProposalId) -> Result<Option<Proposal>, DomainError>;

    /// Find the proposals with the given IDs. Missing IDs are skipped; order
    /// is unspecified.
    async fn find_by_ids(&self, ids: &[ProposalId]) -> Result<Vec<Proposal>, DomainError>;

    /// Find every proposal matching all criteria of the query, in store order.
    async fn find_matching(&self, query: &ProposalQuery) -> Result<Vec<Proposal>, DomainError>;

    /// Check if a proposal exists.
    async fn exists(&self, id: ProposalId) -> Result<bool, DomainError>;

    /// Insert a new proposal and return the assigned ID.
    ///
    /// The draft is assumed to be validated already.
    async fn insert(
        &self,
        draft: &ProposalDraft,
        created_at: Timestamp,
    ) -> Result<ProposalId, DomainError>;

    /// Replace text, source and tags of an existing proposal.
    ///
    /// # Errors
    ///
    /// - `ProposalNotFound` if the proposal doesn't exist
    async fn apply_edit(&self, edit: &ProposalEdit) -> Result<(), DomainError>;

    /// Delete a proposal.
    ///
    /// # Errors
    ///
    /// - `ProposalNotFound` if the proposal doesn't exist
    async fn delete(&self, id: ProposalId) -> Result<(), DomainError>;

    /// Add a user to the follower set. No-op if already following.
    ///
    /// # Errors
    ///
    /// - `ProposalNotFound` if the proposal doesn't exist
    async fn add_follower(&self, id: ProposalId, user_id: UserId) -> Result<(), DomainError>;

    /// Remove a user from the follower set. No-op if not following.
    async fn remove_follower(&self, id: ProposalId, user_id: UserId) -> Result<(), DomainError>;
}
