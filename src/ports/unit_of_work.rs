//! Transaction port for multi-write proposal operations.
//!
//! Reply attachment and vote accounting each touch two records. They run
//! inside a `ProposalTransaction`, which is committed explicitly and rolled
//! back when dropped without a commit.
//!
//! # Example
//!
//! ```ignore
//! let mut tx = unit_of_work.begin().await?;
//! let proposal = tx.lock_proposal(proposal_id).await?.ok_or(...)?;
//! tx.insert_vote(&vote).await?;
//! tx.write_tally(proposal_id, proposal.tally().with_vote(vote.kind)?).await?;
//! tx.commit().await?;
//! ```

use crate::domain::foundation::{DomainError, ProposalId, Timestamp, UserId};
use crate::domain::proposal::{Proposal, ProposalDraft, Vote, VoteTally};
use async_trait::async_trait;

/// Opens storage transactions.
#[async_trait]
pub trait ProposalUnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn ProposalTransaction>, DomainError>;
}

/// An open storage transaction.
///
/// Implementations must isolate a locked proposal from concurrent
/// transactions until commit or drop, and must enforce uniqueness of the
/// `(user, proposal)` ledger key themselves.
#[async_trait]
pub trait ProposalTransaction: Send {
    /// Load a proposal and hold it against concurrent writers.
    async fn lock_proposal(&mut self, id: ProposalId) -> Result<Option<Proposal>, DomainError>;

    /// Check if a proposal exists, as seen by this transaction.
    async fn proposal_exists(&mut self, id: ProposalId) -> Result<bool, DomainError>;

    /// Insert a new proposal and return the assigned ID.
    async fn insert_proposal(
        &mut self,
        draft: &ProposalDraft,
        created_at: Timestamp,
    ) -> Result<ProposalId, DomainError>;

    /// Link `reply_id` into the reply set of `proposal_id`.
    ///
    /// Returns `false` if the link already existed.
    async fn link_reply(
        &mut self,
        proposal_id: ProposalId,
        reply_id: ProposalId,
    ) -> Result<bool, DomainError>;

    /// Find the ledger entry for a user and proposal.
    async fn find_vote(
        &mut self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<Option<Vote>, DomainError>;

    /// Insert a ledger entry.
    ///
    /// # Errors
    ///
    /// - `DuplicateVote` if the store's uniqueness constraint rejects it
    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), DomainError>;

    /// Delete a ledger entry.
    ///
    /// # Errors
    ///
    /// - `VoteNotFound` if no entry exists
    async fn delete_vote(
        &mut self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<(), DomainError>;

    /// Overwrite the denormalized tally of a proposal.
    async fn write_tally(
        &mut self,
        proposal_id: ProposalId,
        tally: VoteTally,
    ) -> Result<(), DomainError>;

    /// Make every write of this transaction visible.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}
