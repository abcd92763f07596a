//! Vote ledger repository port (read side).
//!
//! Ledger writes always travel with a tally update, so they live on
//! `ProposalTransaction`. This port only reads.

use crate::domain::foundation::{DomainError, ProposalId, UserId};
use crate::domain::proposal::{Vote, VoteTally};
use async_trait::async_trait;

/// Read port over the `(user, proposal)` vote ledger.
#[async_trait]
pub trait VoteLedgerRepository: Send + Sync {
    /// Find the ledger entry for a user and proposal.
    async fn find(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<Option<Vote>, DomainError>;

    /// Recount the ledger entries for a proposal by polarity.
    async fn tally_for(&self, proposal_id: ProposalId) -> Result<VoteTally, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_ledger_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn VoteLedgerRepository) {}
    }
}
