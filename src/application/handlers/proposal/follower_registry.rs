//! FollowerRegistry - Users following a proposal.

use std::sync::Arc;

use crate::domain::foundation::{ProposalId, UserId};
use crate::domain::proposal::ProposalError;
use crate::ports::{ProposalRepository, UserDirectory};

pub struct FollowerRegistry {
    repository: Arc<dyn ProposalRepository>,
    users: Arc<dyn UserDirectory>,
}

impl FollowerRegistry {
    pub fn new(repository: Arc<dyn ProposalRepository>, users: Arc<dyn UserDirectory>) -> Self {
        Self { repository, users }
    }

    /// Idempotent. Both the proposal and the user must exist.
    pub async fn add_follower(
        &self,
        proposal_id: ProposalId,
        user_id: UserId,
    ) -> Result<(), ProposalError> {
        self.require_proposal(proposal_id).await?;
        if !self.users.exists(user_id).await? {
            return Err(ProposalError::user_not_found(user_id));
        }

        self.repository.add_follower(proposal_id, user_id).await?;
        tracing::info!(proposal_id = %proposal_id, user_id = %user_id, "Follower added");
        Ok(())
    }

    /// Removing a user who does not follow is a no-op.
    pub async fn remove_follower(
        &self,
        proposal_id: ProposalId,
        user_id: UserId,
    ) -> Result<(), ProposalError> {
        self.require_proposal(proposal_id).await?;

        self.repository.remove_follower(proposal_id, user_id).await?;
        tracing::info!(proposal_id = %proposal_id, user_id = %user_id, "Follower removed");
        Ok(())
    }

    async fn require_proposal(&self, proposal_id: ProposalId) -> Result<(), ProposalError> {
        if self.repository.exists(proposal_id).await? {
            Ok(())
        } else {
            Err(ProposalError::proposal_not_found(proposal_id))
        }
    }
}
