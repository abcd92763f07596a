//! VoteLedger - One vote per user per proposal, tallies kept in step.
//!
//! Every add and remove runs inside a single transaction that locks the
//! proposal first. A second voter on the same proposal waits for the lock and
//! re-reads the ledger after the first commits.

use std::sync::Arc;

use crate::domain::foundation::{ProposalId, UserId};
use crate::domain::proposal::{ProposalError, Vote, VoteKind, VoteTally};
use crate::ports::{ProposalRepository, ProposalUnitOfWork, UserDirectory, VoteLedgerRepository};

pub struct VoteLedger {
    proposals: Arc<dyn ProposalRepository>,
    ledger: Arc<dyn VoteLedgerRepository>,
    unit_of_work: Arc<dyn ProposalUnitOfWork>,
    users: Arc<dyn UserDirectory>,
}

impl VoteLedger {
    pub fn new(
        proposals: Arc<dyn ProposalRepository>,
        ledger: Arc<dyn VoteLedgerRepository>,
        unit_of_work: Arc<dyn ProposalUnitOfWork>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            proposals,
            ledger,
            unit_of_work,
            users,
        }
    }

    /// Record a vote and bump the matching tally.
    pub async fn add_vote(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
        kind: VoteKind,
    ) -> Result<VoteTally, ProposalError> {
        self.require_user(user_id).await?;

        let mut tx = self.unit_of_work.begin().await?;

        let proposal = tx
            .lock_proposal(proposal_id)
            .await?
            .ok_or_else(|| ProposalError::proposal_not_found(proposal_id))?;

        if tx.find_vote(user_id, proposal_id).await?.is_some() {
            tracing::warn!(
                user_id = %user_id,
                proposal_id = %proposal_id,
                "Rejected duplicate vote"
            );
            return Err(ProposalError::already_voted(user_id, proposal_id));
        }

        let tally = proposal.tally().with_vote(kind)?;
        tx.insert_vote(&Vote::new(user_id, proposal_id, kind))
            .await
            .map_err(|e| self.log_consistency(proposal_id, e.into()))?;
        tx.write_tally(proposal_id, tally).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            proposal_id = %proposal_id,
            upvote = kind.is_upvote(),
            upvotes = tally.upvotes,
            downvotes = tally.downvotes,
            "Vote recorded"
        );
        Ok(tally)
    }

    /// Retract a vote and decrement the matching tally.
    pub async fn remove_vote(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<VoteTally, ProposalError> {
        self.require_user(user_id).await?;

        let mut tx = self.unit_of_work.begin().await?;

        let proposal = tx
            .lock_proposal(proposal_id)
            .await?
            .ok_or_else(|| ProposalError::proposal_not_found(proposal_id))?;

        let vote = match tx.find_vote(user_id, proposal_id).await? {
            Some(vote) => vote,
            None => {
                tracing::warn!(
                    user_id = %user_id,
                    proposal_id = %proposal_id,
                    "Rejected removal of absent vote"
                );
                return Err(ProposalError::not_voted(user_id, proposal_id));
            }
        };

        let tally = proposal
            .tally()
            .without_vote(vote.kind)
            .map_err(|e| self.log_consistency(proposal_id, e))?;
        tx.delete_vote(user_id, proposal_id).await?;
        tx.write_tally(proposal_id, tally).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            proposal_id = %proposal_id,
            upvotes = tally.upvotes,
            downvotes = tally.downvotes,
            "Vote removed"
        );
        Ok(tally)
    }

    /// Current ledger entry for a user and proposal.
    pub async fn find_vote(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<Option<Vote>, ProposalError> {
        Ok(self.ledger.find(user_id, proposal_id).await?)
    }

    /// Recount the ledger and compare it with the stored tally.
    pub async fn audit_tally(&self, proposal_id: ProposalId) -> Result<VoteTally, ProposalError> {
        let proposal = self
            .proposals
            .find_by_id(proposal_id)
            .await?
            .ok_or_else(|| ProposalError::proposal_not_found(proposal_id))?;

        let counted = self.ledger.tally_for(proposal_id).await?;
        if counted != proposal.tally() {
            return Err(self.log_consistency(
                proposal_id,
                ProposalError::consistency(format!(
                    "Stored tally {}/{} disagrees with ledger {}/{} for proposal {}",
                    proposal.upvote_count(),
                    proposal.downvote_count(),
                    counted.upvotes,
                    counted.downvotes,
                    proposal_id
                )),
            ));
        }

        tracing::debug!(proposal_id = %proposal_id, "Tally matches ledger");
        Ok(counted)
    }

    async fn require_user(&self, user_id: UserId) -> Result<(), ProposalError> {
        if self.users.exists(user_id).await? {
            Ok(())
        } else {
            Err(ProposalError::user_not_found(user_id))
        }
    }

    fn log_consistency(&self, proposal_id: ProposalId, err: ProposalError) -> ProposalError {
        if let ProposalError::ConsistencyViolation(message) = &err {
            tracing::error!(proposal_id = %proposal_id, error = %message, "Vote ledger inconsistency");
        }
        err
    }
}
