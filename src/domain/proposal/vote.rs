//! Vote ledger entries and the denormalized tally.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProposalId, UserId};

use super::ProposalError;

/// Polarity of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Upvote,
    Downvote,
}

impl VoteKind {
    pub fn from_is_upvote(is_upvote: bool) -> Self {
        if is_upvote {
            VoteKind::Upvote
        } else {
            VoteKind::Downvote
        }
    }

    pub fn is_upvote(&self) -> bool {
        matches!(self, VoteKind::Upvote)
    }
}

/// One user's vote on one proposal. Created by a vote action, deleted by a
/// retraction, never changed in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: UserId,
    pub proposal_id: ProposalId,
    pub kind: VoteKind,
}

impl Vote {
    pub fn new(user_id: UserId, proposal_id: ProposalId, kind: VoteKind) -> Self {
        Self {
            user_id,
            proposal_id,
            kind,
        }
    }
}

/// Upvote/downvote counters cached on a proposal.
///
/// Must equal the live ledger count for the proposal by polarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub upvotes: u32,
    pub downvotes: u32,
}

impl VoteTally {
    pub fn new(upvotes: u32, downvotes: u32) -> Self {
        Self { upvotes, downvotes }
    }

    pub fn total(&self) -> u32 {
        self.upvotes + self.downvotes
    }

    /// Tally after recording a vote of the given kind.
    pub fn with_vote(self, kind: VoteKind) -> Result<Self, ProposalError> {
        let mut next = self;
        let counter = next.counter_mut(kind);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| ProposalError::consistency(format!("{:?} tally overflow", kind)))?;
        Ok(next)
    }

    /// Tally after retracting a vote of the given kind.
    ///
    /// A counter already at zero means the ledger and the tally disagree.
    pub fn without_vote(self, kind: VoteKind) -> Result<Self, ProposalError> {
        let mut next = self;
        let counter = next.counter_mut(kind);
        *counter = counter.checked_sub(1).ok_or_else(|| {
            ProposalError::consistency(format!(
                "{:?} tally would go negative while a ledger entry exists",
                kind
            ))
        })?;
        Ok(next)
    }

    /// Counts a batch of ledger entries.
    pub fn from_votes<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> Self {
        votes
            .into_iter()
            .fold(Self::default(), |mut tally, vote| {
                *tally.counter_mut(vote.kind) += 1;
                tally
            })
    }

    fn counter_mut(&mut self, kind: VoteKind) -> &mut u32 {
        match kind {
            VoteKind::Upvote => &mut self.upvotes,
            VoteKind::Downvote => &mut self.downvotes,
        }
    }
}
