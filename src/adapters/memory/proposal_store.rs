//! In-Memory Proposal Store Adapter
//!
//! Stores proposals and the vote ledger in memory. Implements every storage
//! port of the proposal domain. Useful for testing and development.
//!
//! Transactions take an owned lock over the whole store and work on a staged
//! copy; commit swaps the copy in, dropping the transaction discards it.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::{DomainError, ErrorCode, ProposalId, Timestamp, UserId};
use crate::domain::proposal::{
    Proposal, ProposalDraft, ProposalEdit, ProposalQuery, Vote, VoteTally,
};
use crate::ports::{
    ProposalRepository, ProposalTransaction, ProposalUnitOfWork, VoteLedgerRepository,
};

#[derive(Debug, Clone, Default)]
struct StoreState {
    last_id: i64,
    proposals: BTreeMap<ProposalId, Proposal>,
    votes: HashMap<(UserId, ProposalId), Vote>,
}

impl StoreState {
    fn insert(&mut self, draft: &ProposalDraft, created_at: Timestamp) -> ProposalId {
        self.last_id += 1;
        let id = ProposalId::new(self.last_id);
        self.proposals
            .insert(id, Proposal::from_draft(id, draft, created_at));
        id
    }

    fn proposal_mut(&mut self, id: ProposalId) -> Result<&mut Proposal, DomainError> {
        self.proposals
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(ErrorCode::ProposalNotFound, "Proposal", id))
    }
}

/// In-memory storage for proposals and votes.
///
/// Each transaction stages a full copy of the state, so this store is not
/// meant for large data sets.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProposalStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryProposalStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored proposals
    pub async fn proposal_count(&self) -> usize {
        self.state.lock().await.proposals.len()
    }

    /// Get the number of ledger entries
    pub async fn vote_count(&self) -> usize {
        self.state.lock().await.votes.len()
    }
}

#[async_trait]
impl ProposalRepository for InMemoryProposalStore {
    async fn find_by_id(&self, id: ProposalId) -> Result<Option<Proposal>, DomainError> {
        Ok(self.state.lock().await.proposals.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ProposalId]) -> Result<Vec<Proposal>, DomainError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.proposals.get(id).cloned())
            .collect())
    }

    async fn find_matching(&self, query: &ProposalQuery) -> Result<Vec<Proposal>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .proposals
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }

    async fn exists(&self, id: ProposalId) -> Result<bool, DomainError> {
        Ok(self.state.lock().await.proposals.contains_key(&id))
    }

    async fn insert(
        &self,
        draft: &ProposalDraft,
        created_at: Timestamp,
    ) -> Result<ProposalId, DomainError> {
        Ok(self.state.lock().await.insert(draft, created_at))
    }

    async fn apply_edit(&self, edit: &ProposalEdit) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        state.proposal_mut(edit.id)?.apply_edit(edit);
        Ok(())
    }

    async fn delete(&self, id: ProposalId) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        state
            .proposals
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(ErrorCode::ProposalNotFound, "Proposal", id))
    }

    async fn add_follower(&self, id: ProposalId, user_id: UserId) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        state.proposal_mut(id)?.add_follower(user_id);
        Ok(())
    }

    async fn remove_follower(&self, id: ProposalId, user_id: UserId) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        if let Some(proposal) = state.proposals.get_mut(&id) {
            proposal.remove_follower(user_id);
        }
        Ok(())
    }
}

#[async_trait]
impl VoteLedgerRepository for InMemoryProposalStore {
    async fn find(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<Option<Vote>, DomainError> {
        Ok(self
            .state
            .lock()
            .await
            .votes
            .get(&(user_id, proposal_id))
            .copied())
    }

    async fn tally_for(&self, proposal_id: ProposalId) -> Result<VoteTally, DomainError> {
        let state = self.state.lock().await;
        Ok(VoteTally::from_votes(
            state.votes.values().filter(|v| v.proposal_id == proposal_id),
        ))
    }
}

#[async_trait]
impl ProposalUnitOfWork for InMemoryProposalStore {
    async fn begin(&self) -> Result<Box<dyn ProposalTransaction>, DomainError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, staged }))
    }
}

/// Transaction holding the store lock until commit or drop.
struct InMemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    staged: StoreState,
}

#[async_trait]
impl ProposalTransaction for InMemoryTransaction {
    async fn lock_proposal(&mut self, id: ProposalId) -> Result<Option<Proposal>, DomainError> {
        Ok(self.staged.proposals.get(&id).cloned())
    }

    async fn proposal_exists(&mut self, id: ProposalId) -> Result<bool, DomainError> {
        Ok(self.staged.proposals.contains_key(&id))
    }

    async fn insert_proposal(
        &mut self,
        draft: &ProposalDraft,
        created_at: Timestamp,
    ) -> Result<ProposalId, DomainError> {
        Ok(self.staged.insert(draft, created_at))
    }

    async fn link_reply(
        &mut self,
        proposal_id: ProposalId,
        reply_id: ProposalId,
    ) -> Result<bool, DomainError> {
        Ok(self.staged.proposal_mut(proposal_id)?.link_reply(reply_id))
    }

    async fn find_vote(
        &mut self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<Option<Vote>, DomainError> {
        Ok(self.staged.votes.get(&(user_id, proposal_id)).copied())
    }

    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), DomainError> {
        let key = (vote.user_id, vote.proposal_id);
        if self.staged.votes.contains_key(&key) {
            return Err(DomainError::new(
                ErrorCode::DuplicateVote,
                format!(
                    "Ledger already holds a vote for user {} on proposal {}",
                    vote.user_id, vote.proposal_id
                ),
            ));
        }
        self.staged.votes.insert(key, *vote);
        Ok(())
    }

    async fn delete_vote(
        &mut self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<(), DomainError> {
        self.staged
            .votes
            .remove(&(user_id, proposal_id))
            .map(|_| ())
            .ok_or_else(|| {
                DomainError::not_found(
                    ErrorCode::VoteNotFound,
                    "Vote",
                    format!("{}/{}", user_id, proposal_id),
                )
            })
    }

    async fn write_tally(
        &mut self,
        proposal_id: ProposalId,
        tally: VoteTally,
    ) -> Result<(), DomainError> {
        self.staged.proposal_mut(proposal_id)?.set_tally(tally);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let InMemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TagId;
    use crate::domain::proposal::{ProposalCriterion, VoteKind};

    fn draft(author: i64) -> ProposalDraft {
        ProposalDraft::root(UserId::new(author), "Nuclear power is safe", "IAEA")
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = InMemoryProposalStore::new();
        let a = store.insert(&draft(1), Timestamp::now()).await.unwrap();
        let b = store.insert(&draft(1), Timestamp::now()).await.unwrap();

        assert!(b > a);
        assert_eq!(store.proposal_count().await, 2);
    }

    #[tokio::test]
    async fn find_matching_filters_in_id_order() {
        let store = InMemoryProposalStore::new();
        store
            .insert(&draft(1).with_tags([TagId::new(7)]), Timestamp::now())
            .await
            .unwrap();
        store.insert(&draft(2), Timestamp::now()).await.unwrap();
        store
            .insert(&draft(3).with_tags([TagId::new(7)]), Timestamp::now())
            .await
            .unwrap();

        let query = ProposalQuery::all().and(ProposalCriterion::TaggedWith(TagId::new(7)));
        let found = store.find_matching(&query).await.unwrap();

        let authors: Vec<i64> = found.iter().map(|p| p.author_id().value()).collect();
        assert_eq!(authors, vec![1, 3]);
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = InMemoryProposalStore::new();
        let id = store.insert(&draft(1), Timestamp::now()).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_vote(&Vote::new(UserId::new(2), id, VoteKind::Upvote))
                .await
                .unwrap();
            tx.write_tally(id, VoteTally::new(1, 0)).await.unwrap();
        }

        assert_eq!(store.vote_count().await, 0);
        let proposal = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(proposal.tally(), VoteTally::default());
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = InMemoryProposalStore::new();
        let id = store.insert(&draft(1), Timestamp::now()).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_vote(&Vote::new(UserId::new(2), id, VoteKind::Downvote))
            .await
            .unwrap();
        tx.write_tally(id, VoteTally::new(0, 1)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.tally_for(id).await.unwrap(), VoteTally::new(0, 1));
        assert!(store.find(UserId::new(2), id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn insert_vote_rejects_duplicate_key() {
        let store = InMemoryProposalStore::new();
        let id = store.insert(&draft(1), Timestamp::now()).await.unwrap();
        let vote = Vote::new(UserId::new(2), id, VoteKind::Upvote);

        let mut tx = store.begin().await.unwrap();
        tx.insert_vote(&vote).await.unwrap();
        let err = tx.insert_vote(&vote).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DuplicateVote);
    }

    #[tokio::test]
    async fn delete_leaves_ledger_entries() {
        let store = InMemoryProposalStore::new();
        let id = store.insert(&draft(1), Timestamp::now()).await.unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.insert_vote(&Vote::new(UserId::new(2), id, VoteKind::Upvote))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        store.delete(id).await.unwrap();

        assert!(!store.exists(id).await.unwrap());
        assert_eq!(store.vote_count().await, 1);
    }

    #[tokio::test]
    async fn delete_missing_proposal_is_not_found() {
        let store = InMemoryProposalStore::new();
        let err = store.delete(ProposalId::new(99)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProposalNotFound);
        assert_eq!(err.detail("id"), Some("99"));
    }
}
