//! ProposalService - Entry point for every proposal operation.
//!
//! Owns field validation and the create/update/delete lifecycle, and
//! delegates lookups, replies, votes and followers to the components in this
//! module. Validation always runs before the first store call.

use std::sync::Arc;

use crate::domain::foundation::{ProposalId, TagId, Timestamp, UserId};
use crate::domain::proposal::{
    Proposal, ProposalDraft, ProposalEdit, ProposalError, RootFilterPolicy, Vote, VoteKind,
    VoteTally,
};
use crate::ports::{ProposalRepository, ProposalUnitOfWork, UserDirectory, VoteLedgerRepository};

use super::{FollowerRegistry, ProposalQueryEngine, ReplyGraph, VoteLedger};

pub struct ProposalService {
    repository: Arc<dyn ProposalRepository>,
    users: Arc<dyn UserDirectory>,
    queries: ProposalQueryEngine,
    replies: ReplyGraph,
    votes: VoteLedger,
    followers: FollowerRegistry,
}

impl ProposalService {
    pub fn new(
        repository: Arc<dyn ProposalRepository>,
        ledger: Arc<dyn VoteLedgerRepository>,
        unit_of_work: Arc<dyn ProposalUnitOfWork>,
        users: Arc<dyn UserDirectory>,
        root_filter: RootFilterPolicy,
    ) -> Self {
        Self {
            queries: ProposalQueryEngine::new(repository.clone(), root_filter),
            replies: ReplyGraph::new(repository.clone(), unit_of_work.clone(), users.clone()),
            votes: VoteLedger::new(repository.clone(), ledger, unit_of_work, users.clone()),
            followers: FollowerRegistry::new(repository.clone(), users.clone()),
            repository,
            users,
        }
    }

    // === Lifecycle ===

    pub async fn create(&self, draft: ProposalDraft) -> Result<ProposalId, ProposalError> {
        if let Err(e) = draft.validate() {
            tracing::warn!(author_id = %draft.author_id, error = %e, "Rejected proposal draft");
            return Err(e.into());
        }
        if !self.users.exists(draft.author_id).await? {
            return Err(ProposalError::user_not_found(draft.author_id));
        }

        let id = self.repository.insert(&draft, Timestamp::now()).await?;
        tracing::info!(
            proposal_id = %id,
            author_id = %draft.author_id,
            is_root = draft.is_root,
            "Proposal created"
        );
        Ok(id)
    }

    /// Replace text, source and tags. Everything else is left as stored.
    pub async fn update(&self, edit: ProposalEdit) -> Result<(), ProposalError> {
        if let Err(e) = edit.validate() {
            tracing::warn!(proposal_id = %edit.id, error = %e, "Rejected proposal edit");
            return Err(e.into());
        }
        if !self.repository.exists(edit.id).await? {
            return Err(ProposalError::proposal_not_found(edit.id));
        }

        self.repository.apply_edit(&edit).await?;
        tracing::info!(proposal_id = %edit.id, "Proposal updated");
        Ok(())
    }

    /// Removes the proposal without touching other proposals' reply links or
    /// the vote ledger.
    pub async fn delete_by_id(&self, id: ProposalId) -> Result<(), ProposalError> {
        if !self.repository.exists(id).await? {
            return Err(ProposalError::proposal_not_found(id));
        }

        self.repository.delete(id).await?;
        tracing::info!(proposal_id = %id, "Proposal deleted");
        Ok(())
    }

    // === Lookups ===

    pub fn root_filter(&self) -> RootFilterPolicy {
        self.queries.root_filter()
    }

    pub async fn find(
        &self,
        author_id: Option<UserId>,
        tag_id: Option<TagId>,
    ) -> Result<Vec<Proposal>, ProposalError> {
        self.queries.find(author_id, tag_id).await
    }

    pub async fn find_by_text_containing(
        &self,
        fragment: &str,
    ) -> Result<Vec<Proposal>, ProposalError> {
        self.queries.find_by_text_containing(fragment).await
    }

    pub async fn find_by_id(&self, id: ProposalId) -> Result<Option<Proposal>, ProposalError> {
        self.queries.find_by_id(id).await
    }

    // === Replies ===

    pub async fn list_replies(&self, id: ProposalId) -> Result<Vec<Proposal>, ProposalError> {
        self.replies.list_replies(id).await
    }

    pub async fn add_reply(
        &self,
        id: ProposalId,
        reply_id: ProposalId,
    ) -> Result<bool, ProposalError> {
        self.replies.add_reply(id, reply_id).await
    }

    pub async fn create_reply(
        &self,
        id: ProposalId,
        draft: ProposalDraft,
    ) -> Result<ProposalId, ProposalError> {
        self.replies.create_reply(id, draft).await
    }

    // === Votes ===

    pub async fn add_vote(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
        kind: VoteKind,
    ) -> Result<VoteTally, ProposalError> {
        self.votes.add_vote(user_id, proposal_id, kind).await
    }

    pub async fn remove_vote(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<VoteTally, ProposalError> {
        self.votes.remove_vote(user_id, proposal_id).await
    }

    pub async fn find_vote(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<Option<Vote>, ProposalError> {
        self.votes.find_vote(user_id, proposal_id).await
    }

    pub async fn audit_tally(&self, proposal_id: ProposalId) -> Result<VoteTally, ProposalError> {
        self.votes.audit_tally(proposal_id).await
    }

    // === Followers ===

    pub async fn add_follower(
        &self,
        proposal_id: ProposalId,
        user_id: UserId,
    ) -> Result<(), ProposalError> {
        self.followers.add_follower(proposal_id, user_id).await
    }

    pub async fn remove_follower(
        &self,
        proposal_id: ProposalId,
        user_id: UserId,
    ) -> Result<(), ProposalError> {
        self.followers.remove_follower(proposal_id, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryProposalStore, InMemoryUserDirectory};
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::domain::proposal::ProposalQuery;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every write; optionally fails all calls.
    struct MockProposalRepository {
        writes: Mutex<Vec<&'static str>>,
        existing: Vec<ProposalId>,
        fail: bool,
    }

    impl MockProposalRepository {
        fn with_existing(existing: Vec<ProposalId>) -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
                existing,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
                existing: Vec::new(),
                fail: true,
            }
        }

        fn writes(&self) -> Vec<&'static str> {
            self.writes.lock().unwrap().clone()
        }

        fn record(&self, op: &'static str) -> Result<(), DomainError> {
            if self.fail {
                return Err(DomainError::new(
                    ErrorCode::DatabaseError,
                    "Simulated store failure",
                ));
            }
            self.writes.lock().unwrap().push(op);
            Ok(())
        }
    }

    #[async_trait]
    impl ProposalRepository for MockProposalRepository {
        async fn find_by_id(&self, _id: ProposalId) -> Result<Option<Proposal>, DomainError> {
            Ok(None)
        }

        async fn find_by_ids(&self, _ids: &[ProposalId]) -> Result<Vec<Proposal>, DomainError> {
            Ok(vec![])
        }

        async fn find_matching(
            &self,
            _query: &ProposalQuery,
        ) -> Result<Vec<Proposal>, DomainError> {
            Ok(vec![])
        }

        async fn exists(&self, id: ProposalId) -> Result<bool, DomainError> {
            if self.fail {
                return Err(DomainError::new(ErrorCode::DatabaseError, "Simulated"));
            }
            Ok(self.existing.contains(&id))
        }

        async fn insert(
            &self,
            _draft: &ProposalDraft,
            _created_at: Timestamp,
        ) -> Result<ProposalId, DomainError> {
            self.record("insert")?;
            Ok(ProposalId::new(1))
        }

        async fn apply_edit(&self, _edit: &ProposalEdit) -> Result<(), DomainError> {
            self.record("apply_edit")
        }

        async fn delete(&self, _id: ProposalId) -> Result<(), DomainError> {
            self.record("delete")
        }

        async fn add_follower(&self, _id: ProposalId, _user: UserId) -> Result<(), DomainError> {
            self.record("add_follower")
        }

        async fn remove_follower(
            &self,
            _id: ProposalId,
            _user: UserId,
        ) -> Result<(), DomainError> {
            self.record("remove_follower")
        }
    }

    fn author() -> UserId {
        UserId::new(1)
    }

    fn users() -> Arc<InMemoryUserDirectory> {
        Arc::new(InMemoryUserDirectory::with_users([author()]))
    }

    fn service_with(repo: Arc<MockProposalRepository>) -> ProposalService {
        let store = Arc::new(InMemoryProposalStore::new());
        ProposalService::new(
            repo,
            store.clone(),
            store,
            users(),
            RootFilterPolicy::default(),
        )
    }

    fn in_memory() -> (ProposalService, Arc<InMemoryProposalStore>) {
        let store = Arc::new(InMemoryProposalStore::new());
        let service = ProposalService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            users(),
            RootFilterPolicy::AuthorScoped,
        );
        (service, store)
    }

    #[tokio::test]
    async fn create_accepts_boundary_lengths() {
        let (service, _) = in_memory();
        let draft = ProposalDraft::root(author(), "a".repeat(400), "s".repeat(300));

        let id = service.create(draft).await.unwrap();

        let stored = service.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.text().chars().count(), 400);
        assert_eq!(stored.author_id(), author());
    }

    #[tokio::test]
    async fn create_rejects_long_text_without_store_write() {
        let repo = Arc::new(MockProposalRepository::with_existing(vec![]));
        let service = service_with(repo.clone());

        let err = service
            .create(ProposalDraft::root(author(), "a".repeat(401), ""))
            .await
            .unwrap_err();

        assert!(matches!(err, ProposalError::ValidationFailed { ref field, .. } if field == "text"));
        assert!(repo.writes().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_long_source_without_store_write() {
        let repo = Arc::new(MockProposalRepository::with_existing(vec![]));
        let service = service_with(repo.clone());

        let err = service
            .create(ProposalDraft::root(author(), "ok", "s".repeat(301)))
            .await
            .unwrap_err();

        assert!(matches!(err, ProposalError::ValidationFailed { ref field, .. } if field == "source"));
        assert!(repo.writes().is_empty());
    }

    #[tokio::test]
    async fn create_requires_existing_author() {
        let repo = Arc::new(MockProposalRepository::with_existing(vec![]));
        let service = service_with(repo.clone());

        let err = service
            .create(ProposalDraft::root(UserId::new(2), "text", ""))
            .await
            .unwrap_err();

        assert_eq!(err, ProposalError::user_not_found(UserId::new(2)));
        assert!(repo.writes().is_empty());
    }

    #[tokio::test]
    async fn update_validates_before_existence_check() {
        let repo = Arc::new(MockProposalRepository::failing());
        let service = service_with(repo);

        let edit = ProposalEdit {
            id: ProposalId::new(1),
            text: "t".repeat(401),
            source: String::new(),
            tags: Default::default(),
        };
        let err = service.update(edit).await.unwrap_err();

        assert!(matches!(err, ProposalError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn update_missing_proposal_is_not_found() {
        let repo = Arc::new(MockProposalRepository::with_existing(vec![]));
        let service = service_with(repo.clone());

        let edit = ProposalEdit {
            id: ProposalId::new(3),
            text: "new".to_string(),
            source: String::new(),
            tags: Default::default(),
        };
        let err = service.update(edit).await.unwrap_err();

        assert_eq!(err, ProposalError::proposal_not_found(ProposalId::new(3)));
        assert!(repo.writes().is_empty());
    }

    #[tokio::test]
    async fn update_keeps_identity_and_tallies() {
        let (service, _) = in_memory();
        let id = service
            .create(ProposalDraft::root(author(), "old", "src").with_tags([TagId::new(1)]))
            .await
            .unwrap();
        service.add_vote(author(), id, VoteKind::Upvote).await.unwrap();
        let before = service.find_by_id(id).await.unwrap().unwrap();

        service
            .update(ProposalEdit {
                id,
                text: "new".to_string(),
                source: "other".to_string(),
                tags: [TagId::new(2)].into_iter().collect(),
            })
            .await
            .unwrap();

        let after = service.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.text(), "new");
        assert_eq!(after.source(), "other");
        assert!(after.has_tag(TagId::new(2)) && !after.has_tag(TagId::new(1)));
        assert_eq!(after.author_id(), before.author_id());
        assert_eq!(after.created_at(), before.created_at());
        assert_eq!(after.tally(), before.tally());
    }

    #[tokio::test]
    async fn delete_verifies_then_deletes() {
        let repo = Arc::new(MockProposalRepository::with_existing(vec![ProposalId::new(5)]));
        let service = service_with(repo.clone());

        service.delete_by_id(ProposalId::new(5)).await.unwrap();
        let err = service.delete_by_id(ProposalId::new(6)).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(repo.writes(), vec!["delete"]);
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_infrastructure() {
        let repo = Arc::new(MockProposalRepository::failing());
        let service = service_with(repo);

        let err = service.delete_by_id(ProposalId::new(1)).await.unwrap_err();

        assert!(matches!(err, ProposalError::Infrastructure(_)));
    }

    #[tokio::test]
    async fn delete_leaves_votes_and_parent_links() {
        let (service, store) = in_memory();
        let parent = service
            .create(ProposalDraft::root(author(), "parent", ""))
            .await
            .unwrap();
        let reply = service
            .create_reply(parent, ProposalDraft::reply(author(), "reply", ""))
            .await
            .unwrap();
        service.add_vote(author(), reply, VoteKind::Downvote).await.unwrap();

        service.delete_by_id(reply).await.unwrap();

        let parent_after = service.find_by_id(parent).await.unwrap().unwrap();
        assert!(parent_after.reply_ids().contains(&reply));
        assert!(service.list_replies(parent).await.unwrap().is_empty());
        assert!(service.find_vote(author(), reply).await.unwrap().is_some());
        assert_eq!(store.vote_count().await, 1);
    }

    #[tokio::test]
    async fn delegates_to_components() {
        let (service, _) = in_memory();
        let a = service
            .create(ProposalDraft::root(author(), "first", ""))
            .await
            .unwrap();
        let b = service
            .create(ProposalDraft::root(author(), "second", ""))
            .await
            .unwrap();

        assert!(service.add_reply(a, b).await.unwrap());
        service.add_follower(a, author()).await.unwrap();

        let found = service.find(Some(author()), None).await.unwrap();
        assert_eq!(found[0].id(), a);
        assert!(found[0].is_followed_by(author()));
        assert_eq!(service.find_by_text_containing("sec").await.unwrap().len(), 1);

        service.remove_follower(a, author()).await.unwrap();
        assert!(!service.find_by_id(a).await.unwrap().unwrap().is_followed_by(author()));
        assert_eq!(service.root_filter(), RootFilterPolicy::AuthorScoped);
    }
}
