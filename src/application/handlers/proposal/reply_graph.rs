//! ReplyGraph - Validates and mutates the reply relation between proposals.
//!
//! The relation is a set per parent: attaching the same reply twice is a
//! no-op, and one reply may hang under several parents. Only self-replies are
//! rejected; no tree or DAG shape is enforced.

use std::sync::Arc;

use crate::domain::foundation::{ProposalId, Timestamp};
use crate::domain::proposal::{sort_newest_first, Proposal, ProposalDraft, ProposalError};
use crate::ports::{ProposalRepository, ProposalUnitOfWork, UserDirectory};

pub struct ReplyGraph {
    repository: Arc<dyn ProposalRepository>,
    unit_of_work: Arc<dyn ProposalUnitOfWork>,
    users: Arc<dyn UserDirectory>,
}

impl ReplyGraph {
    pub fn new(
        repository: Arc<dyn ProposalRepository>,
        unit_of_work: Arc<dyn ProposalUnitOfWork>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            repository,
            unit_of_work,
            users,
        }
    }

    /// Replies of a proposal, newest first.
    ///
    /// Links to deleted proposals are skipped.
    pub async fn list_replies(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Vec<Proposal>, ProposalError> {
        let proposal = self
            .repository
            .find_by_id(proposal_id)
            .await?
            .ok_or_else(|| ProposalError::proposal_not_found(proposal_id))?;

        let reply_ids: Vec<ProposalId> = proposal.reply_ids().iter().copied().collect();
        let mut replies = self.repository.find_by_ids(&reply_ids).await?;
        sort_newest_first(&mut replies);
        Ok(replies)
    }

    /// Attach an existing proposal as a reply.
    ///
    /// Returns `false` when the link already existed.
    pub async fn add_reply(
        &self,
        proposal_id: ProposalId,
        reply_id: ProposalId,
    ) -> Result<bool, ProposalError> {
        if proposal_id == reply_id {
            tracing::warn!(proposal_id = %proposal_id, "Rejected self-reply");
            return Err(ProposalError::self_reply(proposal_id));
        }

        let mut tx = self.unit_of_work.begin().await?;

        if tx.lock_proposal(proposal_id).await?.is_none() {
            return Err(ProposalError::proposal_not_found(proposal_id));
        }
        if !tx.proposal_exists(reply_id).await? {
            return Err(ProposalError::proposal_not_found(reply_id));
        }

        let added = tx.link_reply(proposal_id, reply_id).await?;
        tx.commit().await?;

        tracing::info!(
            proposal_id = %proposal_id,
            reply_id = %reply_id,
            added,
            "Reply attached"
        );
        Ok(added)
    }

    /// Create a new proposal and attach it as a reply in one transaction.
    pub async fn create_reply(
        &self,
        proposal_id: ProposalId,
        draft: ProposalDraft,
    ) -> Result<ProposalId, ProposalError> {
        draft.validate()?;
        if !self.users.exists(draft.author_id).await? {
            return Err(ProposalError::user_not_found(draft.author_id));
        }

        let mut tx = self.unit_of_work.begin().await?;

        if tx.lock_proposal(proposal_id).await?.is_none() {
            return Err(ProposalError::proposal_not_found(proposal_id));
        }

        let reply_id = tx.insert_proposal(&draft, Timestamp::now()).await?;
        tx.link_reply(proposal_id, reply_id).await?;
        tx.commit().await?;

        tracing::info!(
            proposal_id = %proposal_id,
            reply_id = %reply_id,
            author_id = %draft.author_id,
            "Reply created"
        );
        Ok(reply_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryProposalStore, InMemoryUserDirectory};
    use crate::domain::foundation::UserId;

    fn graph() -> (ReplyGraph, Arc<InMemoryProposalStore>) {
        let store = Arc::new(InMemoryProposalStore::new());
        let users = Arc::new(InMemoryUserDirectory::with_users([UserId::new(1)]));
        (ReplyGraph::new(store.clone(), store.clone(), users), store)
    }

    async fn insert_at(store: &InMemoryProposalStore, at: Timestamp) -> ProposalId {
        store
            .insert(&ProposalDraft::reply(UserId::new(1), "reply", ""), at)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn self_reply_is_invalid_even_for_missing_ids() {
        let (graph, _) = graph();
        let err = graph
            .add_reply(ProposalId::new(42), ProposalId::new(42))
            .await
            .unwrap_err();
        assert!(err.is_invalid_operation());
    }

    #[tokio::test]
    async fn add_reply_is_idempotent() {
        let (graph, store) = graph();
        let parent = insert_at(&store, Timestamp::now()).await;
        let reply = insert_at(&store, Timestamp::now()).await;

        assert!(graph.add_reply(parent, reply).await.unwrap());
        assert!(!graph.add_reply(parent, reply).await.unwrap());

        let replies = graph.list_replies(parent).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id(), reply);
    }

    #[tokio::test]
    async fn add_reply_requires_both_proposals() {
        let (graph, store) = graph();
        let parent = insert_at(&store, Timestamp::now()).await;

        let missing_reply = graph.add_reply(parent, ProposalId::new(99)).await;
        assert_eq!(
            missing_reply,
            Err(ProposalError::proposal_not_found(ProposalId::new(99)))
        );

        let missing_parent = graph.add_reply(ProposalId::new(98), parent).await;
        assert_eq!(
            missing_parent,
            Err(ProposalError::proposal_not_found(ProposalId::new(98)))
        );
    }

    #[tokio::test]
    async fn one_reply_may_have_several_parents() {
        let (graph, store) = graph();
        let a = insert_at(&store, Timestamp::now()).await;
        let b = insert_at(&store, Timestamp::now()).await;
        let reply = insert_at(&store, Timestamp::now()).await;

        graph.add_reply(a, reply).await.unwrap();
        graph.add_reply(b, reply).await.unwrap();

        assert_eq!(graph.list_replies(a).await.unwrap().len(), 1);
        assert_eq!(graph.list_replies(b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_replies_orders_newest_first() {
        let (graph, store) = graph();
        let t1 = Timestamp::now();
        let parent = insert_at(&store, t1).await;
        let r1 = insert_at(&store, t1).await;
        let r3 = insert_at(&store, t1.plus_secs(30)).await;
        let r2 = insert_at(&store, t1.plus_secs(15)).await;
        for reply in [r1, r3, r2] {
            graph.add_reply(parent, reply).await.unwrap();
        }

        let replies = graph.list_replies(parent).await.unwrap();

        let ids: Vec<ProposalId> = replies.iter().map(Proposal::id).collect();
        assert_eq!(ids, vec![r3, r2, r1]);
    }

    #[tokio::test]
    async fn list_replies_of_missing_proposal_is_not_found() {
        let (graph, _) = graph();
        let err = graph.list_replies(ProposalId::new(5)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn create_reply_inserts_and_links() {
        let (graph, store) = graph();
        let parent = insert_at(&store, Timestamp::now()).await;

        let reply_id = graph
            .create_reply(parent, ProposalDraft::reply(UserId::new(1), "Rebuttal", ""))
            .await
            .unwrap();

        let replies = graph.list_replies(parent).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id(), reply_id);
        assert!(!replies[0].is_root());
    }

    #[tokio::test]
    async fn create_reply_under_missing_parent_writes_nothing() {
        let (graph, store) = graph();

        let err = graph
            .create_reply(
                ProposalId::new(7),
                ProposalDraft::reply(UserId::new(1), "Orphan", ""),
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.proposal_count().await, 0);
    }

    #[tokio::test]
    async fn create_reply_validates_before_touching_the_store() {
        let (graph, store) = graph();
        let parent = insert_at(&store, Timestamp::now()).await;

        let err = graph
            .create_reply(
                parent,
                ProposalDraft::reply(UserId::new(1), "x".repeat(401), ""),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProposalError::ValidationFailed { .. }));
        assert_eq!(store.proposal_count().await, 1);
    }

    #[tokio::test]
    async fn create_reply_requires_known_author() {
        let (graph, store) = graph();
        let parent = insert_at(&store, Timestamp::now()).await;

        let err = graph
            .create_reply(parent, ProposalDraft::reply(UserId::new(2), "Who?", ""))
            .await
            .unwrap_err();

        assert_eq!(err, ProposalError::user_not_found(UserId::new(2)));
    }
}
