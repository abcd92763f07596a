//! Proposal aggregate entity.
//!
//! A proposal is a debate statement, either a root that starts a discussion or
//! a reply attached to other proposals.
//!
//! # Ownership
//!
//! Proposals reference their replies by ID but do NOT own them. The reply
//! relation lives in the store; a reply may be attached to several parents.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProposalId, TagId, Timestamp, UserId};

use super::{ProposalDraft, ProposalEdit, VoteTally};

/// Proposal aggregate.
///
/// # Invariants
///
/// - `id`, `author_id` and `created_at` never change after creation
/// - `text` is at most 400 characters, `source` at most 300
/// - `tally` equals the ledger count for this proposal by polarity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    id: ProposalId,
    text: String,
    source: String,
    author_id: UserId,
    created_at: Timestamp,
    is_root: bool,
    tags: BTreeSet<TagId>,
    reply_ids: BTreeSet<ProposalId>,
    tally: VoteTally,
    followers: BTreeSet<UserId>,
}

impl Proposal {
    /// Builds a freshly stored proposal from its draft.
    ///
    /// Used by stores once they have assigned an id.
    pub fn from_draft(id: ProposalId, draft: &ProposalDraft, created_at: Timestamp) -> Self {
        Self {
            id,
            text: draft.text.clone(),
            source: draft.source.clone(),
            author_id: draft.author_id,
            created_at,
            is_root: draft.is_root,
            tags: draft.tags.clone(),
            reply_ids: BTreeSet::new(),
            tally: VoteTally::default(),
            followers: BTreeSet::new(),
        }
    }

    /// Reconstitute a proposal from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ProposalId,
        text: String,
        source: String,
        author_id: UserId,
        created_at: Timestamp,
        is_root: bool,
        tags: BTreeSet<TagId>,
        reply_ids: BTreeSet<ProposalId>,
        tally: VoteTally,
        followers: BTreeSet<UserId>,
    ) -> Self {
        Self {
            id,
            text,
            source,
            author_id,
            created_at,
            is_root,
            tags,
            reply_ids,
            tally,
            followers,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> ProposalId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn author_id(&self) -> UserId {
        self.author_id
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn tags(&self) -> &BTreeSet<TagId> {
        &self.tags
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tags.contains(&tag_id)
    }

    pub fn reply_ids(&self) -> &BTreeSet<ProposalId> {
        &self.reply_ids
    }

    /// Number of reply links, dangling ones included.
    pub fn reply_count(&self) -> usize {
        self.reply_ids.len()
    }

    pub fn tally(&self) -> VoteTally {
        self.tally
    }

    pub fn upvote_count(&self) -> u32 {
        self.tally.upvotes
    }

    pub fn downvote_count(&self) -> u32 {
        self.tally.downvotes
    }

    pub fn followers(&self) -> &BTreeSet<UserId> {
        &self.followers
    }

    pub fn is_followed_by(&self, user_id: UserId) -> bool {
        self.followers.contains(&user_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Replaces text, source and tags. Everything else is left untouched.
    pub fn apply_edit(&mut self, edit: &ProposalEdit) {
        self.text = edit.text.clone();
        self.source = edit.source.clone();
        self.tags = edit.tags.clone();
    }

    /// Adds a reply link. Returns `false` if the link already existed.
    pub fn link_reply(&mut self, reply_id: ProposalId) -> bool {
        self.reply_ids.insert(reply_id)
    }

    pub fn set_tally(&mut self, tally: VoteTally) {
        self.tally = tally;
    }

    /// Returns `false` if the user was already following.
    pub fn add_follower(&mut self, user_id: UserId) -> bool {
        self.followers.insert(user_id)
    }

    /// Returns `false` if the user was not following.
    pub fn remove_follower(&mut self, user_id: UserId) -> bool {
        self.followers.remove(&user_id)
    }
}
