//! Proposal filter composition and the domain sort orders.
//!
//! A `ProposalQuery` is a conjunction of named criteria. Stores either
//! evaluate `ProposalQuery::matches` directly (in-memory) or translate each
//! criterion into their own query language (SQL).

use std::fmt;

use serde::Deserialize;

use crate::domain::foundation::{TagId, UserId};

use super::Proposal;

/// A single filter over proposals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalCriterion {
    /// Author id equals the given user.
    AuthoredBy(UserId),
    /// Tag set contains the given tag.
    TaggedWith(TagId),
    /// Text contains the fragment (case-sensitive).
    TextContains(String),
    /// Only proposals flagged as roots.
    RootOnly,
}

impl ProposalCriterion {
    pub fn name(&self) -> &'static str {
        match self {
            ProposalCriterion::AuthoredBy(_) => "authored_by",
            ProposalCriterion::TaggedWith(_) => "tagged_with",
            ProposalCriterion::TextContains(_) => "text_contains",
            ProposalCriterion::RootOnly => "root_only",
        }
    }

    pub fn matches(&self, proposal: &Proposal) -> bool {
        match self {
            ProposalCriterion::AuthoredBy(author_id) => proposal.author_id() == *author_id,
            ProposalCriterion::TaggedWith(tag_id) => proposal.has_tag(*tag_id),
            ProposalCriterion::TextContains(fragment) => proposal.text().contains(fragment.as_str()),
            ProposalCriterion::RootOnly => proposal.is_root(),
        }
    }
}

/// Conjunction of criteria. An empty query matches every proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalQuery {
    criteria: Vec<ProposalCriterion>,
}

impl ProposalQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn and(mut self, criterion: ProposalCriterion) -> Self {
        if !self.criteria.contains(&criterion) {
            self.criteria.push(criterion);
        }
        self
    }

    pub fn criteria(&self) -> &[ProposalCriterion] {
        &self.criteria
    }

    pub fn is_root_only(&self) -> bool {
        self.criteria.contains(&ProposalCriterion::RootOnly)
    }

    pub fn matches(&self, proposal: &Proposal) -> bool {
        self.criteria.iter().all(|c| c.matches(proposal))
    }
}

impl fmt::Display for ProposalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.criteria.is_empty() {
            return write!(f, "all");
        }
        let names: Vec<&str> = self.criteria.iter().map(ProposalCriterion::name).collect();
        write!(f, "{}", names.join(" AND "))
    }
}

/// When the author/tag lookup restricts results to root proposals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootFilterPolicy {
    /// Root-only whenever an author is given; tag-only lookups return every
    /// matching proposal.
    #[default]
    AuthorScoped,
    /// Root-only whenever any filter is given.
    WheneverFiltered,
}

impl RootFilterPolicy {
    /// Builds the query for an optional author and optional tag.
    pub fn build_query(&self, author_id: Option<UserId>, tag_id: Option<TagId>) -> ProposalQuery {
        let mut query = ProposalQuery::all();
        if let Some(author_id) = author_id {
            query = query.and(ProposalCriterion::AuthoredBy(author_id));
        }
        if let Some(tag_id) = tag_id {
            query = query.and(ProposalCriterion::TaggedWith(tag_id));
        }

        let root_only = match self {
            RootFilterPolicy::AuthorScoped => author_id.is_some(),
            RootFilterPolicy::WheneverFiltered => author_id.is_some() || tag_id.is_some(),
        };
        if root_only {
            query = query.and(ProposalCriterion::RootOnly);
        }
        query
    }
}

/// Most-replied first. Stable, so ties keep store order.
pub fn sort_by_reply_count_desc(proposals: &mut [Proposal]) {
    proposals.sort_by(|a, b| b.reply_count().cmp(&a.reply_count()));
}

/// Newest first.
pub fn sort_newest_first(proposals: &mut [Proposal]) {
    proposals.sort_by(|a, b| b.created_at().cmp(a.created_at()));
}
