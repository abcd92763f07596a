//! ProposalQueryEngine - Filtered and sorted proposal lookups.

use std::sync::Arc;

use crate::domain::foundation::{ProposalId, TagId, UserId};
use crate::domain::proposal::{
    sort_by_reply_count_desc, Proposal, ProposalCriterion, ProposalError, ProposalQuery,
    RootFilterPolicy,
};
use crate::ports::ProposalRepository;

/// Read-side lookups over proposals.
pub struct ProposalQueryEngine {
    repository: Arc<dyn ProposalRepository>,
    root_filter: RootFilterPolicy,
}

impl ProposalQueryEngine {
    pub fn new(repository: Arc<dyn ProposalRepository>, root_filter: RootFilterPolicy) -> Self {
        Self {
            repository,
            root_filter,
        }
    }

    pub fn root_filter(&self) -> RootFilterPolicy {
        self.root_filter
    }

    /// Proposals by optional author and optional tag, most-replied first.
    pub async fn find(
        &self,
        author_id: Option<UserId>,
        tag_id: Option<TagId>,
    ) -> Result<Vec<Proposal>, ProposalError> {
        let query = self.root_filter.build_query(author_id, tag_id);
        self.run(query).await
    }

    /// Proposals whose text contains the fragment, most-replied first.
    pub async fn find_by_text_containing(
        &self,
        fragment: &str,
    ) -> Result<Vec<Proposal>, ProposalError> {
        let query = ProposalQuery::all().and(ProposalCriterion::TextContains(fragment.to_string()));
        self.run(query).await
    }

    pub async fn find_by_id(&self, id: ProposalId) -> Result<Option<Proposal>, ProposalError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    async fn run(&self, query: ProposalQuery) -> Result<Vec<Proposal>, ProposalError> {
        let mut proposals = self.repository.find_matching(&query).await?;
        sort_by_reply_count_desc(&mut proposals);
        tracing::debug!(query = %query, results = proposals.len(), "Proposal lookup");
        Ok(proposals)
    }
}
