//! Proposal domain module.
//!
//! Proposals are the statements of a debate graph. This module holds the
//! aggregate, the vote ledger value types, the filter vocabulary used by
//! lookups, and the proposal error taxonomy.

mod aggregate;
mod draft;
mod errors;
mod query;
mod vote;

pub use aggregate::Proposal;
pub use draft::{
    validate_content, ProposalDraft, ProposalEdit, MAX_SOURCE_LENGTH, MAX_TEXT_LENGTH,
};
pub use errors::ProposalError;
pub use query::{
    sort_by_reply_count_desc, sort_newest_first, ProposalCriterion, ProposalQuery,
    RootFilterPolicy,
};
pub use vote::{Vote, VoteKind, VoteTally};
