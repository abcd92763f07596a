//! HTTP DTOs for proposal endpoints.
//!
//! Ids travel as JSON numbers. Votes travel as `is_upvote` flags.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProposalId, TagId, UserId};
use crate::domain::proposal::{Proposal, ProposalDraft, ProposalEdit, Vote, VoteTally};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to create a proposal.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProposalRequest {
    pub text: String,
    #[serde(default)]
    pub source: String,
    pub author_id: i64,
    #[serde(default = "default_is_root")]
    pub is_root: bool,
    #[serde(default)]
    pub tags: Vec<i64>,
}

fn default_is_root() -> bool {
    true
}

impl CreateProposalRequest {
    pub fn into_draft(self) -> ProposalDraft {
        let mut draft = ProposalDraft::root(UserId::new(self.author_id), self.text, self.source)
            .with_tags(self.tags.into_iter().map(TagId::new));
        draft.is_root = self.is_root;
        draft
    }
}

/// Request to create a proposal directly under a parent.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReplyRequest {
    pub text: String,
    #[serde(default)]
    pub source: String,
    pub author_id: i64,
    #[serde(default)]
    pub tags: Vec<i64>,
}

impl CreateReplyRequest {
    pub fn into_draft(self) -> ProposalDraft {
        ProposalDraft::reply(UserId::new(self.author_id), self.text, self.source)
            .with_tags(self.tags.into_iter().map(TagId::new))
    }
}

/// Request to replace the editable fields of a proposal.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProposalRequest {
    pub text: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub tags: Vec<i64>,
}

impl UpdateProposalRequest {
    pub fn into_edit(self, id: ProposalId) -> ProposalEdit {
        ProposalEdit {
            id,
            text: self.text,
            source: self.source,
            tags: self.tags.into_iter().map(TagId::new).collect(),
        }
    }
}

/// Query parameters for listing proposals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindProposalsQuery {
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub tag_id: Option<i64>,
}

/// Query parameters for text search.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchProposalsQuery {
    pub text: String,
}

/// Request to cast a vote.
#[derive(Debug, Clone, Deserialize)]
pub struct CastVoteRequest {
    pub user_id: i64,
    pub is_upvote: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Full proposal view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub id: i64,
    pub text: String,
    pub source: String,
    pub author_id: i64,
    pub created_at: String,
    pub is_root: bool,
    pub tags: Vec<i64>,
    pub reply_ids: Vec<i64>,
    pub reply_count: usize,
    pub upvote_count: u32,
    pub downvote_count: u32,
    pub followers: Vec<i64>,
}

impl From<Proposal> for ProposalResponse {
    fn from(proposal: Proposal) -> Self {
        Self {
            id: proposal.id().value(),
            text: proposal.text().to_string(),
            source: proposal.source().to_string(),
            author_id: proposal.author_id().value(),
            created_at: proposal.created_at().to_rfc3339(),
            is_root: proposal.is_root(),
            tags: proposal.tags().iter().map(|t| t.value()).collect(),
            reply_ids: proposal.reply_ids().iter().map(|r| r.value()).collect(),
            reply_count: proposal.reply_count(),
            upvote_count: proposal.upvote_count(),
            downvote_count: proposal.downvote_count(),
            followers: proposal.followers().iter().map(|u| u.value()).collect(),
        }
    }
}

/// Response for commands that create a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalCreatedResponse {
    pub id: i64,
}

/// Response for reply attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyLinkResponse {
    pub proposal_id: i64,
    pub reply_id: i64,
    pub added: bool,
}

/// Current vote counters of a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyResponse {
    pub proposal_id: i64,
    pub upvote_count: u32,
    pub downvote_count: u32,
}

impl TallyResponse {
    pub fn new(proposal_id: ProposalId, tally: VoteTally) -> Self {
        Self {
            proposal_id: proposal_id.value(),
            upvote_count: tally.upvotes,
            downvote_count: tally.downvotes,
        }
    }
}

/// A single ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub user_id: i64,
    pub proposal_id: i64,
    pub is_upvote: bool,
}

impl From<Vote> for VoteResponse {
    fn from(vote: Vote) -> Self {
        Self {
            user_id: vote.user_id.value(),
            proposal_id: vote.proposal_id.value(),
            is_upvote: vote.kind.is_upvote(),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(reason: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            code: "VALIDATION_FAILED".to_string(),
            message: message.into(),
            details: Some(serde_json::json!({ "field": field, "reason": reason })),
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found: {}", resource_type, id),
            details: None,
        }
    }

    /// `reason` names the rule that was violated, e.g. `ALREADY_VOTED`.
    pub fn conflict(reason: &str, message: impl Into<String>) -> Self {
        Self {
            code: "CONFLICT".to_string(),
            message: message.into(),
            details: Some(serde_json::json!({ "reason": reason })),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}
