//! Proposal-specific error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ProposalId, UserId, ValidationError};

/// Errors surfaced by the proposal service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalError {
    /// Referenced proposal, user or vote does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Domain rule violated. `code` is `SelfReply`, `AlreadyVoted` or
    /// `NotVoted`.
    #[error("Invalid operation: {message}")]
    InvalidOperation { code: ErrorCode, message: String },

    /// Field rejected. `code` is `TooLong` for the length limits, which are
    /// checked before any store call, and `ValidationFailed` otherwise.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed {
        code: ErrorCode,
        field: String,
        message: String,
    },

    /// Stored state contradicts an invariant (negative tally, ledger mismatch,
    /// uniqueness breach that slipped past the transaction).
    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    /// Store failure.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl ProposalError {
    pub fn proposal_not_found(id: ProposalId) -> Self {
        ProposalError::NotFound {
            entity: "Proposal",
            id: id.to_string(),
        }
    }

    pub fn user_not_found(id: UserId) -> Self {
        ProposalError::NotFound {
            entity: "User",
            id: id.to_string(),
        }
    }

    pub fn self_reply(id: ProposalId) -> Self {
        ProposalError::InvalidOperation {
            code: ErrorCode::SelfReply,
            message: format!("Proposal {} cannot reply to itself", id),
        }
    }

    pub fn already_voted(user_id: UserId, proposal_id: ProposalId) -> Self {
        ProposalError::InvalidOperation {
            code: ErrorCode::AlreadyVoted,
            message: format!(
                "User {} has already voted on proposal {}",
                user_id, proposal_id
            ),
        }
    }

    pub fn not_voted(user_id: UserId, proposal_id: ProposalId) -> Self {
        ProposalError::InvalidOperation {
            code: ErrorCode::NotVoted,
            message: format!("User {} has not voted on proposal {}", user_id, proposal_id),
        }
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        ProposalError::ConsistencyViolation(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ProposalError::NotFound { entity: "User", .. } => ErrorCode::UserNotFound,
            ProposalError::NotFound { entity: "Vote", .. } => ErrorCode::VoteNotFound,
            ProposalError::NotFound { .. } => ErrorCode::ProposalNotFound,
            ProposalError::InvalidOperation { code, .. } => *code,
            ProposalError::ValidationFailed { code, .. } => *code,
            ProposalError::ConsistencyViolation(_) => ErrorCode::ConsistencyViolation,
            ProposalError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProposalError::NotFound { .. })
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, ProposalError::InvalidOperation { .. })
    }
}

impl From<ValidationError> for ProposalError {
    fn from(err: ValidationError) -> Self {
        let code = match err {
            ValidationError::TooLong { .. } => ErrorCode::TooLong,
        };
        ProposalError::ValidationFailed {
            code,
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for ProposalError {
    fn from(err: DomainError) -> Self {
        let id = err.detail("id").unwrap_or("unknown").to_string();
        match err.code {
            ErrorCode::ProposalNotFound => ProposalError::NotFound {
                entity: "Proposal",
                id,
            },
            ErrorCode::UserNotFound => ProposalError::NotFound { entity: "User", id },
            ErrorCode::VoteNotFound => ProposalError::NotFound { entity: "Vote", id },
            ErrorCode::ValidationFailed | ErrorCode::TooLong => ProposalError::ValidationFailed {
                code: err.code,
                field: err.detail("field").unwrap_or("unknown").to_string(),
                message: err.message,
            },
            ErrorCode::SelfReply | ErrorCode::AlreadyVoted | ErrorCode::NotVoted => {
                ProposalError::InvalidOperation {
                    code: err.code,
                    message: err.message,
                }
            }
            ErrorCode::ConsistencyViolation | ErrorCode::DuplicateVote => {
                ProposalError::ConsistencyViolation(err.message)
            }
            ErrorCode::DatabaseError => ProposalError::Infrastructure(err.to_string()),
        }
    }
}
