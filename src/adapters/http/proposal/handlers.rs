//! HTTP handlers for proposal endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::handlers::proposal::ProposalService;
use crate::domain::foundation::{ProposalId, TagId, UserId};
use crate::domain::proposal::{Proposal, ProposalError, VoteKind};

use super::dto::{
    CastVoteRequest, CreateProposalRequest, CreateReplyRequest, ErrorResponse, FindProposalsQuery,
    ProposalCreatedResponse, ProposalResponse, ReplyLinkResponse, SearchProposalsQuery,
    TallyResponse, UpdateProposalRequest, VoteResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ProposalHandlers {
    service: Arc<ProposalService>,
}

impl ProposalHandlers {
    pub fn new(service: Arc<ProposalService>) -> Self {
        Self { service }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Proposal lifecycle
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/proposals - Create a proposal
pub async fn create_proposal(
    State(handlers): State<ProposalHandlers>,
    Json(req): Json<CreateProposalRequest>,
) -> Response {
    match handlers.service.create(req.into_draft()).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(ProposalCreatedResponse { id: id.value() }),
        )
            .into_response(),
        Err(e) => handle_proposal_error(e),
    }
}

/// GET /api/proposals?author_id=&tag_id= - Filtered list, most replied first
pub async fn find_proposals(
    State(handlers): State<ProposalHandlers>,
    Query(query): Query<FindProposalsQuery>,
) -> Response {
    let author_id = query.author_id.map(UserId::new);
    let tag_id = query.tag_id.map(TagId::new);

    match handlers.service.find(author_id, tag_id).await {
        Ok(proposals) => proposal_list(proposals),
        Err(e) => handle_proposal_error(e),
    }
}

/// GET /api/proposals/search?text= - Substring search, most replied first
pub async fn search_proposals(
    State(handlers): State<ProposalHandlers>,
    Query(query): Query<SearchProposalsQuery>,
) -> Response {
    match handlers.service.find_by_text_containing(&query.text).await {
        Ok(proposals) => proposal_list(proposals),
        Err(e) => handle_proposal_error(e),
    }
}

/// GET /api/proposals/:id - Get one proposal
pub async fn get_proposal(
    State(handlers): State<ProposalHandlers>,
    Path(id): Path<String>,
) -> Response {
    let id: ProposalId = match parse_id(&id, "proposal") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.service.find_by_id(id).await {
        Ok(Some(proposal)) => {
            let response: ProposalResponse = proposal.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => handle_proposal_error(ProposalError::proposal_not_found(id)),
        Err(e) => handle_proposal_error(e),
    }
}

/// PUT /api/proposals/:id - Replace text, source and tags
pub async fn update_proposal(
    State(handlers): State<ProposalHandlers>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProposalRequest>,
) -> Response {
    let id: ProposalId = match parse_id(&id, "proposal") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.service.update(req.into_edit(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handle_proposal_error(e),
    }
}

/// DELETE /api/proposals/:id - Delete a proposal
pub async fn delete_proposal(
    State(handlers): State<ProposalHandlers>,
    Path(id): Path<String>,
) -> Response {
    let id: ProposalId = match parse_id(&id, "proposal") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.service.delete_by_id(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handle_proposal_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Replies
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/proposals/:id/replies - Replies, newest first
pub async fn list_replies(
    State(handlers): State<ProposalHandlers>,
    Path(id): Path<String>,
) -> Response {
    let id: ProposalId = match parse_id(&id, "proposal") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.service.list_replies(id).await {
        Ok(replies) => proposal_list(replies),
        Err(e) => handle_proposal_error(e),
    }
}

/// POST /api/proposals/:id/replies - Create a new reply under a proposal
pub async fn create_reply(
    State(handlers): State<ProposalHandlers>,
    Path(id): Path<String>,
    Json(req): Json<CreateReplyRequest>,
) -> Response {
    let id: ProposalId = match parse_id(&id, "proposal") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.service.create_reply(id, req.into_draft()).await {
        Ok(reply_id) => (
            StatusCode::CREATED,
            Json(ProposalCreatedResponse {
                id: reply_id.value(),
            }),
        )
            .into_response(),
        Err(e) => handle_proposal_error(e),
    }
}

/// PUT /api/proposals/:id/replies/:reply_id - Attach an existing proposal
pub async fn add_reply(
    State(handlers): State<ProposalHandlers>,
    Path((id, reply_id)): Path<(String, String)>,
) -> Response {
    let (id, reply_id): (ProposalId, ProposalId) =
        match (parse_id(&id, "proposal"), parse_id(&reply_id, "reply")) {
            (Ok(id), Ok(reply_id)) => (id, reply_id),
            (Err(response), _) | (_, Err(response)) => return response,
        };

    match handlers.service.add_reply(id, reply_id).await {
        Ok(added) => {
            let response = ReplyLinkResponse {
                proposal_id: id.value(),
                reply_id: reply_id.value(),
                added,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_proposal_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Votes
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/proposals/:id/votes - Cast a vote
pub async fn cast_vote(
    State(handlers): State<ProposalHandlers>,
    Path(id): Path<String>,
    Json(req): Json<CastVoteRequest>,
) -> Response {
    let id: ProposalId = match parse_id(&id, "proposal") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let kind = VoteKind::from_is_upvote(req.is_upvote);
    match handlers
        .service
        .add_vote(UserId::new(req.user_id), id, kind)
        .await
    {
        Ok(tally) => (StatusCode::OK, Json(TallyResponse::new(id, tally))).into_response(),
        Err(e) => handle_proposal_error(e),
    }
}

/// GET /api/proposals/:id/votes/:user_id - A user's current vote
pub async fn get_vote(
    State(handlers): State<ProposalHandlers>,
    Path((id, user_id)): Path<(String, String)>,
) -> Response {
    let (id, user_id): (ProposalId, UserId) =
        match (parse_id(&id, "proposal"), parse_id(&user_id, "user")) {
            (Ok(id), Ok(user_id)) => (id, user_id),
            (Err(response), _) | (_, Err(response)) => return response,
        };

    match handlers.service.find_vote(user_id, id).await {
        Ok(Some(vote)) => {
            let response: VoteResponse = vote.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found(
                "Vote",
                &format!("{}/{}", user_id, id),
            )),
        )
            .into_response(),
        Err(e) => handle_proposal_error(e),
    }
}

/// DELETE /api/proposals/:id/votes/:user_id - Retract a vote
pub async fn remove_vote(
    State(handlers): State<ProposalHandlers>,
    Path((id, user_id)): Path<(String, String)>,
) -> Response {
    let (id, user_id): (ProposalId, UserId) =
        match (parse_id(&id, "proposal"), parse_id(&user_id, "user")) {
            (Ok(id), Ok(user_id)) => (id, user_id),
            (Err(response), _) | (_, Err(response)) => return response,
        };

    match handlers.service.remove_vote(user_id, id).await {
        Ok(tally) => (StatusCode::OK, Json(TallyResponse::new(id, tally))).into_response(),
        Err(e) => handle_proposal_error(e),
    }
}

/// GET /api/proposals/:id/tally - Recount the ledger against stored counters
pub async fn audit_tally(
    State(handlers): State<ProposalHandlers>,
    Path(id): Path<String>,
) -> Response {
    let id: ProposalId = match parse_id(&id, "proposal") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.service.audit_tally(id).await {
        Ok(tally) => (StatusCode::OK, Json(TallyResponse::new(id, tally))).into_response(),
        Err(e) => handle_proposal_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Followers
// ════════════════════════════════════════════════════════════════════════════

/// PUT /api/proposals/:id/followers/:user_id - Follow a proposal
pub async fn add_follower(
    State(handlers): State<ProposalHandlers>,
    Path((id, user_id)): Path<(String, String)>,
) -> Response {
    let (id, user_id): (ProposalId, UserId) =
        match (parse_id(&id, "proposal"), parse_id(&user_id, "user")) {
            (Ok(id), Ok(user_id)) => (id, user_id),
            (Err(response), _) | (_, Err(response)) => return response,
        };

    match handlers.service.add_follower(id, user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handle_proposal_error(e),
    }
}

/// DELETE /api/proposals/:id/followers/:user_id - Stop following
pub async fn remove_follower(
    State(handlers): State<ProposalHandlers>,
    Path((id, user_id)): Path<(String, String)>,
) -> Response {
    let (id, user_id): (ProposalId, UserId) =
        match (parse_id(&id, "proposal"), parse_id(&user_id, "user")) {
            (Ok(id), Ok(user_id)) => (id, user_id),
            (Err(response), _) | (_, Err(response)) => return response,
        };

    match handlers.service.remove_follower(id, user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handle_proposal_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, Response> {
    raw.parse::<T>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(format!("Invalid {} ID", what))),
        )
            .into_response()
    })
}

fn proposal_list(proposals: Vec<Proposal>) -> Response {
    let items: Vec<ProposalResponse> = proposals.into_iter().map(Into::into).collect();
    (StatusCode::OK, Json(items)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_proposal_error(error: ProposalError) -> Response {
    match error {
        ProposalError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found(entity, &id)),
        )
            .into_response(),
        ProposalError::InvalidOperation { code, message } => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::conflict(&code.to_string(), message)),
        )
            .into_response(),
        ProposalError::ValidationFailed {
            code,
            field,
            message,
        } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::validation(&code.to_string(), &field, message)),
        )
            .into_response(),
        ProposalError::ConsistencyViolation(msg) => {
            tracing::error!(error = %msg, "Consistency violation surfaced to client");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Stored data is inconsistent")),
            )
                .into_response()
        }
        ProposalError::Infrastructure(msg) => {
            tracing::error!(error = %msg, "Infrastructure failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Internal error")),
            )
                .into_response()
        }
    }
}
