//! HTTP routes for proposal endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    add_follower, add_reply, audit_tally, cast_vote, create_proposal, create_reply,
    delete_proposal, find_proposals, get_proposal, get_vote, list_replies, remove_follower,
    remove_vote, search_proposals, update_proposal, ProposalHandlers,
};

/// Creates the proposal router with all endpoints.
pub fn proposal_routes(handlers: ProposalHandlers) -> Router {
    Router::new()
        .route("/", get(find_proposals).post(create_proposal))
        .route("/search", get(search_proposals))
        .route(
            "/:id",
            get(get_proposal).put(update_proposal).delete(delete_proposal),
        )
        .route("/:id/replies", get(list_replies).post(create_reply))
        .route("/:id/replies/:reply_id", put(add_reply))
        .route("/:id/votes", post(cast_vote))
        .route("/:id/votes/:user_id", get(get_vote).delete(remove_vote))
        .route("/:id/tally", get(audit_tally))
        .route(
            "/:id/followers/:user_id",
            put(add_follower).delete(remove_follower),
        )
        .with_state(handlers)
}
