//! HTTP adapters - REST API implementations.
//!
//! Proposal endpoints are mounted under `/api/proposals`.

pub mod proposal;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::application::handlers::proposal::ProposalService;

pub use proposal::{proposal_routes, ProposalHandlers};

/// Full API router with the health probe and every proposal endpoint.
pub fn api_router(service: Arc<ProposalService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest(
            "/api/proposals",
            proposal_routes(ProposalHandlers::new(service)),
        )
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
