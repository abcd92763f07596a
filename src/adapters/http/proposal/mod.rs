//! HTTP adapter for proposal endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CastVoteRequest, CreateProposalRequest, CreateReplyRequest, ErrorResponse,
    FindProposalsQuery, ProposalCreatedResponse, ProposalResponse, ReplyLinkResponse,
    SearchProposalsQuery, TallyResponse, UpdateProposalRequest, VoteResponse,
};
pub use handlers::ProposalHandlers;
pub use routes::proposal_routes;
