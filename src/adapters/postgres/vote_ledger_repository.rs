//! PostgreSQL implementation of VoteLedgerRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, ProposalId, UserId};
use crate::domain::proposal::{Vote, VoteKind, VoteTally};
use crate::ports::VoteLedgerRepository;

/// Read access to the `votes` table.
#[derive(Clone)]
pub struct PostgresVoteLedgerRepository {
    pool: PgPool,
}

impl PostgresVoteLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteLedgerRepository for PostgresVoteLedgerRepository {
    async fn find(
        &self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<Option<Vote>, DomainError> {
        let is_upvote: Option<bool> = sqlx::query_scalar(
            "SELECT is_upvote FROM votes WHERE user_id = $1 AND proposal_id = $2",
        )
        .bind(user_id.value())
        .bind(proposal_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch vote", e))?;

        Ok(is_upvote.map(|up| Vote::new(user_id, proposal_id, VoteKind::from_is_upvote(up))))
    }

    async fn tally_for(&self, proposal_id: ProposalId) -> Result<VoteTally, DomainError> {
        let (upvotes, downvotes): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE is_upvote),
                   COUNT(*) FILTER (WHERE NOT is_upvote)
            FROM votes
            WHERE proposal_id = $1
            "#,
        )
        .bind(proposal_id.value())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to count votes", e))?;

        Ok(VoteTally::new(to_count(upvotes)?, to_count(downvotes)?))
    }
}

fn to_count(value: i64) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::ConsistencyViolation,
            format!("Vote count out of range: {}", value),
        )
    })
}
