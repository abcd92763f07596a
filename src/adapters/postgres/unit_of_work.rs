//! PostgreSQL implementation of ProposalUnitOfWork.
//!
//! Each transaction wraps a sqlx `Transaction` at the default read committed
//! level. `lock_proposal` takes a row lock with `FOR UPDATE OF p`, which
//! serializes every multi-write operation on the same proposal. Dropping the
//! transaction without commit rolls it back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::{DomainError, ErrorCode, ProposalId, Timestamp, UserId};
use crate::domain::proposal::{Proposal, ProposalDraft, Vote, VoteKind, VoteTally};
use crate::ports::{ProposalTransaction, ProposalUnitOfWork};

use super::proposal_rows::{count_to_db, insert_proposal_rows, row_to_proposal, PROPOSAL_SELECT};

#[derive(Clone)]
pub struct PostgresUnitOfWork {
    pool: PgPool,
}

impl PostgresUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProposalUnitOfWork for PostgresUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn ProposalTransaction>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;
        Ok(Box::new(PostgresProposalTransaction { tx }))
    }
}

pub struct PostgresProposalTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ProposalTransaction for PostgresProposalTransaction {
    async fn lock_proposal(&mut self, id: ProposalId) -> Result<Option<Proposal>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE p.id = $1 FOR UPDATE OF p", PROPOSAL_SELECT))
            .bind(id.value())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| DomainError::database("Failed to lock proposal", e))?;

        row.map(row_to_proposal).transpose()
    }

    async fn proposal_exists(&mut self, id: ProposalId) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM proposals WHERE id = $1)")
            .bind(id.value())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| DomainError::database("Failed to check proposal existence", e))
    }

    async fn insert_proposal(
        &mut self,
        draft: &ProposalDraft,
        created_at: Timestamp,
    ) -> Result<ProposalId, DomainError> {
        insert_proposal_rows(&mut *self.tx, draft, created_at).await
    }

    async fn link_reply(
        &mut self,
        proposal_id: ProposalId,
        reply_id: ProposalId,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO proposal_replies (proposal_id, reply_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(proposal_id.value())
        .bind(reply_id.value())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to link reply", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_vote(
        &mut self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<Option<Vote>, DomainError> {
        let is_upvote: Option<bool> = sqlx::query_scalar(
            "SELECT is_upvote FROM votes WHERE user_id = $1 AND proposal_id = $2",
        )
        .bind(user_id.value())
        .bind(proposal_id.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to fetch vote", e))?;

        Ok(is_upvote.map(|up| Vote::new(user_id, proposal_id, VoteKind::from_is_upvote(up))))
    }

    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), DomainError> {
        let result = sqlx::query(
            "INSERT INTO votes (user_id, proposal_id, is_upvote) VALUES ($1, $2, $3)",
        )
        .bind(vote.user_id.value())
        .bind(vote.proposal_id.value())
        .bind(vote.kind.is_upvote())
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DomainError::new(
                    ErrorCode::DuplicateVote,
                    format!(
                        "Ledger already holds a vote for user {} on proposal {}",
                        vote.user_id, vote.proposal_id
                    ),
                ))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => Err(
                DomainError::not_found(ErrorCode::UserNotFound, "User", vote.user_id),
            ),
            Err(e) => Err(DomainError::database("Failed to insert vote", e)),
        }
    }

    async fn delete_vote(
        &mut self,
        user_id: UserId,
        proposal_id: ProposalId,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM votes WHERE user_id = $1 AND proposal_id = $2")
            .bind(user_id.value())
            .bind(proposal_id.value())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DomainError::database("Failed to delete vote", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(
                ErrorCode::VoteNotFound,
                "Vote",
                format!("{}/{}", user_id, proposal_id),
            ));
        }

        Ok(())
    }

    async fn write_tally(
        &mut self,
        proposal_id: ProposalId,
        tally: VoteTally,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE proposals SET upvote_count = $2, downvote_count = $3 WHERE id = $1",
        )
        .bind(proposal_id.value())
        .bind(count_to_db(tally.upvotes)?)
        .bind(count_to_db(tally.downvotes)?)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to write tally", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(
                ErrorCode::ProposalNotFound,
                "Proposal",
                proposal_id,
            ));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit transaction", e))
    }
}
