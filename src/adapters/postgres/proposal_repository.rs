//! PostgreSQL implementation of ProposalRepository.
//!
//! Proposals live in `proposals`; tags, reply links and followers live in
//! link tables keyed by `proposal_id` that cascade on delete. Nothing keyed by
//! `reply_id` or by the vote ledger cascades.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::foundation::{DomainError, ErrorCode, ProposalId, Timestamp, UserId};
use crate::domain::proposal::{Proposal, ProposalDraft, ProposalEdit, ProposalQuery};
use crate::ports::ProposalRepository;

use super::proposal_rows::{
    insert_proposal_rows, push_criterion, replace_tags, row_to_proposal, FOLLOWER_PROPOSAL_FK,
    PROPOSAL_SELECT,
};

/// PostgreSQL implementation of ProposalRepository.
#[derive(Clone)]
pub struct PostgresProposalRepository {
    pool: PgPool,
}

impl PostgresProposalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProposalRepository for PostgresProposalRepository {
    async fn find_by_id(&self, id: ProposalId) -> Result<Option<Proposal>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE p.id = $1", PROPOSAL_SELECT))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch proposal", e))?;

        row.map(row_to_proposal).transpose()
    }

    async fn find_by_ids(&self, ids: &[ProposalId]) -> Result<Vec<Proposal>, DomainError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();

        let rows = sqlx::query(&format!(
            "{} WHERE p.id = ANY($1) ORDER BY p.id",
            PROPOSAL_SELECT
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch proposals by id", e))?;

        rows.into_iter().map(row_to_proposal).collect()
    }

    async fn find_matching(&self, query: &ProposalQuery) -> Result<Vec<Proposal>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(PROPOSAL_SELECT);
        builder.push(" WHERE TRUE");
        for criterion in query.criteria() {
            builder.push(" AND ");
            push_criterion(&mut builder, criterion);
        }
        builder.push(" ORDER BY p.id");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to query proposals", e))?;

        tracing::debug!(query = %query, rows = rows.len(), "Proposal scan");
        rows.into_iter().map(row_to_proposal).collect()
    }

    async fn exists(&self, id: ProposalId) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM proposals WHERE id = $1)")
            .bind(id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to check proposal existence", e))
    }

    async fn insert(
        &self,
        draft: &ProposalDraft,
        created_at: Timestamp,
    ) -> Result<ProposalId, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;

        let id = insert_proposal_rows(&mut *tx, draft, created_at).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit transaction", e))?;
        Ok(id)
    }

    async fn apply_edit(&self, edit: &ProposalEdit) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;

        let result = sqlx::query("UPDATE proposals SET text = $2, source = $3 WHERE id = $1")
            .bind(edit.id.value())
            .bind(&edit.text)
            .bind(&edit.source)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to update proposal", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(
                ErrorCode::ProposalNotFound,
                "Proposal",
                edit.id,
            ));
        }

        let tag_ids: Vec<i64> = edit.tags.iter().map(|t| t.value()).collect();
        replace_tags(&mut *tx, edit.id, &tag_ids).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit transaction", e))?;
        Ok(())
    }

    async fn delete(&self, id: ProposalId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM proposals WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete proposal", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(
                ErrorCode::ProposalNotFound,
                "Proposal",
                id,
            ));
        }

        Ok(())
    }

    async fn add_follower(&self, id: ProposalId, user_id: UserId) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO proposal_followers (proposal_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id.value())
        .bind(user_id.value())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                if db_err.constraint() == Some(FOLLOWER_PROPOSAL_FK) {
                    Err(DomainError::not_found(
                        ErrorCode::ProposalNotFound,
                        "Proposal",
                        id,
                    ))
                } else {
                    Err(DomainError::not_found(ErrorCode::UserNotFound, "User", user_id))
                }
            }
            Err(e) => Err(DomainError::database("Failed to add follower", e)),
        }
    }

    async fn remove_follower(&self, id: ProposalId, user_id: UserId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM proposal_followers WHERE proposal_id = $1 AND user_id = $2")
            .bind(id.value())
            .bind(user_id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to remove follower", e))?;

        Ok(())
    }
}
