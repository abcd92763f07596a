//! Shared SQL and row mapping for the proposal tables.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Postgres, QueryBuilder, Row};

use crate::domain::foundation::{DomainError, ErrorCode, ProposalId, TagId, Timestamp, UserId};
use crate::domain::proposal::{Proposal, ProposalCriterion, ProposalDraft, VoteTally};

/// Proposal columns plus tag, reply and follower id arrays.
///
/// Callers append `WHERE`, `ORDER BY` or `FOR UPDATE OF p`.
pub(super) const PROPOSAL_SELECT: &str = r#"
    SELECT p.id, p.text, p.source, p.author_id, p.created_at, p.is_root,
           p.upvote_count, p.downvote_count,
           ARRAY(SELECT t.tag_id FROM proposal_tags t
                 WHERE t.proposal_id = p.id ORDER BY t.tag_id) AS tag_ids,
           ARRAY(SELECT r.reply_id FROM proposal_replies r
                 WHERE r.proposal_id = p.id ORDER BY r.reply_id) AS reply_ids,
           ARRAY(SELECT f.user_id FROM proposal_followers f
                 WHERE f.proposal_id = p.id ORDER BY f.user_id) AS follower_ids
    FROM proposals p
"#;

/// Constraint raised when a follower row points at a missing proposal.
pub(super) const FOLLOWER_PROPOSAL_FK: &str = "proposal_followers_proposal_id_fkey";

pub(super) fn row_to_proposal(row: PgRow) -> Result<Proposal, DomainError> {
    let id: i64 = column(&row, "id")?;
    let text: String = column(&row, "text")?;
    let source: String = column(&row, "source")?;
    let author_id: i64 = column(&row, "author_id")?;
    let created_at: DateTime<Utc> = column(&row, "created_at")?;
    let is_root: bool = column(&row, "is_root")?;
    let upvotes: i32 = column(&row, "upvote_count")?;
    let downvotes: i32 = column(&row, "downvote_count")?;
    let tag_ids: Vec<i64> = column(&row, "tag_ids")?;
    let reply_ids: Vec<i64> = column(&row, "reply_ids")?;
    let follower_ids: Vec<i64> = column(&row, "follower_ids")?;

    Ok(Proposal::reconstitute(
        ProposalId::new(id),
        text,
        source,
        UserId::new(author_id),
        Timestamp::from_datetime(created_at),
        is_root,
        tag_ids.into_iter().map(TagId::new).collect(),
        reply_ids.into_iter().map(ProposalId::new).collect(),
        VoteTally::new(count_from_db(upvotes)?, count_from_db(downvotes)?),
        follower_ids.into_iter().map(UserId::new).collect(),
    ))
}

pub(super) fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(&format!("Failed to get {}", name), e))
}

pub(super) fn count_from_db(value: i32) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::ConsistencyViolation,
            format!("Negative tally in storage: {}", value),
        )
    })
}

pub(super) fn count_to_db(value: u32) -> Result<i32, DomainError> {
    i32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::ConsistencyViolation,
            format!("Tally out of storage range: {}", value),
        )
    })
}

/// Renders one criterion as a boolean SQL expression over `p`.
pub(super) fn push_criterion(builder: &mut QueryBuilder<'_, Postgres>, criterion: &ProposalCriterion) {
    match criterion {
        ProposalCriterion::AuthoredBy(user_id) => {
            builder.push("p.author_id = ").push_bind(user_id.value());
        }
        ProposalCriterion::TaggedWith(tag_id) => {
            builder
                .push("EXISTS (SELECT 1 FROM proposal_tags pt WHERE pt.proposal_id = p.id AND pt.tag_id = ")
                .push_bind(tag_id.value())
                .push(")");
        }
        ProposalCriterion::TextContains(fragment) => {
            // strpos is case-sensitive and treats the fragment literally.
            builder
                .push("strpos(p.text, ")
                .push_bind(fragment.clone())
                .push(") > 0");
        }
        ProposalCriterion::RootOnly => {
            builder.push("p.is_root");
        }
    }
}

/// Inserts the proposal row and its tag links on an open connection.
pub(super) async fn insert_proposal_rows(
    conn: &mut PgConnection,
    draft: &ProposalDraft,
    created_at: Timestamp,
) -> Result<ProposalId, DomainError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO proposals (text, source, author_id, created_at, is_root)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&draft.text)
    .bind(&draft.source)
    .bind(draft.author_id.value())
    .bind(created_at.as_datetime())
    .bind(draft.is_root)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            DomainError::not_found(ErrorCode::UserNotFound, "User", draft.author_id)
        }
        e => DomainError::database("Failed to insert proposal", e),
    })?;

    let id = ProposalId::new(id);
    let tag_ids: Vec<i64> = draft.tags.iter().map(|t| t.value()).collect();
    replace_tags(conn, id, &tag_ids).await?;
    Ok(id)
}

/// Replaces the tag links of a proposal.
pub(super) async fn replace_tags(
    conn: &mut PgConnection,
    id: ProposalId,
    tag_ids: &[i64],
) -> Result<(), DomainError> {
    sqlx::query("DELETE FROM proposal_tags WHERE proposal_id = $1")
        .bind(id.value())
        .execute(&mut *conn)
        .await
        .map_err(|e| DomainError::database("Failed to clear tags", e))?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO proposal_tags (proposal_id, tag_id)
        SELECT $1, UNNEST($2::BIGINT[])
        "#,
    )
    .bind(id.value())
    .bind(tag_ids)
    .execute(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            DomainError::validation("tags", "Unknown tag id")
        }
        e => DomainError::database("Failed to insert tags", e),
    })?;

    Ok(())
}
