//! Review persistence.
//!
//! # Invariants
//! - Reads return active rows only.
//! - `list_reviews` counts with the same predicate as its rows.
//! - Deleting an already deleted review is `RecordNotFound`.

use crate::model::establishment::{EstablishmentId, EstablishmentValidationError};
use crate::model::review::{Review, ReviewId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::port::{Deadline, SqliteExecutor, StatementExecutor};
use crate::repo::schema::{
    ensure_connection_ready, optional_ms_value, row_count, text_value, uuid_at, uuid_value,
    NOW_MS_SQL, REVIEW_TABLE,
};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

const REVIEW_COLUMNS: &str =
    "review_id, establishment_id, user_id, rating, comment, created_at, updated_at, deleted_at";

/// Review persistence contract.
pub trait ReviewRepository {
    /// Inserts a review and returns the stored row.
    fn create_review(&self, review: &Review, deadline: Deadline) -> RepoResult<Review>;
    /// Active reviews of one establishment, oldest first, plus their count.
    fn list_reviews(
        &self,
        establishment_id: EstablishmentId,
        deadline: Deadline,
    ) -> RepoResult<(Vec<Review>, u64)>;
    /// Soft-deletes one review.
    fn delete_review(&self, review_id: ReviewId, deadline: Deadline) -> RepoResult<()>;
}

/// SQLite-backed review repository.
pub struct SqliteReviewRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReviewRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[REVIEW_TABLE])?;
        Ok(Self { conn })
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn create_review(&self, review: &Review, deadline: Deadline) -> RepoResult<Review> {
        if !review.rating.is_finite() {
            return Err(EstablishmentValidationError::NonFiniteRating(review.rating).into());
        }

        let exec = SqliteExecutor::new(self.conn, deadline);
        exec.execute(
            "insert review",
            &format!(
                "INSERT INTO {REVIEW_TABLE} ({REVIEW_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);"
            ),
            &[
                uuid_value(review.review_id),
                uuid_value(review.establishment_id),
                text_value(&review.user_id),
                Value::Real(review.rating),
                text_value(&review.comment),
                Value::Integer(review.created_at),
                Value::Integer(review.updated_at),
                optional_ms_value(review.deleted_at),
            ],
        )?;

        exec.query_one(
            "get review",
            &format!(
                "SELECT {REVIEW_COLUMNS}
                 FROM {REVIEW_TABLE}
                 WHERE review_id = ?1
                   AND deleted_at IS NULL;"
            ),
            &[uuid_value(review.review_id)],
            parse_review_row,
        )?
        .ok_or(RepoError::RecordNotFound {
            table: REVIEW_TABLE,
            id: review.review_id,
        })
    }

    fn list_reviews(
        &self,
        establishment_id: EstablishmentId,
        deadline: Deadline,
    ) -> RepoResult<(Vec<Review>, u64)> {
        let exec = SqliteExecutor::new(self.conn, deadline);
        let filter = "WHERE establishment_id = ?1 AND deleted_at IS NULL";
        let binds = [uuid_value(establishment_id)];

        let reviews = exec.query_many(
            "list reviews",
            &format!(
                "SELECT {REVIEW_COLUMNS}
                 FROM {REVIEW_TABLE}
                 {filter}
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            &binds,
            parse_review_row,
        )?;
        let count = exec
            .query_one(
                "count reviews",
                &format!("SELECT COUNT(*) FROM {REVIEW_TABLE} {filter};"),
                &binds,
                |row| Ok(row.get::<_, i64>(0)?),
            )?
            .unwrap_or(0);

        Ok((reviews, row_count(count)?))
    }

    fn delete_review(&self, review_id: ReviewId, deadline: Deadline) -> RepoResult<()> {
        let exec = SqliteExecutor::new(self.conn, deadline);
        let changed = exec.execute(
            "soft delete review",
            &format!(
                "UPDATE {REVIEW_TABLE}
                 SET
                    deleted_at = {NOW_MS_SQL},
                    updated_at = {NOW_MS_SQL}
                 WHERE review_id = ?1
                   AND deleted_at IS NULL;"
            ),
            &[uuid_value(review_id)],
        )?;

        if changed == 0 {
            return Err(RepoError::RecordNotFound {
                table: REVIEW_TABLE,
                id: review_id,
            });
        }
        Ok(())
    }
}

fn parse_review_row(row: &Row<'_>) -> RepoResult<Review> {
    Ok(Review {
        review_id: uuid_at(row, 0, "review_table.review_id")?,
        establishment_id: uuid_at(row, 1, "review_table.establishment_id")?,
        user_id: row.get(2)?,
        rating: row.get(3)?,
        comment: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        deleted_at: row.get(7)?,
    })
}
