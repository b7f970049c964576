//! Favourite persistence.

use crate::model::review::{Favourite, FavouriteId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::port::{Deadline, SqliteExecutor, StatementExecutor};
use crate::repo::schema::{
    ensure_connection_ready, optional_ms_value, text_value, uuid_at, uuid_value, FAVOURITE_TABLE,
    NOW_MS_SQL,
};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

const FAVOURITE_COLUMNS: &str =
    "favourite_id, establishment_id, user_id, created_at, updated_at, deleted_at";

/// Favourite persistence contract.
pub trait FavouriteRepository {
    /// Inserts a favourite and returns the stored row.
    fn add_to_favourites(&self, favourite: &Favourite, deadline: Deadline)
        -> RepoResult<Favourite>;
    /// Soft-deletes one favourite; an inactive or unknown id is `RecordNotFound`.
    fn remove_from_favourites(&self, favourite_id: FavouriteId, deadline: Deadline)
        -> RepoResult<()>;
    /// Active favourites of one user, oldest first.
    fn list_favourites_by_user(&self, user_id: &str, deadline: Deadline)
        -> RepoResult<Vec<Favourite>>;
}

/// SQLite-backed favourite repository.
pub struct SqliteFavouriteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFavouriteRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[FAVOURITE_TABLE])?;
        Ok(Self { conn })
    }
}

impl FavouriteRepository for SqliteFavouriteRepository<'_> {
    fn add_to_favourites(
        &self,
        favourite: &Favourite,
        deadline: Deadline,
    ) -> RepoResult<Favourite> {
        let exec = SqliteExecutor::new(self.conn, deadline);
        exec.execute(
            "insert favourite",
            &format!(
                "INSERT INTO {FAVOURITE_TABLE} ({FAVOURITE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);"
            ),
            &[
                uuid_value(favourite.favourite_id),
                uuid_value(favourite.establishment_id),
                text_value(&favourite.user_id),
                Value::Integer(favourite.created_at),
                Value::Integer(favourite.updated_at),
                optional_ms_value(favourite.deleted_at),
            ],
        )?;

        exec.query_one(
            "get favourite",
            &format!(
                "SELECT {FAVOURITE_COLUMNS}
                 FROM {FAVOURITE_TABLE}
                 WHERE favourite_id = ?1
                   AND deleted_at IS NULL;"
            ),
            &[uuid_value(favourite.favourite_id)],
            parse_favourite_row,
        )?
        .ok_or(RepoError::RecordNotFound {
            table: FAVOURITE_TABLE,
            id: favourite.favourite_id,
        })
    }

    fn remove_from_favourites(
        &self,
        favourite_id: FavouriteId,
        deadline: Deadline,
    ) -> RepoResult<()> {
        let exec = SqliteExecutor::new(self.conn, deadline);
        let changed = exec.execute(
            "soft delete favourite",
            &format!(
                "UPDATE {FAVOURITE_TABLE}
                 SET
                    deleted_at = {NOW_MS_SQL},
                    updated_at = {NOW_MS_SQL}
                 WHERE favourite_id = ?1
                   AND deleted_at IS NULL;"
            ),
            &[uuid_value(favourite_id)],
        )?;

        if changed == 0 {
            return Err(RepoError::RecordNotFound {
                table: FAVOURITE_TABLE,
                id: favourite_id,
            });
        }
        Ok(())
    }

    fn list_favourites_by_user(
        &self,
        user_id: &str,
        deadline: Deadline,
    ) -> RepoResult<Vec<Favourite>> {
        SqliteExecutor::new(self.conn, deadline).query_many(
            "list favourites",
            &format!(
                "SELECT {FAVOURITE_COLUMNS}
                 FROM {FAVOURITE_TABLE}
                 WHERE user_id = ?1
                   AND deleted_at IS NULL
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            &[text_value(user_id)],
            parse_favourite_row,
        )
    }
}

fn parse_favourite_row(row: &Row<'_>) -> RepoResult<Favourite> {
    Ok(Favourite {
        favourite_id: uuid_at(row, 0, "favourite_table.favourite_id")?,
        establishment_id: uuid_at(row, 1, "favourite_table.establishment_id")?,
        user_id: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        deleted_at: row.get(5)?,
    })
}
