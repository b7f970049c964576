//! Table layout constants, connection readiness checks and column decoding
//! shared by every repository.

use crate::db::migrations::{current_user_version, latest_version};
use crate::model::category::Category;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use uuid::Uuid;

pub const LOCATION_TABLE: &str = "location_table";
pub const IMAGE_TABLE: &str = "image_table";
pub const REVIEW_TABLE: &str = "review_table";
pub const FAVOURITE_TABLE: &str = "favourite_table";

/// Names of one entity-kind table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityTable {
    pub table: &'static str,
    pub id_column: &'static str,
    pub name_column: &'static str,
}

pub const ATTRACTION_TABLE: EntityTable = EntityTable {
    table: "attraction_table",
    id_column: "attraction_id",
    name_column: "attraction_name",
};

pub const HOTEL_TABLE: EntityTable = EntityTable {
    table: "hotel_table",
    id_column: "hotel_id",
    name_column: "hotel_name",
};

pub const RESTAURANT_TABLE: EntityTable = EntityTable {
    table: "restaurant_table",
    id_column: "restaurant_id",
    name_column: "restaurant_name",
};

/// SQL expression for "now" in epoch milliseconds, at the same precision
/// services stamp creation times with.
pub const NOW_MS_SQL: &str = "CAST(ROUND(unixepoch('subsec') * 1000) AS INTEGER)";

/// Rejects connections that have not been migrated or lack `tables`.
pub fn ensure_connection_ready(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub fn uuid_value(id: Uuid) -> Value {
    Value::Text(id.to_string())
}

pub fn text_value(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub fn category_value(category: Category) -> Value {
    Value::Text(category.as_str().to_string())
}

pub fn optional_ms_value(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

/// Reads a UUID stored as text at column `idx`.
pub fn uuid_at(row: &Row<'_>, idx: usize, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

/// Reads a category discriminator at column `idx`.
pub fn category_at(row: &Row<'_>, idx: usize, column: &str) -> RepoResult<Category> {
    let text: String = row.get(idx)?;
    Category::parse(&text)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid category `{text}` in {column}")))
}

/// Converts a `COUNT(*)` result into a row total.
pub fn row_count(count: i64) -> RepoResult<u64> {
    u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
}

/// `?, ?, ?` with `count` placeholders.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::{
        placeholders, row_count, ATTRACTION_TABLE, HOTEL_TABLE, NOW_MS_SQL, RESTAURANT_TABLE,
    };
    use crate::repo::error::RepoError;
    use rusqlite::Connection;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn wall_clock_ms() -> i64 {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        i64::try_from(elapsed.as_millis()).unwrap()
    }

    #[test]
    fn placeholders_are_comma_separated() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn negative_row_count_is_invalid_data() {
        assert_eq!(row_count(3).unwrap(), 3);
        assert!(matches!(row_count(-1), Err(RepoError::InvalidData(_))));
    }

    #[test]
    fn now_expression_keeps_milliseconds() {
        let conn = Connection::open_in_memory().unwrap();
        let before = wall_clock_ms();
        let now: i64 = conn
            .query_row(&format!("SELECT {NOW_MS_SQL};"), [], |row| row.get(0))
            .unwrap();
        let after = wall_clock_ms();

        assert!(now >= before, "sql now {now} is behind {before}");
        assert!(now <= after, "sql now {now} is ahead of {after}");
    }

    #[test]
    fn entity_tables_use_kind_prefixed_columns() {
        for table in [ATTRACTION_TABLE, HOTEL_TABLE, RESTAURANT_TABLE] {
            let kind = table.table.trim_end_matches("_table");
            assert_eq!(table.id_column, format!("{kind}_id"));
            assert_eq!(table.name_column, format!("{kind}_name"));
        }
    }
}
