//! Per-kind persistence mapping for the generic establishment store.
//!
//! Entity tables share one column layout, scanned positionally in this order:
//!
//! | idx | column                              |
//! |-----|-------------------------------------|
//! | 0   | `<kind>_id`                         |
//! | 1   | `owner_id`                          |
//! | 2   | `<kind>_name`                       |
//! | 3   | `description`                       |
//! | 4   | `rating`                            |
//! | 5   | `contact_number`                    |
//! | 6   | `licence_url`                       |
//! | 7   | `website_url`                       |
//! | 8.. | kind extras (`EXTRA_COLUMNS` order) |
//! | +0  | `created_at`                        |
//! | +1  | `updated_at`                        |
//! | +2  | `deleted_at`                        |

use crate::model::establishment::{
    AttractionDetails, EstablishmentDetails, HotelDetails, RestaurantDetails,
};
use crate::repo::error::RepoResult;
use crate::repo::schema::{EntityTable, ATTRACTION_TABLE, HOTEL_TABLE, RESTAURANT_TABLE};
use rusqlite::types::Value;
use rusqlite::Row;

/// Maps one establishment kind onto its entity table.
pub trait EstablishmentKind: EstablishmentDetails {
    const TABLE: EntityTable;
    /// Kind-only columns, stored between `website_url` and `created_at`.
    const EXTRA_COLUMNS: &'static [&'static str];

    /// Bind values for `EXTRA_COLUMNS`, same order.
    fn extra_values(&self) -> Vec<Value>;

    /// Reads the kind extras starting at column `first`.
    fn read_extra(row: &Row<'_>, first: usize) -> RepoResult<Self>;
}

impl EstablishmentKind for AttractionDetails {
    const TABLE: EntityTable = ATTRACTION_TABLE;
    const EXTRA_COLUMNS: &'static [&'static str] = &[];

    fn extra_values(&self) -> Vec<Value> {
        Vec::new()
    }

    fn read_extra(_row: &Row<'_>, _first: usize) -> RepoResult<Self> {
        Ok(Self)
    }
}

impl EstablishmentKind for HotelDetails {
    const TABLE: EntityTable = HOTEL_TABLE;
    const EXTRA_COLUMNS: &'static [&'static str] = &[];

    fn extra_values(&self) -> Vec<Value> {
        Vec::new()
    }

    fn read_extra(_row: &Row<'_>, _first: usize) -> RepoResult<Self> {
        Ok(Self)
    }
}

impl EstablishmentKind for RestaurantDetails {
    const TABLE: EntityTable = RESTAURANT_TABLE;
    const EXTRA_COLUMNS: &'static [&'static str] = &["opening_hours"];

    fn extra_values(&self) -> Vec<Value> {
        vec![Value::Text(self.opening_hours.clone())]
    }

    fn read_extra(row: &Row<'_>, first: usize) -> RepoResult<Self> {
        Ok(Self {
            opening_hours: row.get(first)?,
        })
    }
}

/// Unqualified entity column names in scan order.
pub fn entity_column_names<K: EstablishmentKind>() -> Vec<&'static str> {
    let table = K::TABLE;
    let mut columns = vec![
        table.id_column,
        "owner_id",
        table.name_column,
        "description",
        "rating",
        "contact_number",
        "licence_url",
        "website_url",
    ];
    columns.extend_from_slice(K::EXTRA_COLUMNS);
    columns.extend_from_slice(&["created_at", "updated_at", "deleted_at"]);
    columns
}

/// Entity columns in scan order, qualified with `alias`.
pub fn entity_columns<K: EstablishmentKind>(alias: &str) -> String {
    entity_column_names::<K>()
        .iter()
        .map(|column| format!("{alias}.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}
