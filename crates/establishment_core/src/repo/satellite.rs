//! Shared location and image helpers.
//!
//! # Responsibility
//! - Insert, update and load rows of `location_table` and `image_table` on
//!   behalf of an entity-kind store.
//!
//! # Invariants
//! - The `category` written is always the caller's kind, never the value
//!   carried by the record.
//! - Reads return active rows of the requested category only.
//! - Images come back in insertion order (`rowid ASC`).

use crate::model::category::Category;
use crate::model::establishment::EstablishmentId;
use crate::model::location::{Image, Location};
use crate::repo::error::RepoResult;
use crate::repo::port::StatementExecutor;
use crate::repo::schema::{
    category_at, category_value, optional_ms_value, placeholders, text_value, uuid_at,
    uuid_value, IMAGE_TABLE, LOCATION_TABLE, NOW_MS_SQL,
};
use rusqlite::types::Value;
use rusqlite::Row;
use std::collections::HashMap;

// Keeps `IN (...)` lists well below SQLite's bind variable limit.
const BATCH_SIZE: usize = 500;

const LOCATION_COLUMNS: &str = "location_id, establishment_id, address, latitude, longitude, \
     country, city, state_province, category, created_at, updated_at, deleted_at";

const IMAGE_COLUMNS: &str =
    "image_id, establishment_id, image_url, category, created_at, updated_at, deleted_at";

pub fn insert_location<E: StatementExecutor>(
    exec: &E,
    category: Category,
    location: &Location,
) -> RepoResult<()> {
    exec.execute(
        "insert location",
        &format!(
            "INSERT INTO {LOCATION_TABLE} ({LOCATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);"
        ),
        &[
            uuid_value(location.location_id),
            uuid_value(location.establishment_id),
            text_value(&location.address),
            Value::Real(location.latitude),
            Value::Real(location.longitude),
            text_value(&location.country),
            text_value(&location.city),
            text_value(&location.state_province),
            category_value(category),
            Value::Integer(location.created_at),
            Value::Integer(location.updated_at),
            optional_ms_value(location.deleted_at),
        ],
    )?;
    Ok(())
}

pub fn insert_image<E: StatementExecutor>(
    exec: &E,
    category: Category,
    image: &Image,
) -> RepoResult<()> {
    exec.execute(
        "insert image",
        &format!(
            "INSERT INTO {IMAGE_TABLE} ({IMAGE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);"
        ),
        &[
            uuid_value(image.image_id),
            uuid_value(image.establishment_id),
            text_value(&image.image_url),
            category_value(category),
            Value::Integer(image.created_at),
            Value::Integer(image.updated_at),
            optional_ms_value(image.deleted_at),
        ],
    )?;
    Ok(())
}

/// Updates the mutable location columns; returns affected rows.
pub fn update_location<E: StatementExecutor>(
    exec: &E,
    category: Category,
    establishment_id: EstablishmentId,
    location: &Location,
) -> RepoResult<usize> {
    exec.execute(
        "update location",
        &format!(
            "UPDATE {LOCATION_TABLE}
             SET
                address = ?1,
                latitude = ?2,
                longitude = ?3,
                country = ?4,
                city = ?5,
                state_province = ?6,
                updated_at = {NOW_MS_SQL}
             WHERE establishment_id = ?7
               AND category = ?8
               AND deleted_at IS NULL;"
        ),
        &[
            text_value(&location.address),
            Value::Real(location.latitude),
            Value::Real(location.longitude),
            text_value(&location.country),
            text_value(&location.city),
            text_value(&location.state_province),
            uuid_value(establishment_id),
            category_value(category),
        ],
    )
}

pub fn load_location<E: StatementExecutor>(
    exec: &E,
    category: Category,
    establishment_id: EstablishmentId,
) -> RepoResult<Option<Location>> {
    exec.query_one(
        "get location",
        &format!(
            "SELECT {LOCATION_COLUMNS}
             FROM {LOCATION_TABLE}
             WHERE establishment_id = ?1
               AND category = ?2
               AND deleted_at IS NULL
             ORDER BY rowid ASC
             LIMIT 1;"
        ),
        &[uuid_value(establishment_id), category_value(category)],
        parse_location_row,
    )
}

pub fn load_images<E: StatementExecutor>(
    exec: &E,
    category: Category,
    establishment_id: EstablishmentId,
) -> RepoResult<Vec<Image>> {
    exec.query_many(
        "get images",
        &format!(
            "SELECT {IMAGE_COLUMNS}
             FROM {IMAGE_TABLE}
             WHERE establishment_id = ?1
               AND category = ?2
               AND deleted_at IS NULL
             ORDER BY rowid ASC;"
        ),
        &[uuid_value(establishment_id), category_value(category)],
        parse_image_row,
    )
}

/// Loads the active location of each id with one query per batch.
///
/// Ids without an active location are absent from the map; when several
/// active rows exist for one id the earliest inserted wins.
pub fn load_locations<E: StatementExecutor>(
    exec: &E,
    category: Category,
    establishment_ids: &[EstablishmentId],
) -> RepoResult<HashMap<EstablishmentId, Location>> {
    let mut locations = HashMap::with_capacity(establishment_ids.len());

    for chunk in establishment_ids.chunks(BATCH_SIZE) {
        let (sql, binds) = batch_query(LOCATION_TABLE, LOCATION_COLUMNS, category, chunk);
        for location in exec.query_many("list locations", &sql, &binds, parse_location_row)? {
            locations
                .entry(location.establishment_id)
                .or_insert(location);
        }
    }

    Ok(locations)
}

/// Loads the active images of each id with one query per batch.
pub fn load_images_for<E: StatementExecutor>(
    exec: &E,
    category: Category,
    establishment_ids: &[EstablishmentId],
) -> RepoResult<HashMap<EstablishmentId, Vec<Image>>> {
    let mut images: HashMap<EstablishmentId, Vec<Image>> = HashMap::new();

    for chunk in establishment_ids.chunks(BATCH_SIZE) {
        let (sql, binds) = batch_query(IMAGE_TABLE, IMAGE_COLUMNS, category, chunk);
        for image in exec.query_many("list images", &sql, &binds, parse_image_row)? {
            images.entry(image.establishment_id).or_default().push(image);
        }
    }

    Ok(images)
}

fn batch_query(
    table: &str,
    columns: &str,
    category: Category,
    establishment_ids: &[EstablishmentId],
) -> (String, Vec<Value>) {
    let sql = format!(
        "SELECT {columns}
         FROM {table}
         WHERE category = ?
           AND deleted_at IS NULL
           AND establishment_id IN ({})
         ORDER BY rowid ASC;",
        placeholders(establishment_ids.len())
    );

    let mut binds = Vec::with_capacity(establishment_ids.len() + 1);
    binds.push(category_value(category));
    binds.extend(establishment_ids.iter().copied().map(uuid_value));
    (sql, binds)
}

fn parse_location_row(row: &Row<'_>) -> RepoResult<Location> {
    Ok(Location {
        location_id: uuid_at(row, 0, "location_table.location_id")?,
        establishment_id: uuid_at(row, 1, "location_table.establishment_id")?,
        address: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        country: row.get(5)?,
        city: row.get(6)?,
        state_province: row.get(7)?,
        category: category_at(row, 8, "location_table.category")?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        deleted_at: row.get(11)?,
    })
}

fn parse_image_row(row: &Row<'_>) -> RepoResult<Image> {
    Ok(Image {
        image_id: uuid_at(row, 0, "image_table.image_id")?,
        establishment_id: uuid_at(row, 1, "image_table.establishment_id")?,
        image_url: row.get(2)?,
        category: category_at(row, 3, "image_table.category")?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        deleted_at: row.get(6)?,
    })
}
