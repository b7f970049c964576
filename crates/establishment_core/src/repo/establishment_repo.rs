//! Establishment repository contract and the generic SQLite store behind
//! attractions, hotels and restaurants.
//!
//! # Responsibility
//! - Decompose an aggregate into one location row, N image rows and one
//!   entity row on write; reassemble it on read.
//! - Provide paginated listing, geographic filtering and name search with
//!   counts built from the same predicate as their page.
//!
//! # Invariants
//! - Write paths call `Establishment::validate()` before any statement.
//! - Read paths only return active entity rows with an active location of
//!   the store's own category.
//! - `update` never touches image rows.
//! - `delete` never touches location or image rows.

use crate::model::establishment::{
    AttractionDetails, Establishment, EstablishmentId, HotelDetails, RestaurantDetails,
};
use crate::model::location::{Image, Location, LocationFilter};
use crate::repo::error::{RepoError, RepoResult, StatementPhase};
use crate::repo::kind::{entity_column_names, entity_columns, EstablishmentKind};
use crate::repo::port::{Deadline, SqliteExecutor, StatementExecutor};
use crate::repo::predicate::{CountScope, Page, Predicate};
use crate::repo::satellite;
use crate::repo::schema::{
    ensure_connection_ready, optional_ms_value, placeholders, row_count, text_value, uuid_at,
    uuid_value, IMAGE_TABLE, LOCATION_TABLE, NOW_MS_SQL,
};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::Deserialize;
use std::marker::PhantomData;

/// How multi-statement writes (`create`, `update`) reach the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// One transaction per operation; any failed step rolls back all steps.
    #[default]
    Atomic,
    /// Statements commit one by one; a failed step leaves earlier rows.
    Sequential,
}

/// What `delete` does to the entity row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteMode {
    /// Stamp `deleted_at`; the row stays and is filtered from reads.
    #[default]
    Soft,
    /// Remove the entity row. Satellite rows stay orphaned.
    Hard,
}

/// Store behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub write_mode: WriteMode,
    pub delete_mode: DeleteMode,
}

/// One page of results plus the count that accompanies it.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Storage contract for one establishment kind.
pub trait EstablishmentRepository<K: EstablishmentKind> {
    /// Persists location, images, then the entity row. Returns the aggregate
    /// as stored (satellite categories set to the kind).
    fn create(
        &self,
        establishment: &Establishment<K>,
        deadline: Deadline,
    ) -> RepoResult<Establishment<K>>;

    /// Loads one active aggregate.
    fn get(&self, id: EstablishmentId, deadline: Deadline) -> RepoResult<Establishment<K>>;

    /// Lists active aggregates by `rating DESC`. `total` is the global active
    /// count of the kind, not a count of the page.
    fn list(&self, page: Page, deadline: Deadline) -> RepoResult<Listing<Establishment<K>>>;

    /// Updates entity and location columns, then re-reads the aggregate.
    fn update(
        &self,
        establishment: &Establishment<K>,
        deadline: Deadline,
    ) -> RepoResult<Establishment<K>>;

    /// Deletes the entity row according to the configured `DeleteMode`.
    fn delete(&self, id: EstablishmentId, deadline: Deadline) -> RepoResult<()>;

    /// Filters by case-sensitive substrings of country, city and
    /// state/province; `total` counts every match.
    fn list_by_location(
        &self,
        page: Page,
        filter: &LocationFilter,
        deadline: Deadline,
    ) -> RepoResult<Listing<Establishment<K>>>;

    /// Case-insensitive substring search on the name; `total` counts every
    /// match.
    fn find_by_name(
        &self,
        name: &str,
        deadline: Deadline,
    ) -> RepoResult<Listing<Establishment<K>>>;
}

/// SQLite-backed store for one establishment kind.
pub struct SqliteEstablishmentRepository<'conn, K> {
    conn: &'conn Connection,
    options: StoreOptions,
    kind: PhantomData<K>,
}

pub type SqliteAttractionRepository<'conn> = SqliteEstablishmentRepository<'conn, AttractionDetails>;
pub type SqliteHotelRepository<'conn> = SqliteEstablishmentRepository<'conn, HotelDetails>;
pub type SqliteRestaurantRepository<'conn> = SqliteEstablishmentRepository<'conn, RestaurantDetails>;

impl<'conn, K: EstablishmentKind> SqliteEstablishmentRepository<'conn, K> {
    /// Builds a store with default options on a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_options(conn, StoreOptions::default())
    }

    pub fn with_options(conn: &'conn Connection, options: StoreOptions) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[K::TABLE.table, LOCATION_TABLE, IMAGE_TABLE])?;
        Ok(Self {
            conn,
            options,
            kind: PhantomData,
        })
    }

    fn reader(&self, deadline: Deadline) -> SqliteExecutor<'conn> {
        SqliteExecutor::new(self.conn, deadline)
    }

    /// Runs `steps` according to the write mode.
    fn write<T>(
        &self,
        deadline: Deadline,
        steps: impl FnOnce(&SqliteExecutor<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        match self.options.write_mode {
            WriteMode::Sequential => steps(&SqliteExecutor::new(self.conn, deadline)),
            WriteMode::Atomic => {
                deadline.check("begin transaction")?;
                let tx = self.conn.unchecked_transaction().map_err(|err| {
                    RepoError::persistence("begin transaction", StatementPhase::Execute, err)
                })?;
                // Dropping `tx` on an early return rolls back.
                let value = steps(&SqliteExecutor::new(&tx, deadline))?;
                tx.commit().map_err(|err| {
                    RepoError::persistence("commit transaction", StatementPhase::Execute, err)
                })?;
                Ok(value)
            }
        }
    }

    fn not_found(id: EstablishmentId) -> RepoError {
        RepoError::NotFound {
            category: K::CATEGORY,
            id,
        }
    }

    fn location_not_found(establishment_id: EstablishmentId) -> RepoError {
        RepoError::LocationNotFound {
            category: K::CATEGORY,
            establishment_id,
        }
    }

    fn order_by() -> String {
        format!("e.rating DESC, e.{} ASC", K::TABLE.id_column)
    }

    fn fetch_page<E: StatementExecutor>(
        exec: &E,
        step: &'static str,
        predicate: &Predicate,
        page: Page,
    ) -> RepoResult<Vec<Establishment<K>>> {
        let (sql, binds) =
            predicate.select_sql(&entity_columns::<K>("e"), &Self::order_by(), page);
        let rows = exec.query_many(step, &sql, &binds, parse_entity_row::<K>)?;
        Self::hydrate(exec, rows)
    }

    fn count<E: StatementExecutor>(
        exec: &E,
        step: &'static str,
        predicate: &Predicate,
    ) -> RepoResult<u64> {
        let (sql, binds) = predicate.count_sql();
        let count = exec
            .query_one(step, &sql, &binds, |row| Ok(row.get::<_, i64>(0)?))?
            .unwrap_or(0);
        row_count(count)
    }

    fn list_with_count<E: StatementExecutor>(
        exec: &E,
        predicate: &Predicate,
        page: Page,
        scope: CountScope,
    ) -> RepoResult<Listing<Establishment<K>>> {
        let items = Self::fetch_page(exec, "list establishments", predicate, page)?;
        let total = match scope {
            CountScope::SameAsPage => Self::count(exec, "count establishments", predicate)?,
            CountScope::AllActive => {
                Self::count(exec, "count establishments", &Predicate::active(K::TABLE))?
            }
        };
        Ok(Listing { items, total })
    }

    /// Attaches locations and images with one query each per batch.
    fn hydrate<E: StatementExecutor>(
        exec: &E,
        rows: Vec<EntityRow<K>>,
    ) -> RepoResult<Vec<Establishment<K>>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<EstablishmentId> = rows.iter().map(|row| row.id).collect();
        let mut locations = satellite::load_locations(exec, K::CATEGORY, &ids)?;
        let mut images = satellite::load_images_for(exec, K::CATEGORY, &ids)?;

        rows.into_iter()
            .map(|row| {
                let location = locations
                    .remove(&row.id)
                    .ok_or_else(|| Self::location_not_found(row.id))?;
                let row_images = images.remove(&row.id).unwrap_or_default();
                Ok(row.assemble(location, row_images))
            })
            .collect()
    }

    fn fetch_one<E: StatementExecutor>(
        exec: &E,
        id: EstablishmentId,
    ) -> RepoResult<Establishment<K>> {
        let table = K::TABLE;
        let row = exec
            .query_one(
                "get establishment",
                &format!(
                    "SELECT {}
                     FROM {} e
                     WHERE e.{} = ?1
                       AND e.deleted_at IS NULL;",
                    entity_columns::<K>("e"),
                    table.table,
                    table.id_column
                ),
                &[uuid_value(id)],
                parse_entity_row::<K>,
            )?
            .ok_or_else(|| Self::not_found(id))?;

        let location = satellite::load_location(exec, K::CATEGORY, id)?
            .ok_or_else(|| Self::location_not_found(id))?;
        let images = satellite::load_images(exec, K::CATEGORY, id)?;
        Ok(row.assemble(location, images))
    }
}

impl<K: EstablishmentKind> EstablishmentRepository<K> for SqliteEstablishmentRepository<'_, K> {
    fn create(
        &self,
        establishment: &Establishment<K>,
        deadline: Deadline,
    ) -> RepoResult<Establishment<K>> {
        establishment.validate()?;

        self.write(deadline, |exec| {
            satellite::insert_location(exec, K::CATEGORY, &establishment.location)?;
            for image in &establishment.images {
                satellite::insert_image(exec, K::CATEGORY, image)?;
            }
            insert_entity(exec, establishment)
        })?;
        debug!(
            "event=establishment_insert module=repo status=ok category={} images={}",
            K::CATEGORY,
            establishment.images.len()
        );

        let mut stored = establishment.clone();
        stored.location.category = K::CATEGORY;
        for image in &mut stored.images {
            image.category = K::CATEGORY;
        }
        Ok(stored)
    }

    fn get(&self, id: EstablishmentId, deadline: Deadline) -> RepoResult<Establishment<K>> {
        Self::fetch_one(&self.reader(deadline), id)
    }

    fn list(&self, page: Page, deadline: Deadline) -> RepoResult<Listing<Establishment<K>>> {
        Self::list_with_count(
            &self.reader(deadline),
            &Predicate::active(K::TABLE),
            page,
            CountScope::AllActive,
        )
    }

    fn update(
        &self,
        establishment: &Establishment<K>,
        deadline: Deadline,
    ) -> RepoResult<Establishment<K>> {
        establishment.validate()?;
        let id = establishment.id;

        self.write(deadline, |exec| {
            if update_entity(exec, establishment)? == 0 {
                return Err(Self::not_found(id));
            }
            let changed =
                satellite::update_location(exec, K::CATEGORY, id, &establishment.location)?;
            if changed == 0 {
                return Err(Self::location_not_found(id));
            }
            Ok(())
        })?;

        Self::fetch_one(&self.reader(deadline), id)
    }

    fn delete(&self, id: EstablishmentId, deadline: Deadline) -> RepoResult<()> {
        let table = K::TABLE;
        let exec = self.reader(deadline);
        let changed = match self.options.delete_mode {
            DeleteMode::Soft => exec.execute(
                "soft delete establishment",
                &format!(
                    "UPDATE {}
                     SET
                        deleted_at = {NOW_MS_SQL},
                        updated_at = {NOW_MS_SQL}
                     WHERE {} = ?1
                       AND deleted_at IS NULL;",
                    table.table, table.id_column
                ),
                &[uuid_value(id)],
            )?,
            DeleteMode::Hard => exec.execute(
                "hard delete establishment",
                &format!("DELETE FROM {} WHERE {} = ?1;", table.table, table.id_column),
                &[uuid_value(id)],
            )?,
        };

        if changed == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    fn list_by_location(
        &self,
        page: Page,
        filter: &LocationFilter,
        deadline: Deadline,
    ) -> RepoResult<Listing<Establishment<K>>> {
        Self::list_with_count(
            &self.reader(deadline),
            &Predicate::by_location(K::TABLE, K::CATEGORY, filter),
            page,
            CountScope::SameAsPage,
        )
    }

    fn find_by_name(
        &self,
        name: &str,
        deadline: Deadline,
    ) -> RepoResult<Listing<Establishment<K>>> {
        Self::list_with_count(
            &self.reader(deadline),
            &Predicate::by_name(K::TABLE, name),
            Page::all(),
            CountScope::SameAsPage,
        )
    }
}

/// Entity columns of one row, before satellites are attached.
struct EntityRow<K> {
    id: EstablishmentId,
    owner_id: String,
    name: String,
    description: String,
    rating: f64,
    contact_number: String,
    licence_url: String,
    website_url: String,
    details: K,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

impl<K> EntityRow<K> {
    fn assemble(self, location: Location, images: Vec<Image>) -> Establishment<K> {
        Establishment {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            rating: self.rating,
            contact_number: self.contact_number,
            licence_url: self.licence_url,
            website_url: self.website_url,
            details: self.details,
            location,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

fn parse_entity_row<K: EstablishmentKind>(row: &Row<'_>) -> RepoResult<EntityRow<K>> {
    let extras = K::EXTRA_COLUMNS.len();
    let timestamps = 8 + extras;

    Ok(EntityRow {
        id: uuid_at(row, 0, K::TABLE.id_column)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        rating: row.get(4)?,
        contact_number: row.get(5)?,
        licence_url: row.get(6)?,
        website_url: row.get(7)?,
        details: K::read_extra(row, 8)?,
        created_at: row.get(timestamps)?,
        updated_at: row.get(timestamps + 1)?,
        deleted_at: row.get(timestamps + 2)?,
    })
}

fn insert_entity<K: EstablishmentKind, E: StatementExecutor>(
    exec: &E,
    establishment: &Establishment<K>,
) -> RepoResult<()> {
    let columns = entity_column_names::<K>().join(", ");
    let mut binds = vec![
        uuid_value(establishment.id),
        text_value(&establishment.owner_id),
        text_value(&establishment.name),
        text_value(&establishment.description),
        Value::Real(establishment.rating),
        text_value(&establishment.contact_number),
        text_value(&establishment.licence_url),
        text_value(&establishment.website_url),
    ];
    binds.extend(establishment.details.extra_values());
    binds.push(Value::Integer(establishment.created_at));
    binds.push(Value::Integer(establishment.updated_at));
    binds.push(optional_ms_value(establishment.deleted_at));

    exec.execute(
        "insert establishment",
        &format!(
            "INSERT INTO {} ({columns}) VALUES ({});",
            K::TABLE.table,
            placeholders(binds.len())
        ),
        &binds,
    )?;
    Ok(())
}

/// Updates the descriptive columns of an active entity row; returns
/// affected rows.
fn update_entity<K: EstablishmentKind, E: StatementExecutor>(
    exec: &E,
    establishment: &Establishment<K>,
) -> RepoResult<usize> {
    let table = K::TABLE;
    let mut assignments = vec![
        format!("{} = ?", table.name_column),
        "description = ?".to_string(),
        "rating = ?".to_string(),
        "contact_number = ?".to_string(),
        "licence_url = ?".to_string(),
        "website_url = ?".to_string(),
    ];
    assignments.extend(K::EXTRA_COLUMNS.iter().map(|column| format!("{column} = ?")));
    assignments.push(format!("updated_at = {NOW_MS_SQL}"));

    let mut binds = vec![
        text_value(&establishment.name),
        text_value(&establishment.description),
        Value::Real(establishment.rating),
        text_value(&establishment.contact_number),
        text_value(&establishment.licence_url),
        text_value(&establishment.website_url),
    ];
    binds.extend(establishment.details.extra_values());
    binds.push(uuid_value(establishment.id));

    exec.execute(
        "update establishment",
        &format!(
            "UPDATE {} SET {} WHERE {} = ? AND deleted_at IS NULL;",
            table.table,
            assignments.join(", "),
            table.id_column
        ),
        &binds,
    )
}
