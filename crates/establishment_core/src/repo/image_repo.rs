//! Standalone image insert.
//!
//! Aggregate stores write images as part of `create`; this repository adds
//! one image to an existing establishment afterwards.

use crate::model::location::Image;
use crate::repo::error::RepoResult;
use crate::repo::port::{Deadline, SqliteExecutor};
use crate::repo::satellite;
use crate::repo::schema::{ensure_connection_ready, IMAGE_TABLE};
use log::debug;
use rusqlite::Connection;

/// Image persistence contract.
pub trait ImageRepository {
    /// Inserts `image` under its own category and returns it unchanged.
    ///
    /// Nothing is checked here: the caller owns `image.category`, the owner
    /// id and the URL. An image filed under another category than its
    /// establishment's kind is stored but never read back by that kind's
    /// store.
    fn create_image(&self, image: &Image, deadline: Deadline) -> RepoResult<Image>;
}

/// SQLite-backed image repository.
pub struct SqliteImageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteImageRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[IMAGE_TABLE])?;
        Ok(Self { conn })
    }
}

impl ImageRepository for SqliteImageRepository<'_> {
    fn create_image(&self, image: &Image, deadline: Deadline) -> RepoResult<Image> {
        let exec = SqliteExecutor::new(self.conn, deadline);
        satellite::insert_image(&exec, image.category, image)?;
        debug!(
            "event=image_insert module=repo status=ok category={}",
            image.category
        );
        Ok(image.clone())
    }
}
