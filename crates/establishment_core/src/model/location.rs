//! Shared satellite records: one location and zero or more images per
//! establishment.
//!
//! # Invariants
//! - `establishment_id` links a satellite to its owner by convention only;
//!   there is no declared foreign key.
//! - `category` names the entity-kind table that owns `establishment_id`.
//!   Stores overwrite it with their own kind on write.

use crate::model::category::Category;
use crate::model::establishment::EstablishmentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a location row.
pub type LocationId = Uuid;

/// Stable identifier of an image row.
pub type ImageId = Uuid;

/// Address and coordinates of one establishment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: LocationId,
    pub establishment_id: EstablishmentId,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub city: String,
    pub state_province: String,
    pub category: Category,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    /// `None` while the row is active.
    pub deleted_at: Option<i64>,
}

/// One photo of an establishment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub image_id: ImageId,
    pub establishment_id: EstablishmentId,
    pub image_url: String,
    pub category: Category,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    /// `None` while the row is active.
    pub deleted_at: Option<i64>,
}

impl Image {
    /// Creates an active image owned by `establishment_id`.
    pub fn new(
        image_id: ImageId,
        establishment_id: EstablishmentId,
        category: Category,
        image_url: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            image_id,
            establishment_id,
            image_url: image_url.into(),
            category,
            created_at: now_ms,
            updated_at: now_ms,
            deleted_at: None,
        }
    }
}

/// Geographic substring filter used by `list_by_location`.
///
/// Each field is matched independently as a case-sensitive substring; an
/// empty field matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFilter {
    pub country: String,
    pub city: String,
    pub state_province: String,
}

impl LocationFilter {
    pub fn new(
        country: impl Into<String>,
        city: impl Into<String>,
        state_province: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
            state_province: state_province.into(),
        }
    }
}
