//! Establishment aggregate model.
//!
//! # Responsibility
//! - Define the aggregate shared by attractions, hotels and restaurants.
//! - Validate aggregates before any write reaches storage.
//!
//! # Invariants
//! - `id` is assigned by the caller before persistence, never by the store.
//! - `location.establishment_id` and every `images[i].establishment_id` equal
//!   `id`.
//! - `deleted_at == None` is the only "active" state.

use crate::model::category::Category;
use crate::model::location::{Image, Location};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

/// Stable identifier of an establishment, shared with its satellites as
/// `establishment_id`.
pub type EstablishmentId = Uuid;

/// Kind-specific part of an establishment.
///
/// Implemented by one zero-or-more-field struct per kind; the associated
/// category ties the struct to its discriminator.
pub trait EstablishmentDetails: Debug + Clone + PartialEq {
    const CATEGORY: Category;
}

/// Attractions carry no fields beyond the shared set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttractionDetails;

/// Hotels carry no fields beyond the shared set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelDetails;

/// Restaurant-only fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantDetails {
    /// Free-form opening hours, e.g. `Mon-Fri 09:00-22:00`.
    pub opening_hours: String,
}

impl EstablishmentDetails for AttractionDetails {
    const CATEGORY: Category = Category::Attraction;
}

impl EstablishmentDetails for HotelDetails {
    const CATEGORY: Category = Category::Hotel;
}

impl EstablishmentDetails for RestaurantDetails {
    const CATEGORY: Category = Category::Restaurant;
}

/// Full logical establishment: entity fields, one location, N images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Establishment<K> {
    pub id: EstablishmentId,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub rating: f64,
    pub contact_number: String,
    pub licence_url: String,
    pub website_url: String,
    pub details: K,
    pub location: Location,
    /// Insertion order is preserved on read.
    pub images: Vec<Image>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

pub type Attraction = Establishment<AttractionDetails>;
pub type Hotel = Establishment<HotelDetails>;
pub type Restaurant = Establishment<RestaurantDetails>;

/// Rejected aggregate shape.
#[derive(Debug, Clone, PartialEq)]
pub enum EstablishmentValidationError {
    BlankName,
    NonFiniteRating(f64),
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    LocationOwnerMismatch {
        expected: EstablishmentId,
        actual: EstablishmentId,
    },
    ImageOwnerMismatch {
        image_id: Uuid,
        expected: EstablishmentId,
        actual: EstablishmentId,
    },
}

impl Display for EstablishmentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "establishment name must not be blank"),
            Self::NonFiniteRating(value) => write!(f, "rating must be finite, got {value}"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude must be within [-90, 90], got {value}")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude must be within [-180, 180], got {value}")
            }
            Self::LocationOwnerMismatch { expected, actual } => write!(
                f,
                "location belongs to establishment {actual}, expected {expected}"
            ),
            Self::ImageOwnerMismatch {
                image_id,
                expected,
                actual,
            } => write!(
                f,
                "image {image_id} belongs to establishment {actual}, expected {expected}"
            ),
        }
    }
}

impl Error for EstablishmentValidationError {}

impl<K: EstablishmentDetails> Establishment<K> {
    /// Discriminator of this aggregate's kind.
    pub fn category(&self) -> Category {
        K::CATEGORY
    }

    /// Returns whether the entity row is active.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Checks the aggregate before it is written.
    ///
    /// Satellite categories are not checked here; stores overwrite them.
    pub fn validate(&self) -> Result<(), EstablishmentValidationError> {
        if self.name.trim().is_empty() {
            return Err(EstablishmentValidationError::BlankName);
        }
        if !self.rating.is_finite() {
            return Err(EstablishmentValidationError::NonFiniteRating(self.rating));
        }

        let location = &self.location;
        if !location.latitude.is_finite() || !(-90.0..=90.0).contains(&location.latitude) {
            return Err(EstablishmentValidationError::LatitudeOutOfRange(
                location.latitude,
            ));
        }
        if !location.longitude.is_finite() || !(-180.0..=180.0).contains(&location.longitude) {
            return Err(EstablishmentValidationError::LongitudeOutOfRange(
                location.longitude,
            ));
        }
        if location.establishment_id != self.id {
            return Err(EstablishmentValidationError::LocationOwnerMismatch {
                expected: self.id,
                actual: location.establishment_id,
            });
        }

        for image in &self.images {
            if image.establishment_id != self.id {
                return Err(EstablishmentValidationError::ImageOwnerMismatch {
                    image_id: image.image_id,
                    expected: self.id,
                    actual: image.establishment_id,
                });
            }
        }

        Ok(())
    }
}
