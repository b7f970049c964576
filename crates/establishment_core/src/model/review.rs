//! Reviews and favourites attached to an establishment id.

use crate::model::establishment::EstablishmentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ReviewId = Uuid;
pub type FavouriteId = Uuid;

/// User review of one establishment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: ReviewId,
    pub establishment_id: EstablishmentId,
    pub user_id: String,
    pub rating: f64,
    pub comment: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Bookmark of one establishment by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favourite {
    pub favourite_id: FavouriteId,
    pub establishment_id: EstablishmentId,
    pub user_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}
