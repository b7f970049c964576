//! Persistence core for tourism establishments: attractions, hotels and
//! restaurants with their shared locations and images.
//! This crate is the single source of truth for storage invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{Config, ConfigError, ConfigResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config};
pub use model::category::Category;
pub use model::establishment::{
    Attraction, AttractionDetails, Establishment, EstablishmentDetails, EstablishmentId,
    EstablishmentValidationError, Hotel, HotelDetails, Restaurant, RestaurantDetails,
};
pub use model::location::{Image, ImageId, Location, LocationFilter, LocationId};
pub use model::review::{Favourite, FavouriteId, Review, ReviewId};
pub use repo::{
    Deadline, DeleteMode, EstablishmentRepository, Listing, Page, RepoError, RepoResult,
    SqliteAttractionRepository, SqliteEstablishmentRepository, SqliteHotelRepository,
    SqliteRestaurantRepository, StoreOptions, WriteMode,
};
pub use service::{
    AttractionService, EstablishmentService, FavouriteService, HotelService, ImageService,
    RestaurantService, ReviewService,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
