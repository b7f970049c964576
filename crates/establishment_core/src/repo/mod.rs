//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Funnel every statement through [`port::StatementExecutor`].
//!
//! # Invariants
//! - Establishment writes enforce `Establishment::validate()` before any
//!   statement runs.
//! - Repository APIs return semantic errors (`NotFound`, `LocationNotFound`,
//!   `RecordNotFound`) in addition to statement failures.

pub mod error;
pub mod establishment_repo;
pub mod favourite_repo;
pub mod image_repo;
pub mod kind;
pub mod port;
pub mod predicate;
pub mod review_repo;
pub(crate) mod satellite;
pub mod schema;

pub use error::{RepoError, RepoResult, StatementPhase};
pub use establishment_repo::{
    DeleteMode, EstablishmentRepository, Listing, SqliteAttractionRepository,
    SqliteEstablishmentRepository, SqliteHotelRepository, SqliteRestaurantRepository,
    StoreOptions, WriteMode,
};
pub use favourite_repo::{FavouriteRepository, SqliteFavouriteRepository};
pub use image_repo::{ImageRepository, SqliteImageRepository};
pub use kind::EstablishmentKind;
pub use port::{Deadline, SqliteExecutor, StatementExecutor};
pub use predicate::{CountScope, Page};
pub use review_repo::{ReviewRepository, SqliteReviewRepository};
