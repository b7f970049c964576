//! Domain model for establishment aggregates and their satellites.
//!
//! # Responsibility
//! - Define the aggregate shape (entity + location + images) shared by all
//!   establishment kinds.
//! - Define reviews and favourites attached to an establishment id.
//!
//! # Invariants
//! - Every establishment is identified by a caller-assigned `EstablishmentId`.
//! - Deletion is represented by a `deleted_at` tombstone, not row removal,
//!   unless the store runs in hard-delete mode.

pub mod category;
pub mod establishment;
pub mod location;
pub mod review;
