//! Establishment use-case service.
//!
//! # Responsibility
//! - Stamp identity and timestamps on new aggregates before persistence.
//! - Derive one deadline per call from the configured request timeout.
//! - Emit one `info`/`error` event per operation with its duration.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::establishment::{Establishment, EstablishmentId};
use crate::model::location::LocationFilter;
use crate::repo::{Deadline, EstablishmentKind, EstablishmentRepository, Listing, Page, RepoResult};
use crate::service::{now_epoch_ms, observe};
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Use-case wrapper over one kind's store.
pub struct EstablishmentService<K, R> {
    repo: R,
    request_timeout: Option<Duration>,
    kind: PhantomData<K>,
}

impl<K: EstablishmentKind, R: EstablishmentRepository<K>> EstablishmentService<K, R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            request_timeout: None,
            kind: PhantomData,
        }
    }

    /// Bounds every call by `timeout` (`None` disables the bound).
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn deadline(&self) -> Deadline {
        Deadline::from_timeout(self.request_timeout)
    }

    /// Persists a new aggregate.
    ///
    /// A nil `id`, `location_id` or `image_id` is replaced by a fresh v4
    /// UUID; owner links and timestamps are set from the aggregate.
    pub fn create(&self, establishment: Establishment<K>) -> RepoResult<Establishment<K>> {
        let started_at = Instant::now();
        let establishment = prepare_for_create(establishment, now_epoch_ms());
        let result = self.repo.create(&establishment, self.deadline());
        observe("create", K::CATEGORY, started_at, &result);
        result
    }

    pub fn get(&self, id: EstablishmentId) -> RepoResult<Establishment<K>> {
        let started_at = Instant::now();
        let result = self.repo.get(id, self.deadline());
        observe("get", K::CATEGORY, started_at, &result);
        result
    }

    /// Lists active aggregates; `total` is the global active count.
    pub fn list(&self, offset: u64, limit: u64) -> RepoResult<Listing<Establishment<K>>> {
        let started_at = Instant::now();
        let result = self.repo.list(Page::new(offset, limit), self.deadline());
        observe("list", K::CATEGORY, started_at, &result);
        result
    }

    pub fn update(&self, establishment: &Establishment<K>) -> RepoResult<Establishment<K>> {
        let started_at = Instant::now();
        let result = self.repo.update(establishment, self.deadline());
        observe("update", K::CATEGORY, started_at, &result);
        result
    }

    pub fn delete(&self, id: EstablishmentId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.delete(id, self.deadline());
        observe("delete", K::CATEGORY, started_at, &result);
        result
    }

    pub fn list_by_location(
        &self,
        offset: u64,
        limit: u64,
        filter: &LocationFilter,
    ) -> RepoResult<Listing<Establishment<K>>> {
        let started_at = Instant::now();
        let result = self
            .repo
            .list_by_location(Page::new(offset, limit), filter, self.deadline());
        observe("list_by_location", K::CATEGORY, started_at, &result);
        result
    }

    pub fn find_by_name(&self, name: &str) -> RepoResult<Listing<Establishment<K>>> {
        let started_at = Instant::now();
        let result = self.repo.find_by_name(name, self.deadline());
        observe("find_by_name", K::CATEGORY, started_at, &result);
        result
    }
}

fn prepare_for_create<K>(mut establishment: Establishment<K>, now_ms: i64) -> Establishment<K> {
    if establishment.id.is_nil() {
        establishment.id = Uuid::new_v4();
    }
    let id = establishment.id;
    establishment.created_at = now_ms;
    establishment.updated_at = now_ms;
    establishment.deleted_at = None;

    let location = &mut establishment.location;
    if location.location_id.is_nil() {
        location.location_id = Uuid::new_v4();
    }
    location.establishment_id = id;
    location.created_at = now_ms;
    location.updated_at = now_ms;
    location.deleted_at = None;

    for image in &mut establishment.images {
        if image.image_id.is_nil() {
            image.image_id = Uuid::new_v4();
        }
        image.establishment_id = id;
        image.created_at = now_ms;
        image.updated_at = now_ms;
        image.deleted_at = None;
    }

    establishment
}
