//! Image, review and favourite use-case services.
//!
//! Thin wrappers that stamp ids and timestamps and bound each call with the
//! configured request timeout.

use crate::model::category::Category;
use crate::model::establishment::EstablishmentId;
use crate::model::location::Image;
use crate::model::review::{Favourite, FavouriteId, Review, ReviewId};
use crate::repo::{
    Deadline, FavouriteRepository, ImageRepository, RepoResult, ReviewRepository,
};
use crate::service::{now_epoch_ms, observe_record};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub struct ImageService<R: ImageRepository> {
    repo: R,
    request_timeout: Option<Duration>,
}

impl<R: ImageRepository> ImageService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Attaches one new image to an existing establishment.
    pub fn add_image(
        &self,
        establishment_id: EstablishmentId,
        category: Category,
        image_url: impl Into<String>,
    ) -> RepoResult<Image> {
        let started_at = Instant::now();
        let image = Image::new(
            Uuid::new_v4(),
            establishment_id,
            category,
            image_url,
            now_epoch_ms(),
        );
        let result = self
            .repo
            .create_image(&image, Deadline::from_timeout(self.request_timeout));
        observe_record("create_image", started_at, &result);
        result
    }
}

pub struct ReviewService<R: ReviewRepository> {
    repo: R,
    request_timeout: Option<Duration>,
}

impl<R: ReviewRepository> ReviewService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn create_review(
        &self,
        establishment_id: EstablishmentId,
        user_id: impl Into<String>,
        rating: f64,
        comment: impl Into<String>,
    ) -> RepoResult<Review> {
        let started_at = Instant::now();
        let now_ms = now_epoch_ms();
        let review = Review {
            review_id: Uuid::new_v4(),
            establishment_id,
            user_id: user_id.into(),
            rating,
            comment: comment.into(),
            created_at: now_ms,
            updated_at: now_ms,
            deleted_at: None,
        };
        let result = self
            .repo
            .create_review(&review, Deadline::from_timeout(self.request_timeout));
        observe_record("create_review", started_at, &result);
        result
    }

    /// Active reviews of one establishment and their count.
    pub fn list_reviews(&self, establishment_id: EstablishmentId) -> RepoResult<(Vec<Review>, u64)> {
        let started_at = Instant::now();
        let result = self
            .repo
            .list_reviews(establishment_id, Deadline::from_timeout(self.request_timeout));
        observe_record("list_reviews", started_at, &result);
        result
    }

    pub fn delete_review(&self, review_id: ReviewId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .repo
            .delete_review(review_id, Deadline::from_timeout(self.request_timeout));
        observe_record("delete_review", started_at, &result);
        result
    }
}

pub struct FavouriteService<R: FavouriteRepository> {
    repo: R,
    request_timeout: Option<Duration>,
}

impl<R: FavouriteRepository> FavouriteService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn add_to_favourites(
        &self,
        establishment_id: EstablishmentId,
        user_id: impl Into<String>,
    ) -> RepoResult<Favourite> {
        let started_at = Instant::now();
        let now_ms = now_epoch_ms();
        let favourite = Favourite {
            favourite_id: Uuid::new_v4(),
            establishment_id,
            user_id: user_id.into(),
            created_at: now_ms,
            updated_at: now_ms,
            deleted_at: None,
        };
        let result = self
            .repo
            .add_to_favourites(&favourite, Deadline::from_timeout(self.request_timeout));
        observe_record("add_to_favourites", started_at, &result);
        result
    }

    pub fn remove_from_favourites(&self, favourite_id: FavouriteId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .repo
            .remove_from_favourites(favourite_id, Deadline::from_timeout(self.request_timeout));
        observe_record("remove_from_favourites", started_at, &result);
        result
    }

    pub fn list_favourites_by_user(&self, user_id: &str) -> RepoResult<Vec<Favourite>> {
        let started_at = Instant::now();
        let result = self
            .repo
            .list_favourites_by_user(user_id, Deadline::from_timeout(self.request_timeout));
        observe_record("list_favourites", started_at, &result);
        result
    }
}
