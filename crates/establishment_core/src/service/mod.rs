//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers decoupled from storage details.

pub mod establishment_service;
pub mod record_service;

use crate::model::category::Category;
use crate::model::establishment::{AttractionDetails, HotelDetails, RestaurantDetails};
use crate::repo::RepoResult;
use log::{error, info};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub use establishment_service::EstablishmentService;
pub use record_service::{FavouriteService, ImageService, ReviewService};

pub type AttractionService<R> = EstablishmentService<AttractionDetails, R>;
pub type HotelService<R> = EstablishmentService<HotelDetails, R>;
pub type RestaurantService<R> = EstablishmentService<RestaurantDetails, R>;

/// Current wall clock in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn observe<T>(op: &str, category: Category, started_at: Instant, result: &RepoResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event=establishment_{op} module=service status=ok category={category} duration_ms={duration_ms}"
        ),
        Err(err) if err.is_not_found() => info!(
            "event=establishment_{op} module=service status=not_found category={category} duration_ms={duration_ms}"
        ),
        Err(err) => error!(
            "event=establishment_{op} module=service status=error category={category} duration_ms={duration_ms} error={err}"
        ),
    }
}

fn observe_record<T>(op: &str, started_at: Instant, result: &RepoResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event={op} module=service status=ok duration_ms={duration_ms}"),
        Err(err) if err.is_not_found() => {
            info!("event={op} module=service status=not_found duration_ms={duration_ms}")
        }
        Err(err) => {
            error!("event={op} module=service status=error duration_ms={duration_ms} error={err}")
        }
    }
}
