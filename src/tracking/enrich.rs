use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::models::record::UserRecord;
use crate::models::tracking::{RiderInfo, TrackingInfo};
use crate::repository::{OrderRepository, RepositoryError};
use crate::tracking::normalize::NormalizedOrder;

#[derive(Debug, Error)]
pub enum EnrichmentFailure {
    #[error("{0}")]
    Lookup(#[from] RepositoryError),

    #[error("rider lookup timed out")]
    TimedOut,
}

pub struct Enriched {
    pub info: TrackingInfo,
    pub failure: Option<EnrichmentFailure>,
}

// Lookup failures degrade to `rider: None` and ride along in `failure`.
pub async fn enrich_rider<R>(repo: &R, order: NormalizedOrder, timeout: Duration) -> Enriched
where
    R: OrderRepository + ?Sized,
{
    let NormalizedOrder { mut info, rider_ref } = order;
    let Some(rider_id) = rider_ref else {
        return Enriched {
            info,
            failure: None,
        };
    };

    let failure = match tokio::time::timeout(timeout, repo.get_user(&rider_id)).await {
        Ok(Ok(user)) => {
            info.rider = Some(rider_from_user(&user));
            None
        }
        Ok(Err(err)) => Some(EnrichmentFailure::from(err)),
        Err(_) => Some(EnrichmentFailure::TimedOut),
    };

    if let Some(failure) = &failure {
        warn!(
            order_id = %info.tracking_id,
            rider_id = %rider_id,
            error = %failure,
            "rider lookup failed, continuing without rider"
        );
    }

    Enriched { info, failure }
}

pub fn rider_from_user(user: &UserRecord) -> RiderInfo {
    let full_name = [user.text(&["firstName"]), user.text(&["lastName"])]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let name = if full_name.is_empty() {
        user.text(&["name"]).unwrap_or("Rider").to_string()
    } else {
        full_name
    };

    RiderInfo {
        name,
        profile_image: user
            .text(&["profileImage", "avatar"])
            .map(str::to_string),
        rating: user.number(&["rating"]).unwrap_or(0.0).clamp(0.0, 5.0),
        completed_trips: user
            .number(&["completedTrips"])
            .filter(|trips| *trips >= 0.0)
            .map(|trips| trips as u32)
            .unwrap_or(0),
    }
}
