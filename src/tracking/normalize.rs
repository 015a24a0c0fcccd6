use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::models::record::{Document, OrderRecord};
use crate::models::status::TrackingStatus;
use crate::models::tracking::{PackageDetails, PackageSize, Timeline, TrackingInfo};

const ID_KEYS: [&str; 3] = ["$id", "id", "trackingId"];
const PICKUP_KEYS: [&str; 3] = ["pickup", "pickupAddress", "pickupLocation"];
const DROPOFF_KEYS: [&str; 3] = ["dropoff", "dropoffAddress", "dropoffLocation"];
const RIDER_KEYS: [&str; 3] = ["riderId", "rider", "assignedRider"];
const ORDERED_KEYS: [&str; 3] = ["$createdAt", "createdAt", "ordered"];
const UPDATED_KEYS: [&str; 3] = ["$updatedAt", "updatedAt", "lastUpdate"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("record has no identifier")]
    MissingId,

    #[error("record {0} has no status")]
    MissingStatus(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedOrder {
    pub info: TrackingInfo,
    pub rider_ref: Option<String>,
}

pub fn normalize(record: &OrderRecord) -> Result<NormalizedOrder, NormalizeError> {
    let tracking_id = record
        .text(&ID_KEYS)
        .ok_or(NormalizeError::MissingId)?
        .to_string();

    let raw_status = record
        .text(&["status"])
        .ok_or_else(|| NormalizeError::MissingStatus(tracking_id.clone()))?;
    let status = TrackingStatus::from_backend(raw_status).unwrap_or_else(|| {
        warn!(
            order_id = %tracking_id,
            status = raw_status,
            "unmapped backend status, showing as pending"
        );
        TrackingStatus::Pending
    });

    let delivered = status == TrackingStatus::Delivered;

    let info = TrackingInfo {
        status,
        pickup: record.text(&PICKUP_KEYS).unwrap_or_default().to_string(),
        dropoff: record.text(&DROPOFF_KEYS).unwrap_or_default().to_string(),
        package_details: package_details(record),
        rider: None,
        timeline: timeline(record),
        estimated_delivery: record
            .timestamp(&["estimatedDelivery"])
            .filter(|_| status.allows_estimate()),
        delivery_photo: record
            .text(&["deliveryPhoto"])
            .filter(|_| delivered)
            .map(str::to_string),
        customer_rating: customer_rating(record).filter(|_| delivered),
        customer_review: record
            .text(&["customerReview"])
            .filter(|_| delivered)
            .map(str::to_string),
        tracking_id,
    };

    let rider_ref = if status.allows_rider() {
        rider_ref(record)
    } else {
        None
    };

    Ok(NormalizedOrder { info, rider_ref })
}

fn package_details(record: &OrderRecord) -> PackageDetails {
    let nested = record.child(&["packageDetails"]);
    let source: &Document = nested.as_ref().unwrap_or(record);

    let size = source
        .text(&["size", "packageSize"])
        .and_then(PackageSize::from_backend)
        .unwrap_or_default();

    PackageDetails {
        is_fragile: source.flag(&["isFragile", "fragile"]).unwrap_or(false),
        size,
        instructions: source
            .text(&["instructions", "deliveryInstructions"])
            .unwrap_or_default()
            .to_string(),
    }
}

fn timeline(record: &OrderRecord) -> Timeline {
    let nested = record.child(&["timeline"]);
    let lookup = |keys: &[&str]| {
        record
            .timestamp(keys)
            .or_else(|| nested.as_ref().and_then(|timeline| timeline.timestamp(keys)))
    };

    let ordered = lookup(&ORDERED_KEYS[..]);
    let updated = lookup(&UPDATED_KEYS[..]);

    let ordered = ordered.or(updated).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let last_update = updated.unwrap_or(ordered).max(ordered);

    Timeline {
        ordered,
        last_update,
    }
}

fn customer_rating(record: &OrderRecord) -> Option<u8> {
    let rating = record.number(&["customerRating"])?;
    if rating.fract() != 0.0 || !(1.0..=5.0).contains(&rating) {
        return None;
    }
    Some(rating as u8)
}

fn rider_ref(record: &OrderRecord) -> Option<String> {
    if let Some(id) = record.text(&RIDER_KEYS) {
        return Some(id.to_string());
    }
    record
        .child(&RIDER_KEYS)
        .and_then(|rider| rider.text(&["$id", "id"]).map(str::to_string))
}
