use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::status::TrackingStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl PackageSize {
    pub fn from_backend(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "small" | "s" => Some(PackageSize::Small),
            "medium" | "m" => Some(PackageSize::Medium),
            "large" | "l" => Some(PackageSize::Large),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackageSize::Small => "small",
            PackageSize::Medium => "medium",
            PackageSize::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PackageDetails {
    pub is_fragile: bool,
    pub size: PackageSize,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiderInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub rating: f64,
    pub completed_trips: u32,
}

impl RiderInfo {
    pub fn rating_display(&self) -> String {
        if self.rating > 0.0 {
            format!("{:.1}", self.rating)
        } else {
            "New".to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub ordered: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub tracking_id: String,
    pub status: TrackingStatus,
    pub pickup: String,
    pub dropoff: String,
    pub package_details: PackageDetails,
    pub rider: Option<RiderInfo>,
    pub timeline: Timeline,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_review: Option<String>,
}

pub const NOT_FOUND_CODE: &str = "Not found";
pub const CONNECTION_ERROR_CODE: &str = "Connection error";
pub const INVALID_RECORD_CODE: &str = "Invalid record";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackingError {
    pub error: String,
    pub message: String,
}

impl TrackingError {
    pub fn not_found() -> Self {
        Self {
            error: NOT_FOUND_CODE.to_string(),
            message: "Unable to find a shipment with that tracking code.".to_string(),
        }
    }

    pub fn connection() -> Self {
        Self {
            error: CONNECTION_ERROR_CODE.to_string(),
            message: "Unable to connect to the tracking server. Please try again later."
                .to_string(),
        }
    }

    pub fn invalid_record() -> Self {
        Self {
            error: INVALID_RECORD_CODE.to_string(),
            message: "This shipment record could not be read. Please contact support."
                .to_string(),
        }
    }
}

// Untagged: clients discriminate on the presence of `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TrackingResult {
    Error(TrackingError),
    Info(Box<TrackingInfo>),
}

impl TrackingResult {
    pub fn is_error(&self) -> bool {
        matches!(self, TrackingResult::Error(_))
    }

    pub fn into_result(self) -> Result<TrackingInfo, TrackingError> {
        match self {
            TrackingResult::Info(info) => Ok(*info),
            TrackingResult::Error(err) => Err(err),
        }
    }
}

impl From<Result<TrackingInfo, TrackingError>> for TrackingResult {
    fn from(result: Result<TrackingInfo, TrackingError>) -> Self {
        match result {
            Ok(info) => TrackingResult::Info(Box::new(info)),
            Err(err) => TrackingResult::Error(err),
        }
    }
}
