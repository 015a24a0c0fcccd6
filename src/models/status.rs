use serde::{Deserialize, Serialize};

// Cancelled is absorbing and sits outside the linear progress track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TrackingStatus {
    Pending,
    Negotiating,
    Assigned,
    InTransit,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Zinc,
    Amber,
    Blue,
    Purple,
    Green,
    Red,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Neutral,
    Waiting,
    Active,
    Success,
    Critical,
}

impl StatusColor {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusColor::Zinc => "zinc",
            StatusColor::Amber => "amber",
            StatusColor::Blue => "blue",
            StatusColor::Purple => "purple",
            StatusColor::Green => "green",
            StatusColor::Red => "red",
        }
    }
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Neutral => "neutral",
            Urgency::Waiting => "waiting",
            Urgency::Active => "active",
            Urgency::Success => "success",
            Urgency::Critical => "critical",
        }
    }
}

pub const OFF_TRACK_STEP: i8 = -1;

impl TrackingStatus {
    pub const ALL: [TrackingStatus; 6] = [
        TrackingStatus::Pending,
        TrackingStatus::Negotiating,
        TrackingStatus::Assigned,
        TrackingStatus::InTransit,
        TrackingStatus::Delivered,
        TrackingStatus::Cancelled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TrackingStatus::Pending => "Order Placed",
            TrackingStatus::Negotiating => "Finding Rider",
            TrackingStatus::Assigned => "Rider Assigned",
            TrackingStatus::InTransit => "In Transit",
            TrackingStatus::Delivered => "Delivered",
            TrackingStatus::Cancelled => "Cancelled",
        }
    }

    // pending and negotiating share stage 0
    pub fn step(self) -> i8 {
        match self {
            TrackingStatus::Pending | TrackingStatus::Negotiating => 0,
            TrackingStatus::Assigned => 1,
            TrackingStatus::InTransit => 2,
            TrackingStatus::Delivered => 3,
            TrackingStatus::Cancelled => OFF_TRACK_STEP,
        }
    }

    pub fn is_terminal_cancelled(self) -> bool {
        self == TrackingStatus::Cancelled
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TrackingStatus::Delivered | TrackingStatus::Cancelled)
    }

    pub fn color(self) -> StatusColor {
        match self {
            TrackingStatus::Pending => StatusColor::Zinc,
            TrackingStatus::Negotiating => StatusColor::Amber,
            TrackingStatus::Assigned => StatusColor::Blue,
            TrackingStatus::InTransit => StatusColor::Purple,
            TrackingStatus::Delivered => StatusColor::Green,
            TrackingStatus::Cancelled => StatusColor::Red,
        }
    }

    pub fn urgency(self) -> Urgency {
        match self {
            TrackingStatus::Pending => Urgency::Neutral,
            TrackingStatus::Negotiating => Urgency::Waiting,
            TrackingStatus::Assigned | TrackingStatus::InTransit => Urgency::Active,
            TrackingStatus::Delivered => Urgency::Success,
            TrackingStatus::Cancelled => Urgency::Critical,
        }
    }

    pub fn allows_rider(self) -> bool {
        matches!(
            self,
            TrackingStatus::Assigned | TrackingStatus::InTransit | TrackingStatus::Delivered
        )
    }

    pub fn allows_estimate(self) -> bool {
        matches!(self, TrackingStatus::Assigned | TrackingStatus::InTransit)
    }

    pub fn from_backend(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        let status = match normalized.as_str() {
            "pending" | "created" | "new" => TrackingStatus::Pending,
            "negotiating" => TrackingStatus::Negotiating,
            "assigned" | "accepted" => TrackingStatus::Assigned,
            "in-transit" | "intransit" | "picked-up" => TrackingStatus::InTransit,
            "delivered" | "completed" => TrackingStatus::Delivered,
            "cancelled" | "canceled" => TrackingStatus::Cancelled,
            _ => return None,
        };
        Some(status)
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
