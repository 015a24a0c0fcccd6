use serde::Serialize;

use crate::models::status::TrackingStatus;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Complete,
    Current,
    Upcoming,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Stage {
    pub label: &'static str,
    pub description: &'static str,
    pub state: StageState,
}

pub const STAGES: [(&str, &str); 4] = [
    ("Order Placed", "Package received"),
    ("Rider Assigned", "Rider on the way to pickup"),
    ("In Transit", "Package en route"),
    ("Delivered", "Successfully delivered"),
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProgressTrack {
    Linear { step: u8, stages: Vec<Stage> },
    Cancelled,
}

impl ProgressTrack {
    pub fn for_status(status: TrackingStatus) -> Self {
        let Ok(current) = u8::try_from(status.step()) else {
            return ProgressTrack::Cancelled;
        };

        let stages = STAGES
            .iter()
            .zip(0u8..)
            .map(|(&(label, description), index)| Stage {
                label,
                description,
                state: match index.cmp(&current) {
                    std::cmp::Ordering::Less => StageState::Complete,
                    std::cmp::Ordering::Equal => StageState::Current,
                    std::cmp::Ordering::Greater => StageState::Upcoming,
                },
            })
            .collect();

        ProgressTrack::Linear {
            step: current,
            stages,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProgressTrack::Cancelled)
    }
}
