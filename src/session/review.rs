use serde::Serialize;

use crate::tracking::service::{MAX_RATING, MIN_RATING};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewDraft {
    // 0 means no star picked yet
    pub rating: u8,
    pub review: String,
}

impl ReviewDraft {
    pub fn new(rating: u8, review: impl Into<String>) -> Self {
        Self {
            rating,
            review: review.into(),
        }
    }

    pub fn can_submit(&self) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&self.rating)
    }

    pub(crate) fn review_text(&self) -> Option<String> {
        let text = self.review.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedReview {
    pub rating: u8,
    pub review: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewState {
    NotReviewed,
    Submitting,
    Submitted(SubmittedReview),
    SubmissionFailed { message: String },
}

impl ReviewState {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ReviewState::Submitted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayedReview<'a> {
    pub rating: u8,
    pub review: Option<&'a str>,
    pub provisional: bool,
}
