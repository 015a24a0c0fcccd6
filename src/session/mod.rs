pub mod review;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::status::TrackingStatus;
use crate::models::tracking::{TrackingError, TrackingInfo, TrackingResult};
use crate::tracking::service::{ReviewError, TrackingService};

pub use review::{DisplayedReview, ReviewDraft, ReviewState, SubmittedReview};

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedView {
    pub info: TrackingInfo,
    pub review: ReviewState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Loading { previous: Option<LoadedView> },
    Loaded(LoadedView),
    Failed(TrackingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initial,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    code: String,
    kind: FetchKind,
}

impl FetchTicket {
    pub fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTicket {
    generation: u64,
    tracking_id: String,
    submitted: SubmittedReview,
}

impl ReviewTicket {
    pub fn tracking_id(&self) -> &str {
        &self.tracking_id
    }

    pub fn rating(&self) -> u8 {
        self.submitted.rating
    }

    pub fn review(&self) -> Option<&str> {
        self.submitted.review.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("tracking code is empty")]
    EmptyCode,

    #[error("no loaded shipment to refresh")]
    NothingToRefresh,

    #[error("review is not offered for this shipment")]
    ReviewNotOffered,

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("a review submission is already in flight")]
    ReviewInFlight,
}

pub struct TrackingSession {
    id: Uuid,
    code: Option<String>,
    state: SessionState,
    next_seq: u64,
    latest_fetch: u64,
    // bumped per tracked code; older review results are stale
    generation: u64,
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            code: None,
            state: SessionState::Idle,
            next_seq: 0,
            latest_fetch: 0,
            generation: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading { .. })
    }

    pub fn view(&self) -> Option<&LoadedView> {
        match &self.state {
            SessionState::Loaded(view) => Some(view),
            SessionState::Loading { previous } => previous.as_ref(),
            SessionState::Idle | SessionState::Failed(_) => None,
        }
    }

    pub fn info(&self) -> Option<&TrackingInfo> {
        self.view().map(|view| &view.info)
    }

    pub fn error(&self) -> Option<&TrackingError> {
        match &self.state {
            SessionState::Failed(err) => Some(err),
            _ => None,
        }
    }

    fn view_mut(&mut self) -> Option<&mut LoadedView> {
        match &mut self.state {
            SessionState::Loaded(view) => Some(view),
            SessionState::Loading { previous } => previous.as_mut(),
            SessionState::Idle | SessionState::Failed(_) => None,
        }
    }

    fn issue(&mut self, code: String, kind: FetchKind) -> FetchTicket {
        self.next_seq += 1;
        self.latest_fetch = self.next_seq;
        FetchTicket {
            seq: self.next_seq,
            code,
            kind,
        }
    }

    pub fn begin_track(&mut self, code: &str) -> Result<FetchTicket, SessionError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(SessionError::EmptyCode);
        }

        self.code = Some(code.to_string());
        self.generation += 1;
        self.state = SessionState::Loading { previous: None };

        let ticket = self.issue(code.to_string(), FetchKind::Initial);
        debug!(session_id = %self.id, order_id = code, seq = ticket.seq, "tracking started");
        Ok(ticket)
    }

    pub fn begin_refresh(&mut self) -> Result<FetchTicket, SessionError> {
        let code = self.code.clone().ok_or(SessionError::NothingToRefresh)?;

        let previous = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Loaded(view) => view,
            SessionState::Loading {
                previous: Some(view),
            } => view,
            other => {
                self.state = other;
                return Err(SessionError::NothingToRefresh);
            }
        };
        self.state = SessionState::Loading {
            previous: Some(previous),
        };

        let ticket = self.issue(code, FetchKind::Refresh);
        debug!(session_id = %self.id, order_id = %ticket.code, seq = ticket.seq, "refresh started");
        Ok(ticket)
    }

    // Initial-load errors replace the display; refresh errors keep the prior view.
    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        result: impl Into<TrackingResult>,
    ) -> Applied {
        if ticket.seq != self.latest_fetch {
            debug!(
                session_id = %self.id,
                seq = ticket.seq,
                latest = self.latest_fetch,
                "dropping stale fetch result"
            );
            return Applied::Stale;
        }

        let previous = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Loading { previous } => previous,
            SessionState::Loaded(view) => Some(view),
            SessionState::Idle | SessionState::Failed(_) => None,
        };

        self.state = match (ticket.kind, result.into().into_result()) {
            (FetchKind::Initial, Ok(info)) => {
                info!(
                    session_id = %self.id,
                    order_id = %info.tracking_id,
                    status = ?info.status,
                    "shipment loaded"
                );
                SessionState::Loaded(LoadedView {
                    info,
                    review: ReviewState::NotReviewed,
                })
            }
            (FetchKind::Initial, Err(err)) => {
                info!(
                    session_id = %self.id,
                    order_id = %ticket.code,
                    error = %err.error,
                    "shipment load failed"
                );
                SessionState::Failed(err)
            }
            (FetchKind::Refresh, Ok(info)) => {
                let review = previous
                    .filter(|view| view.info.tracking_id == info.tracking_id)
                    .map(|view| view.review)
                    .unwrap_or(ReviewState::NotReviewed);
                debug!(
                    session_id = %self.id,
                    order_id = %info.tracking_id,
                    status = ?info.status,
                    "shipment refreshed"
                );
                SessionState::Loaded(LoadedView { info, review })
            }
            (FetchKind::Refresh, Err(err)) => {
                warn!(
                    session_id = %self.id,
                    order_id = %ticket.code,
                    error = %err.error,
                    "refresh failed, keeping previous data"
                );
                match previous {
                    Some(view) => SessionState::Loaded(view),
                    None => SessionState::Failed(err),
                }
            }
        };

        Applied::Current
    }

    pub fn can_offer_review(&self) -> bool {
        self.view().is_some_and(|view| {
            view.info.status == TrackingStatus::Delivered
                && view.info.customer_rating.is_none()
                && !view.review.is_submitted()
        })
    }

    pub fn review_state(&self) -> Option<&ReviewState> {
        self.view().map(|view| &view.review)
    }

    pub fn begin_review(&mut self, draft: &ReviewDraft) -> Result<ReviewTicket, SessionError> {
        if !self.can_offer_review() {
            return Err(SessionError::ReviewNotOffered);
        }
        if !draft.can_submit() {
            return Err(SessionError::InvalidRating(draft.rating));
        }

        let generation = self.generation;
        let view = self.view_mut().ok_or(SessionError::ReviewNotOffered)?;
        if view.review == ReviewState::Submitting {
            return Err(SessionError::ReviewInFlight);
        }
        view.review = ReviewState::Submitting;

        Ok(ReviewTicket {
            generation,
            tracking_id: view.info.tracking_id.clone(),
            submitted: SubmittedReview {
                rating: draft.rating,
                review: draft.review_text(),
            },
        })
    }

    pub fn apply_review(
        &mut self,
        ticket: ReviewTicket,
        result: Result<(), ReviewError>,
    ) -> Applied {
        let session_id = self.id;
        let current_generation = self.generation;
        let Some(view) = self
            .view_mut()
            .filter(|view| view.info.tracking_id == ticket.tracking_id)
            .filter(|_| ticket.generation == current_generation)
        else {
            debug!(
                session_id = %session_id,
                order_id = %ticket.tracking_id,
                "dropping stale review result"
            );
            return Applied::Stale;
        };

        view.review = match result {
            Ok(()) => {
                info!(
                    session_id = %session_id,
                    order_id = %ticket.tracking_id,
                    rating = ticket.submitted.rating,
                    "review accepted"
                );
                ReviewState::Submitted(ticket.submitted)
            }
            Err(err) => {
                warn!(
                    session_id = %session_id,
                    order_id = %ticket.tracking_id,
                    error = %err,
                    "review rejected"
                );
                ReviewState::SubmissionFailed {
                    message: err.user_message().to_string(),
                }
            }
        };
        Applied::Current
    }

    pub fn displayed_review(&self) -> Option<DisplayedReview<'_>> {
        let view = self.view()?;
        if let Some(rating) = view.info.customer_rating {
            return Some(DisplayedReview {
                rating,
                review: view.info.customer_review.as_deref(),
                provisional: false,
            });
        }
        match &view.review {
            ReviewState::Submitted(submitted) => Some(DisplayedReview {
                rating: submitted.rating,
                review: submitted.review.as_deref(),
                provisional: true,
            }),
            _ => None,
        }
    }

    pub async fn track(
        &mut self,
        service: &TrackingService,
        code: &str,
    ) -> Result<Applied, SessionError> {
        let ticket = self.begin_track(code)?;
        let result = service.track(ticket.code()).await;
        Ok(self.apply_fetch(ticket, result))
    }

    pub async fn refresh(&mut self, service: &TrackingService) -> Result<Applied, SessionError> {
        let ticket = self.begin_refresh()?;
        let result = service.track(ticket.code()).await;
        Ok(self.apply_fetch(ticket, result))
    }

    pub async fn submit_review(
        &mut self,
        service: &TrackingService,
        draft: &ReviewDraft,
    ) -> Result<Applied, SessionError> {
        let ticket = self.begin_review(draft)?;
        let result = service
            .submit_review(ticket.tracking_id(), ticket.rating(), ticket.review())
            .await;
        Ok(self.apply_review(ticket, result))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::tracking::{PackageDetails, Timeline};

    fn info(id: &str, status: TrackingStatus) -> TrackingInfo {
        let ordered = Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0).unwrap();
        TrackingInfo {
            tracking_id: id.to_string(),
            status,
            pickup: "Depot".to_string(),
            dropoff: "Home".to_string(),
            package_details: PackageDetails::default(),
            rider: None,
            timeline: Timeline {
                ordered,
                last_update: ordered,
            },
            estimated_delivery: None,
            delivery_photo: None,
            customer_rating: None,
            customer_review: None,
        }
    }

    fn loaded(id: &str, status: TrackingStatus) -> TrackingSession {
        let mut session = TrackingSession::new();
        let ticket = session.begin_track(id).unwrap();
        assert_eq!(
            session.apply_fetch(ticket, Ok::<_, TrackingError>(info(id, status))),
            Applied::Current
        );
        session
    }

    fn ok(info: TrackingInfo) -> Result<TrackingInfo, TrackingError> {
        Ok(info)
    }

    fn err(error: TrackingError) -> Result<TrackingInfo, TrackingError> {
        Err(error)
    }

    #[test]
    fn starts_idle_and_rejects_blank_codes() {
        let mut session = TrackingSession::new();
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.begin_track("   "), Err(SessionError::EmptyCode));
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn initial_failure_replaces_previous_data() {
        let mut session = loaded("ORD1", TrackingStatus::InTransit);

        let ticket = session.begin_track("ORD999").unwrap();
        assert!(session.info().is_none(), "new code clears displayed data");
        session.apply_fetch(ticket, err(TrackingError::not_found()));

        assert!(session.info().is_none());
        assert_eq!(session.error(), Some(&TrackingError::not_found()));
    }

    #[test]
    fn refresh_keeps_view_visible_while_loading() {
        let mut session = loaded("ORD1", TrackingStatus::Assigned);

        let _ticket = session.begin_refresh().unwrap();

        assert!(session.is_loading());
        assert_eq!(session.info().unwrap().status, TrackingStatus::Assigned);
    }

    #[test]
    fn refresh_failure_keeps_previous_data() {
        let mut session = loaded("ORD1", TrackingStatus::InTransit);
        let before = session.info().cloned();

        let ticket = session.begin_refresh().unwrap();
        session.apply_fetch(ticket, err(TrackingError::connection()));

        assert_eq!(session.info().cloned(), before);
        assert!(session.error().is_none());
        assert!(!session.is_loading());
    }

    #[test]
    fn refresh_success_replaces_view_wholesale() {
        let mut session = loaded("ORD1", TrackingStatus::InTransit);

        let ticket = session.begin_refresh().unwrap();
        let mut fresh = info("ORD1", TrackingStatus::Delivered);
        fresh.dropoff = "Reception desk".to_string();
        session.apply_fetch(ticket, ok(fresh.clone()));

        assert_eq!(session.info(), Some(&fresh));
    }

    #[test]
    fn refresh_requires_loaded_view() {
        let mut session = TrackingSession::new();
        assert_eq!(session.begin_refresh(), Err(SessionError::NothingToRefresh));

        let ticket = session.begin_track("ORD999").unwrap();
        session.apply_fetch(ticket, err(TrackingError::not_found()));
        assert_eq!(session.begin_refresh(), Err(SessionError::NothingToRefresh));
        assert!(session.error().is_some(), "failed state is left alone");
    }

    #[test]
    fn superseded_fetch_results_are_dropped() {
        let mut session = TrackingSession::new();
        let first = session.begin_track("ORD1").unwrap();
        let second = session.begin_track("ORD2").unwrap();

        assert_eq!(
            session.apply_fetch(second, ok(info("ORD2", TrackingStatus::Assigned))),
            Applied::Current
        );
        assert_eq!(
            session.apply_fetch(first, ok(info("ORD1", TrackingStatus::Delivered))),
            Applied::Stale
        );
        assert_eq!(session.info().unwrap().tracking_id, "ORD2");
    }

    #[test]
    fn stale_refresh_cannot_overwrite_new_code() {
        let mut session = loaded("ORD1", TrackingStatus::Assigned);
        let refresh = session.begin_refresh().unwrap();
        let track = session.begin_track("ORD2").unwrap();

        session.apply_fetch(track, err(TrackingError::not_found()));
        assert_eq!(
            session.apply_fetch(refresh, ok(info("ORD1", TrackingStatus::InTransit))),
            Applied::Stale
        );
        assert!(session.info().is_none());
        assert!(session.error().is_some());
    }

    #[test]
    fn review_offered_only_for_unrated_delivered_orders() {
        assert!(!loaded("A", TrackingStatus::InTransit).can_offer_review());
        assert!(!loaded("B", TrackingStatus::Cancelled).can_offer_review());
        assert!(loaded("C", TrackingStatus::Delivered).can_offer_review());

        let mut rated = TrackingSession::new();
        let ticket = rated.begin_track("D").unwrap();
        let mut delivered = info("D", TrackingStatus::Delivered);
        delivered.customer_rating = Some(4);
        rated.apply_fetch(ticket, ok(delivered));
        assert!(!rated.can_offer_review());
    }

    #[test]
    fn zero_rating_cannot_be_submitted() {
        let mut session = loaded("ORD1", TrackingStatus::Delivered);
        assert_eq!(
            session.begin_review(&ReviewDraft::new(0, "hm")),
            Err(SessionError::InvalidRating(0))
        );
        assert_eq!(session.review_state(), Some(&ReviewState::NotReviewed));
    }

    #[test]
    fn successful_review_is_echoed_before_refetch() {
        let mut session = loaded("ORD1", TrackingStatus::Delivered);

        let ticket = session.begin_review(&ReviewDraft::new(5, "Great!")).unwrap();
        assert_eq!(session.review_state(), Some(&ReviewState::Submitting));
        assert_eq!(
            session.begin_review(&ReviewDraft::new(5, "again")),
            Err(SessionError::ReviewInFlight)
        );

        session.apply_review(ticket, Ok(()));

        assert!(session.review_state().unwrap().is_submitted());
        assert!(!session.can_offer_review());
        let shown = session.displayed_review().unwrap();
        assert_eq!(shown.rating, 5);
        assert_eq!(shown.review, Some("Great!"));
        assert!(shown.provisional);
    }

    #[test]
    fn failed_review_is_retryable_and_keeps_tracking_data() {
        let mut session = loaded("ORD1", TrackingStatus::Delivered);
        let before = session.info().cloned();

        let ticket = session.begin_review(&ReviewDraft::new(3, "")).unwrap();
        session.apply_review(ticket, Err(ReviewError::Failed("503".to_string())));

        assert!(matches!(
            session.review_state(),
            Some(ReviewState::SubmissionFailed { message }) if !message.is_empty()
        ));
        assert_eq!(session.info().cloned(), before);
        assert!(session.can_offer_review());

        let retry = session.begin_review(&ReviewDraft::new(3, "")).unwrap();
        session.apply_review(retry, Ok(()));
        assert!(session.review_state().unwrap().is_submitted());
    }

    #[test]
    fn echo_survives_refresh_until_backend_confirms() {
        let mut session = loaded("ORD1", TrackingStatus::Delivered);
        let ticket = session.begin_review(&ReviewDraft::new(4, "Quick")).unwrap();
        session.apply_review(ticket, Ok(()));

        let refresh = session.begin_refresh().unwrap();
        session.apply_fetch(refresh, ok(info("ORD1", TrackingStatus::Delivered)));
        assert!(session.displayed_review().unwrap().provisional);

        let refresh = session.begin_refresh().unwrap();
        let mut confirmed = info("ORD1", TrackingStatus::Delivered);
        confirmed.customer_rating = Some(4);
        confirmed.customer_review = Some("Quick".to_string());
        session.apply_fetch(refresh, ok(confirmed));

        let shown = session.displayed_review().unwrap();
        assert_eq!(shown.rating, 4);
        assert!(!shown.provisional);
    }

    #[test]
    fn review_result_for_previous_code_is_dropped() {
        let mut session = loaded("ORD1", TrackingStatus::Delivered);
        let ticket = session.begin_review(&ReviewDraft::new(5, "")).unwrap();

        let track = session.begin_track("ORD1").unwrap();
        session.apply_fetch(track, ok(info("ORD1", TrackingStatus::Delivered)));

        assert_eq!(session.apply_review(ticket, Ok(())), Applied::Stale);
        assert_eq!(session.review_state(), Some(&ReviewState::NotReviewed));
    }
}
