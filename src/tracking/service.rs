use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::tracking::{TrackingError, TrackingInfo, TrackingResult};
use crate::observability::metrics::Metrics;
use crate::repository::{OrderRepository, RepositoryError};
use crate::tracking::enrich::enrich_rider;
use crate::tracking::normalize::{NormalizeError, normalize};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("order {0} not found")]
    NotFound(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid order record: {0}")]
    InvalidRecord(#[from] NormalizeError),
}

impl TrackError {
    pub fn to_tracking_error(&self) -> TrackingError {
        match self {
            TrackError::NotFound(_) => TrackingError::not_found(),
            TrackError::Connection(_) => TrackingError::connection(),
            TrackError::InvalidRecord(_) => TrackingError::invalid_record(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("order {0} not found")]
    NotFound(String),

    #[error("review submission failed: {0}")]
    Failed(String),
}

impl ReviewError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ReviewError::InvalidRating(_) => "Please choose a rating from 1 to 5 stars.",
            ReviewError::NotFound(_) => "We could not find this order to attach your review.",
            ReviewError::Failed(_) => "Failed to submit review. Please try again.",
        }
    }
}

#[derive(Clone)]
pub struct TrackingService {
    repo: Arc<dyn OrderRepository>,
    timeout: Duration,
    metrics: Option<Metrics>,
}

impl TrackingService {
    pub fn new(repo: Arc<dyn OrderRepository>, timeout: Duration) -> Self {
        Self {
            repo,
            timeout,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn backend_tag(&self) -> &'static str {
        self.repo.backend_tag()
    }

    pub async fn fetch(&self, code: &str) -> Result<TrackingInfo, TrackError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TrackError::NotFound(String::new()));
        }

        let record = match tokio::time::timeout(self.timeout, self.repo.get_order(code)).await {
            Ok(Ok(record)) => record,
            Ok(Err(RepositoryError::NotFound(_))) => {
                info!(order_id = code, "order not found");
                return Err(TrackError::NotFound(code.to_string()));
            }
            Ok(Err(err)) => {
                warn!(order_id = code, error = %err, "order fetch failed");
                return Err(TrackError::Connection(err.to_string()));
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(order_id = code, timeout_ms, "order fetch timed out");
                return Err(TrackError::Connection("request timed out".to_string()));
            }
        };

        let normalized = normalize(&record).inspect_err(|err| {
            warn!(order_id = code, error = %err, "order record could not be normalized");
        })?;

        let enriched = enrich_rider(self.repo.as_ref(), normalized, self.timeout).await;
        if enriched.failure.is_some() {
            if let Some(metrics) = &self.metrics {
                metrics.rider_enrichment_failures_total.inc();
            }
        }

        info!(
            order_id = %enriched.info.tracking_id,
            status = ?enriched.info.status,
            has_rider = enriched.info.rider.is_some(),
            "order tracked"
        );
        Ok(enriched.info)
    }

    pub async fn track(&self, code: &str) -> TrackingResult {
        self.fetch(code)
            .await
            .map_err(|err| err.to_tracking_error())
            .into()
    }

    pub async fn submit_review(
        &self,
        code: &str,
        rating: u8,
        review: Option<&str>,
    ) -> Result<(), ReviewError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ReviewError::InvalidRating(rating));
        }
        let code = code.trim();
        if code.is_empty() {
            return Err(ReviewError::NotFound(String::new()));
        }

        let mut patch = Map::new();
        patch.insert("customerRating".to_string(), json!(rating));
        if let Some(text) = review.map(str::trim).filter(|text| !text.is_empty()) {
            patch.insert("customerReview".to_string(), Value::String(text.to_string()));
        }

        match tokio::time::timeout(self.timeout, self.repo.update_order(code, patch)).await {
            Ok(Ok(())) => {
                info!(order_id = code, rating, "review submitted");
                Ok(())
            }
            Ok(Err(RepositoryError::NotFound(_))) => Err(ReviewError::NotFound(code.to_string())),
            Ok(Err(err)) => {
                warn!(order_id = code, error = %err, "review submission failed");
                Err(ReviewError::Failed(err.to_string()))
            }
            Err(_) => {
                warn!(order_id = code, "review submission timed out");
                Err(ReviewError::Failed("request timed out".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Map, Value, json};

    use super::{ReviewError, TrackError, TrackingService};
    use crate::models::record::{Document, OrderRecord, UserRecord};
    use crate::models::status::TrackingStatus;
    use crate::models::tracking::{NOT_FOUND_CODE, TrackingResult};
    use crate::observability::metrics::Metrics;
    use crate::repository::memory::InMemoryOrderRepository;
    use crate::repository::{OrderRepository, RepositoryError};

    struct SlowRepository;

    #[async_trait]
    impl OrderRepository for SlowRepository {
        fn backend_tag(&self) -> &'static str {
            "slow"
        }

        async fn get_order(&self, _id: &str) -> Result<OrderRecord, RepositoryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(RepositoryError::Transport("unreachable".to_string()))
        }

        async fn update_order(
            &self,
            _id: &str,
            _patch: Map<String, Value>,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        async fn get_user(&self, id: &str) -> Result<UserRecord, RepositoryError> {
            Err(RepositoryError::NotFound(id.to_string()))
        }
    }

    struct SlowRiders(InMemoryOrderRepository);

    #[async_trait]
    impl OrderRepository for SlowRiders {
        fn backend_tag(&self) -> &'static str {
            "slow-riders"
        }

        async fn get_order(&self, id: &str) -> Result<OrderRecord, RepositoryError> {
            self.0.get_order(id).await
        }

        async fn update_order(
            &self,
            id: &str,
            patch: Map<String, Value>,
        ) -> Result<(), RepositoryError> {
            self.0.update_order(id, patch).await
        }

        async fn get_user(&self, _id: &str) -> Result<UserRecord, RepositoryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(RepositoryError::Transport("unreachable".to_string()))
        }
    }

    fn seeded() -> (Arc<InMemoryOrderRepository>, TrackingService) {
        let repo = Arc::new(InMemoryOrderRepository::new());
        repo.insert_order(
            Document::from_value(json!({
                "$id": "ORD123",
                "status": "in-transit",
                "pickup": "Warehouse 4",
                "dropoff": "221B Baker St",
                "riderId": "R1",
            }))
            .unwrap(),
        )
        .unwrap();
        repo.insert_user(
            Document::from_value(json!({ "$id": "R1", "firstName": "Kofi", "lastName": "Mensah" }))
                .unwrap(),
        )
        .unwrap();
        let service = TrackingService::new(repo.clone(), Duration::from_secs(1));
        (repo, service)
    }

    #[tokio::test]
    async fn fetch_resolves_rider_for_in_transit_order() {
        let (_repo, service) = seeded();

        let info = service.fetch("  ORD123 ").await.unwrap();

        assert_eq!(info.status, TrackingStatus::InTransit);
        assert_eq!(info.rider.unwrap().name, "Kofi Mensah");
    }

    #[tokio::test]
    async fn unknown_code_yields_not_found_error_only() {
        let (_repo, service) = seeded();

        match service.track("ORD999").await {
            TrackingResult::Error(err) => {
                assert_eq!(err.error, NOT_FOUND_CODE);
                assert!(!err.message.is_empty());
            }
            TrackingResult::Info(info) => panic!("unexpected info: {info:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out_as_connection_error() {
        let service = TrackingService::new(Arc::new(SlowRepository), Duration::from_millis(50));

        let err = service.fetch("ORD1").await.unwrap_err();

        assert!(matches!(err, TrackError::Connection(_)));
        assert_eq!(err.to_tracking_error().error, "Connection error");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_rider_lookup_tracks_without_rider_and_counts_failure() {
        let (repo, _service) = seeded();
        let order = repo.order("ORD123").unwrap();
        let slow = SlowRiders(InMemoryOrderRepository::new());
        slow.0.insert_order(order).unwrap();

        let metrics = Metrics::new();
        let service = TrackingService::new(Arc::new(slow), Duration::from_millis(50))
            .with_metrics(metrics.clone());

        let info = service.fetch("ORD123").await.unwrap();

        assert_eq!(info.status, TrackingStatus::InTransit);
        assert!(info.rider.is_none());
        assert_eq!(metrics.rider_enrichment_failures_total.get(), 1);
    }

    #[tokio::test]
    async fn review_rating_is_validated_before_write() {
        let (_repo, service) = seeded();

        assert_eq!(
            service.submit_review("ORD123", 0, None).await,
            Err(ReviewError::InvalidRating(0))
        );
        assert_eq!(
            service.submit_review("ORD123", 6, None).await,
            Err(ReviewError::InvalidRating(6))
        );
    }

    #[tokio::test]
    async fn review_writes_rating_and_trimmed_text() {
        let (repo, service) = seeded();

        service
            .submit_review("ORD123", 5, Some("  Great!  "))
            .await
            .unwrap();
        service.submit_review("ORD123", 5, Some("Great!")).await.unwrap();

        let order = repo.order("ORD123").unwrap();
        assert_eq!(order.number(&["customerRating"]), Some(5.0));
        assert_eq!(order.text(&["customerReview"]), Some("Great!"));
    }

    #[tokio::test]
    async fn review_backend_failure_is_retryable_failure() {
        let service = TrackingService::new(Arc::new(SlowRepository), Duration::from_secs(1));

        let err = service.submit_review("ORD1", 4, None).await.unwrap_err();

        assert!(matches!(err, ReviewError::Failed(_)));
    }
}
