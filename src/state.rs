use std::sync::Arc;

use crate::config::{Backend, Config};
use crate::error::AppError;
use crate::observability::metrics::Metrics;
use crate::repository::OrderRepository;
use crate::repository::appwrite::AppwriteRepository;
use crate::repository::memory::InMemoryOrderRepository;
use crate::tracking::service::TrackingService;

pub struct AppState {
    pub service: TrackingService,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(repo: Arc<dyn OrderRepository>, config: &Config) -> Self {
        let metrics = Metrics::new();
        let service =
            TrackingService::new(repo, config.request_timeout).with_metrics(metrics.clone());

        Self { service, metrics }
    }

    pub fn repository(config: &Config) -> Result<Arc<dyn OrderRepository>, AppError> {
        let repo: Arc<dyn OrderRepository> = match config.backend {
            Backend::Appwrite => Arc::new(
                AppwriteRepository::new(config.repository.clone(), config.request_timeout)
                    .map_err(|err| AppError::Internal(format!("appwrite adapter: {err}")))?,
            ),
            Backend::Memory => match &config.memory_seed_path {
                Some(path) => Arc::new(
                    InMemoryOrderRepository::from_seed_file(path)
                        .map_err(|err| AppError::Internal(format!("memory seed: {err}")))?,
                ),
                None => Arc::new(InMemoryOrderRepository::new()),
            },
        };
        Ok(repo)
    }
}
