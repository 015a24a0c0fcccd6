pub mod appwrite;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::record::{OrderRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("document {0} not found")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode backend response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RepositoryError::Decode(err.to_string())
        } else {
            RepositoryError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    async fn get_order(&self, id: &str) -> Result<OrderRecord, RepositoryError>;

    async fn update_order(&self, id: &str, patch: Map<String, Value>)
        -> Result<(), RepositoryError>;

    async fn get_user(&self, id: &str) -> Result<UserRecord, RepositoryError>;
}
