use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::models::record::{Document, OrderRecord, UserRecord};
use crate::repository::{OrderRepository, RepositoryError};

const ID_KEYS: [&str; 2] = ["$id", "id"];

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: DashMap<String, OrderRecord>,
    users: DashMap<String, UserRecord>,
}

#[derive(Deserialize)]
struct Seed {
    #[serde(default)]
    orders: Vec<Document>,
    #[serde(default)]
    users: Vec<Document>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed_file(path: &Path) -> Result<Self, RepositoryError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            RepositoryError::Decode(format!("failed to read seed {}: {err}", path.display()))
        })?;
        Self::from_seed_json(&raw)
    }

    pub fn from_seed_json(raw: &str) -> Result<Self, RepositoryError> {
        let seed: Seed = serde_json::from_str(raw)
            .map_err(|err| RepositoryError::Decode(format!("invalid seed: {err}")))?;

        let repo = Self::new();
        for order in seed.orders {
            repo.insert_order(order)?;
        }
        for user in seed.users {
            repo.insert_user(user)?;
        }

        info!(
            orders = repo.order_count(),
            users = repo.users.len(),
            "in-memory repository seeded"
        );
        Ok(repo)
    }

    pub fn insert_order(&self, order: OrderRecord) -> Result<(), RepositoryError> {
        let id = document_id(&order)?;
        self.orders.insert(id, order);
        Ok(())
    }

    pub fn insert_user(&self, user: UserRecord) -> Result<(), RepositoryError> {
        let id = document_id(&user)?;
        self.users.insert(id, user);
        Ok(())
    }

    pub fn order(&self, id: &str) -> Option<OrderRecord> {
        self.orders.get(id).map(|entry| entry.value().clone())
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

fn document_id(doc: &Document) -> Result<String, RepositoryError> {
    doc.text(&ID_KEYS)
        .map(str::to_string)
        .ok_or_else(|| RepositoryError::Decode("document has no $id or id".to_string()))
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get_order(&self, id: &str) -> Result<OrderRecord, RepositoryError> {
        self.order(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn update_order(
        &self,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<(), RepositoryError> {
        let mut order = self
            .orders
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let mut fields = order.fields().clone();
        for (key, value) in patch {
            fields.insert(key, value);
        }
        fields.insert(
            "$updatedAt".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        *order = Document::new(fields);

        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<UserRecord, RepositoryError> {
        self.users
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}
