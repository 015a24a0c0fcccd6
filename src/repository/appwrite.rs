use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::config::RepositoryConfig;
use crate::models::record::{Document, OrderRecord, UserRecord};
use crate::repository::{OrderRepository, RepositoryError};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const API_KEY_HEADER: &str = "X-Appwrite-Key";

pub struct AppwriteRepository {
    client: Client,
    base_url: Url,
    config: RepositoryConfig,
}

impl AppwriteRepository {
    pub fn new(config: RepositoryConfig, timeout: Duration) -> Result<Self, RepositoryError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent("shipment-tracker/0.1")
            .build()?;

        let base_url = Url::parse(config.endpoint.trim_end_matches('/')).map_err(|err| {
            RepositoryError::Transport(format!("invalid endpoint '{}': {err}", config.endpoint))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RepositoryError::Transport(format!(
                "endpoint '{}' cannot carry a path",
                config.endpoint
            )));
        }

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<Url, RepositoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RepositoryError::Transport("endpoint cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend([
                "databases",
                self.config.database_id.as_str(),
                "collections",
                collection,
                "documents",
                id,
            ]);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header(PROJECT_HEADER, &self.config.project_id);
        match &self.config.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn fetch_document(&self, collection: &str, id: &str) -> Result<Document, RepositoryError> {
        let url = self.document_url(collection, id)?;
        debug!(%url, "fetching document");

        let response = self.authorize(self.client.get(url)).send().await?;
        let response = check_status(response, id).await?;
        let body: Value = response.json().await?;

        Document::from_value(body)
            .ok_or_else(|| RepositoryError::Decode(format!("document {id} is not an object")))
    }
}

async fn check_status(response: Response, id: &str) -> Result<Response, RepositoryError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(RepositoryError::NotFound(id.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RepositoryError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

#[async_trait]
impl OrderRepository for AppwriteRepository {
    fn backend_tag(&self) -> &'static str {
        "appwrite"
    }

    async fn get_order(&self, id: &str) -> Result<OrderRecord, RepositoryError> {
        self.fetch_document(&self.config.collections.orders, id)
            .await
    }

    async fn update_order(
        &self,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<(), RepositoryError> {
        let url = self.document_url(&self.config.collections.orders, id)?;
        debug!(%url, "patching document");

        let response = self
            .authorize(self.client.patch(url))
            .json(&json!({ "data": patch }))
            .send()
            .await?;
        check_status(response, id).await?;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<UserRecord, RepositoryError> {
        self.fetch_document(&self.config.collections.users, id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::AppwriteRepository;
    use crate::config::{Collections, RepositoryConfig};

    fn repo(endpoint: &str) -> AppwriteRepository {
        AppwriteRepository::new(
            RepositoryConfig {
                endpoint: endpoint.to_string(),
                project_id: "proj".to_string(),
                api_key: None,
                database_id: "orchestr8-db".to_string(),
                collections: Collections {
                    users: "users".to_string(),
                    orders: "orders".to_string(),
                },
            },
            Duration::from_secs(5),
        )
        .expect("adapter construction should not fail")
    }

    #[test]
    fn document_url_appends_segments_to_endpoint_path() {
        let url = repo("https://cloud.example.com/v1/")
            .document_url("orders", "ORD123")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.example.com/v1/databases/orchestr8-db/collections/orders/documents/ORD123"
        );
    }

    #[test]
    fn document_url_encodes_ids() {
        let url = repo("https://cloud.example.com/v1")
            .document_url("orders", "a b/c")
            .unwrap();
        assert!(url.as_str().ends_with("/documents/a%20b%2Fc"), "{url}");
    }
}
