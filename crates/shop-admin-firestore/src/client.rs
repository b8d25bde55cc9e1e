use std::sync::{PoisonError, RwLock};

use reqwest::{Method, StatusCode, Url};
use tracing::debug;

use shop_admin::{Direction, Document, DocumentStore, StoreError, StoredDocument};

use crate::value::{decode_fields, encode_fields};
use crate::wire::{
    CollectionSelector, FieldReference, FirestoreDocument, ListResponse, Order, RunQueryItem,
    RunQueryRequest, StructuredQuery, WriteBody, error_message,
};

pub const DEFAULT_DATABASE: &str = "(default)";
const PAGE_SIZE: &str = "300";

/// Which Firestore database to talk to.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_owned(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Document store over the Firestore REST API.
pub struct FirestoreStore {
    config: FirestoreConfig,
    client: reqwest::Client,
    id_token: RwLock<Option<String>>,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            id_token: RwLock::new(None),
        }
    }

    /// Send requests as a signed-in operator, or anonymously with `None`.
    pub fn set_id_token(&self, token: Option<String>) {
        *self
            .id_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn base(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or("https://firestore.googleapis.com/v1")
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.base(),
            self.config.project_id,
            self.config.database
        )
    }

    /// `{root}{suffix}` with the given query pairs and the API key.
    fn url(&self, suffix: &str, query: &[(&str, &str)]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&format!("{}{suffix}", self.documents_root()))
            .map_err(|e| StoreError::Remote(format!("bad store URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
            if let Some(key) = &self.config.api_key {
                pairs.append_pair("key", key);
            }
        }
        // An empty `?` is left behind when nothing was appended.
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    fn build_request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let req = self.client.request(method, url);
        match &*self.id_token.read().unwrap_or_else(PoisonError::into_inner) {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        req.send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))
    }

    fn stored(doc: FirestoreDocument) -> Result<StoredDocument, StoreError> {
        let fields = decode_fields(&doc.fields).map_err(StoreError::Decode)?;
        Ok(StoredDocument::new(doc.id(), fields))
    }
}

async fn failure(response: reqwest::Response, collection: &str, id: &str) -> StoreError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return StoreError::not_found(collection, id);
    }
    let message = error_message(response).await;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
        _ => StoreError::Remote(message),
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE)];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.as_str()));
            }
            let url = self.url(&format!("/{collection}"), &query)?;
            let response = self.send(self.build_request(Method::GET, url)).await?;
            if !response.status().is_success() {
                return Err(failure(response, collection, "").await);
            }

            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            debug!(collection, count = page.documents.len(), "listed page");

            for doc in page.documents {
                docs.push(Self::stored(doc)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.url(&format!("/{collection}/{id}"), &[])?;
        let response = self.send(self.build_request(Method::GET, url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(failure(response, collection, id).await);
        }

        let doc: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        debug!(collection, id, "fetched document");
        Ok(Some(Self::stored(doc)?.fields))
    }

    async fn set(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        let url = self.url(&format!("/{collection}/{id}"), &[])?;
        let body = WriteBody {
            fields: encode_fields(&fields),
        };
        let response = self
            .send(self.build_request(Method::PATCH, url).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(failure(response, collection, id).await);
        }
        debug!(collection, id, "document written");
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let mut query: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));
        let url = self.url(&format!("/{collection}/{id}"), &query)?;

        let body = WriteBody {
            fields: encode_fields(&fields),
        };
        let response = self
            .send(self.build_request(Method::PATCH, url).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(failure(response, collection, id).await);
        }
        debug!(collection, id, fields = fields.len(), "document updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.url(&format!("/{collection}/{id}"), &[])?;
        let response = self.send(self.build_request(Method::DELETE, url)).await?;
        if !response.status().is_success() {
            return Err(failure(response, collection, id).await);
        }
        debug!(collection, id, "document deleted");
        Ok(())
    }

    async fn query_ordered(
        &self,
        collection: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let url = self.url(":runQuery", &[])?;
        let body = RunQueryRequest {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection.to_owned(),
                }],
                order_by: vec![Order {
                    field: FieldReference {
                        field_path: order_by.to_owned(),
                    },
                    direction: match direction {
                        Direction::Ascending => "ASCENDING",
                        Direction::Descending => "DESCENDING",
                    },
                }],
            },
        };

        let response = self
            .send(self.build_request(Method::POST, url).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(failure(response, collection, "").await);
        }

        let items: Vec<RunQueryItem> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let docs = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(Self::stored)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(collection, order_by, count = docs.len(), "query returned");
        Ok(docs)
    }
}
