use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error envelope shared by Google REST APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

/// The `message` from an error body, or the status reason.
pub(crate) async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorEnvelope>().await {
        Ok(env) if !env.error.message.is_empty() => env.error.message,
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_owned(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FirestoreDocument {
    /// Full resource name ending in `/{collection}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl FirestoreDocument {
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub documents: Vec<FirestoreDocument>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WriteBody {
    pub fields: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    pub order_by: Vec<Order>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionSelector {
    pub collection_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Order {
    pub field: FieldReference,
    pub direction: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FieldReference {
    pub field_path: String,
}

/// One element of the `:runQuery` response stream. Elements carrying only
/// a read time mark the end of results.
#[derive(Debug, Deserialize)]
pub(crate) struct RunQueryItem {
    pub document: Option<FirestoreDocument>,
}
