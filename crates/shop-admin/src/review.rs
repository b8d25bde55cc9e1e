use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::Document;

/// Store-generated review identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(String);

impl ReviewId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A customer review. Read-mostly: the console only lists and deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(deserialize_with = "review_date")]
    pub date: DateTime<Utc>,
    pub rating: u8,
    #[serde(default)]
    pub text: Option<String>,
}

impl Review {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    pub fn from_document(doc_id: &str, mut doc: Document) -> Result<Self, String> {
        doc.insert("id".into(), serde_json::Value::from(doc_id));
        let review: Review = serde_json::from_value(serde_json::Value::Object(doc))
            .map_err(|e| format!("review {doc_id}: {e}"))?;

        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&review.rating) {
            return Err(format!(
                "review {doc_id}: rating {} outside 1-5",
                review.rating
            ));
        }

        Ok(review)
    }

    /// Display name, falling back for anonymous reviews.
    pub fn author(&self) -> &str {
        self.user_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Anonymous")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Millis(i64),
    Text(String),
}

/// Review dates arrive as RFC 3339 strings (store timestamps) or epoch millis.
fn review_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    match RawDate::deserialize(deserializer)? {
        RawDate::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {ms}"))),
        RawDate::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| D::Error::custom(format!("invalid date {s:?}: {e}"))),
    }
}
