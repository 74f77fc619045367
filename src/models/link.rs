use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored mapping from short identifier to target URL plus usage counters.
///
/// `short_id` and `original_url` are immutable after creation; only
/// `clicks` and `last_accessed` change, and only through visits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShortLink {
    pub id: i64,
    pub short_id: String,
    pub original_url: String,
    /// Unix seconds, set once at creation.
    pub created_at: i64,
    pub clicks: i64,
    /// Unix seconds of the most recent visit; `None` until the first one.
    pub last_accessed: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub original_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub original_url: String,
    pub short_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub clicks: i64,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<i64>,
}
