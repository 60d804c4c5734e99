//! Fan vote tallies from the hosted document store.
//!
//! Each match has (at most) one document keyed by its id. The store hands it
//! back either as a plain `{home, draw, away}` object or in the Firestore REST
//! envelope, where every field is typed: `{"fields": {"home": {"integerValue": "3"}}}`.
//! A missing document is not an error; it is the zero tally.

use crate::client::{ApiResult, endpoint, get_json_or_default, http_client};
use crate::{MatchId, VoteTally};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_VOTES_URL: &str = "http://127.0.0.1:8080/v1/documents";
pub const DEFAULT_COLLECTION: &str = "votes";

#[derive(Debug, Clone)]
pub struct VoteStore {
    client: Client,
    base_url: String,
    collection: String,
    timeout: Duration,
}

impl Default for VoteStore {
    fn default() -> Self {
        Self::new(DEFAULT_VOTES_URL, DEFAULT_COLLECTION)
    }
}

impl VoteStore {
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            collection: collection.into().trim_matches('/').to_owned(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Look up the tally document for one match.
    pub async fn fetch_tally(&self, match_id: &MatchId) -> ApiResult<VoteTally> {
        let mut segments: Vec<&str> = self.collection.split('/').filter(|s| !s.is_empty()).collect();
        segments.push(match_id.as_str());
        let url = endpoint(&self.base_url, &segments)?;
        let request = self.client.get(url.clone()).timeout(self.timeout);
        let raw: Value = get_json_or_default(request, url.as_str()).await?;
        Ok(tally_from_document(&raw))
    }
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirestoreValue {
    integer_value: Option<String>,
    double_value: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct PlainDocument {
    home: Option<Value>,
    draw: Option<Value>,
    away: Option<Value>,
}

/// Read a tally out of either document shape. Anything missing, negative or
/// unreadable counts as zero.
pub fn tally_from_document(raw: &Value) -> VoteTally {
    if raw.get("fields").is_some() {
        let Ok(doc) = FirestoreDocument::deserialize(raw) else {
            return VoteTally::default();
        };
        let field = |name: &str| doc.fields.get(name).map(firestore_count).unwrap_or(0);
        return VoteTally { home: field("home"), draw: field("draw"), away: field("away") };
    }

    let doc = PlainDocument::deserialize(raw).unwrap_or_default();
    let field = |v: &Option<Value>| v.as_ref().map(json_count).unwrap_or(0);
    VoteTally { home: field(&doc.home), draw: field(&doc.draw), away: field(&doc.away) }
}

fn firestore_count(value: &FirestoreValue) -> u32 {
    if let Some(n) = value.integer_value.as_deref().and_then(|s| s.parse::<i64>().ok()) {
        return clamp_count(n as f64);
    }
    value.double_value.map(clamp_count).unwrap_or(0)
}

fn json_count(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n.as_f64().map(clamp_count).unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(clamp_count).unwrap_or(0),
        _ => 0,
    }
}

fn clamp_count(n: f64) -> u32 {
    if n.is_finite() && n > 0.0 { n.min(u32::MAX as f64) as u32 } else { 0 }
}
