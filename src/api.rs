use std::collections::HashMap;

use anyhow::Result;
use serde::Deserialize;

/// Query-string tail of the metadata endpoint; the page ID is appended.
const API_QUERY: &str =
    "/w/api.php?format=json&action=query&prop=revisions&rvlimit=100&rvprop=ids&pageids=";

const RAW_PATH: &str = "/w/index.php";

/// Envelope of the query API: `{"query": {"pages": {"<id>": {...}}}}`.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub query: Option<Query>,
}

#[derive(Debug, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub pages: HashMap<String, PageEntry>,
}

/// One entry under `query.pages`, keyed by the stringified page ID.
#[derive(Debug, Deserialize)]
pub struct PageEntry {
    pub title: Option<String>,
    #[serde(default)]
    pub revisions: Vec<serde_json::Value>,
    /// Presence marker: the API emits `"missing": ""` for absent pages.
    pub missing: Option<serde_json::Value>,
}

impl PageEntry {
    pub fn is_missing(&self) -> bool {
        self.missing.is_some()
    }
}

pub fn metadata_url(base_url: &str, page_id: u64) -> String {
    format!("{}{}{}", base_url.trim_end_matches('/'), API_QUERY, page_id)
}

/// Base of the raw-content endpoint; `title` and `action=raw` go in as
/// query parameters so the client encodes them.
pub fn raw_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), RAW_PATH)
}

/// Parse the JSON envelope and pull out the entry for `page_id`, if any.
pub fn parse_page_entry(body: &str, page_id: u64) -> Result<Option<PageEntry>> {
    let response: QueryResponse = serde_json::from_str(body)?;
    Ok(response
        .query
        .map(|q| q.pages)
        .unwrap_or_default()
        .remove(&page_id.to_string()))
}

/// Replace path separators so the title can double as a filename component.
pub fn sanitize_title(title: &str) -> String {
    title.replace('/', "_")
}
