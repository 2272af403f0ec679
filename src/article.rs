use serde::{Deserialize, Serialize};

/// A newly found announcement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    pub site_id: String,
    pub title: String,
    /// Publication date as shown on the listing.
    pub date: String,
    pub url: String,
    pub keywords: Vec<String>,
}

/// Cleans a title read from a listing row so it can serve as the dedup key.
pub fn normalize_title(raw: &str) -> String {
    raw.trim().replace(['\n', '\r'], "")
}
