use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RequestError;

/// A normalized news item, immutable for the fetch cycle that produced it.
///
/// Field names on the wire follow the public API (`title_en`, `desc_cn`, ...);
/// the Rust names describe the role of each field instead of its locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    #[serde(rename = "title_en")]
    pub title_original: String,
    #[serde(rename = "title_cn")]
    pub title_translated: String,
    #[serde(rename = "desc_en")]
    pub summary_original: String,
    #[serde(rename = "desc_cn")]
    pub summary_translated: String,
    /// Serialized as `YYYY-MM-DD`
    #[serde(rename = "date")]
    pub published_at: NaiveDate,
    #[serde(rename = "views")]
    pub popularity: u32,
    #[serde(rename = "link")]
    pub source_link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest `published_at` first
    #[default]
    Latest,
    /// Highest `popularity` first
    Hottest,
}

impl FromStr for SortOrder {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(SortOrder::Latest),
            "hottest" => Ok(SortOrder::Hottest),
            other => Err(RequestError::InvalidSort(other.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Latest => f.write_str("latest"),
            SortOrder::Hottest => f.write_str("hottest"),
        }
    }
}

/// Continuation metadata for one page of a sorted article set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

/// One page of articles as returned by `GET /api/news/<topic>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub articles: Vec<Article>,
    pub meta: PageMeta,
}
