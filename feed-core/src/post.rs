use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the fetched feed. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub body_text: String,
    pub score: i64,
    pub external_url: String,
    pub author: Option<String>,
    pub num_comments: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub permalink: Option<String>,
}

// Wire shape: { data: { children: [ { data: { .. } } ] } }
#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    pub children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingChild {
    pub data: RawPost,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub score: i64,
    pub url: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub permalink: Option<String>,
}

impl PostRecord {
    pub(crate) fn from_raw(raw: RawPost) -> Self {
        let created_at = raw
            .created_utc
            .filter(|secs| secs.is_finite())
            .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single());

        Self {
            id: raw.id,
            title: raw.title,
            body_text: raw.selftext,
            score: raw.score,
            external_url: raw.url,
            author: raw.author.filter(|a| !a.is_empty()),
            num_comments: raw.num_comments,
            created_at,
            permalink: raw.permalink.filter(|p| !p.is_empty()),
        }
    }

    /// Absolute link to the discussion page, when the feed exposed one.
    pub fn discussion_url(&self, base: &str) -> Option<String> {
        let permalink = self.permalink.as_deref()?;
        if permalink.starts_with("http://") || permalink.starts_with("https://") {
            return Some(permalink.to_owned());
        }
        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            permalink.trim_start_matches('/')
        ))
    }
}
