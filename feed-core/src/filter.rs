use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::post::PostRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Recent,
    Top,
}

impl FilterMode {
    pub const ALL: [FilterMode; 2] = [FilterMode::Recent, FilterMode::Top];

    /// Parses a mode name, falling back to `Recent` for anything unrecognized.
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterMode::Recent => "Recent",
            FilterMode::Top => "Top Posts",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Recent => f.write_str("recent"),
            FilterMode::Top => f.write_str("top"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown filter mode {0:?}")]
pub struct UnknownFilterMode(pub String);

impl FromStr for FilterMode {
    type Err = UnknownFilterMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(FilterMode::Recent),
            "top" => Ok(FilterMode::Top),
            _ => Err(UnknownFilterMode(s.to_owned())),
        }
    }
}

/// Orders posts for display. `Recent` keeps feed order; `Top` is a stable
/// sort by score, highest first. The input is left untouched.
pub fn filter_and_sort(posts: &[PostRecord], mode: FilterMode) -> Vec<&PostRecord> {
    let mut view: Vec<&PostRecord> = posts.iter().collect();
    if mode == FilterMode::Top {
        view.sort_by(|a, b| b.score.cmp(&a.score));
    }
    view
}
