use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One published version of a package
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VersionInfo {
    pub version: String,
    pub description: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    pub uploader: Option<String>,
    pub published: DateTime<Utc>,
}

/// Package metadata with every known version, newest first
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PackageInfo {
    pub name: String,
    pub latest: VersionInfo,
    pub versions: Vec<VersionInfo>,
    pub publisher_id: Option<String>,
    pub is_discontinued: bool,
    pub likes: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PackageSummary {
    pub name: String,
    pub latest_version: String,
}

/// A page of the package listing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PackageListing {
    pub packages: Vec<PackageSummary>,
    pub next_page: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PackageNames {
    pub packages: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportInfo {
    pub package: String,
    pub version: String,
    pub granted_points: u32,
    pub max_points: u32,
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LikeResponse {
    pub package: String,
    pub likes: u32,
}

/// The authenticated caller
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
}

/// Query string accepted by both the search service and the frontend
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const MAX_LIMIT: usize = 100;

    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Default::default()
        }
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Whitespace separated, lowercased query terms
    pub fn terms(&self) -> Vec<String> {
        self.q
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PackageHit {
    pub package: String,
    pub score: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub total_count: usize,
    pub packages: Vec<PackageHit>,
}

impl SearchResults {
    pub fn names(&self) -> Vec<&str> {
        self.packages
            .iter()
            .map(|hit| hit.package.as_str())
            .collect()
    }
}
