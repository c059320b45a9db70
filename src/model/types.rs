//! Normalized entity structs shared by the store, the dispatcher and the UI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Searchable domains, in the order the palette displays them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Portfolio,
    Asset,
    Document,
    Article,
}

impl Category {
    /// Fixed display priority. Group order never depends on result counts.
    pub const PRIORITY: [Category; 4] = [
        Category::Portfolio,
        Category::Asset,
        Category::Document,
        Category::Article,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Portfolio => "Portfolios",
            Category::Asset => "Assets",
            Category::Document => "Documents",
            Category::Article => "Articles",
        }
    }

    /// Glyph drawn next to the group header and as the fallback item icon.
    pub fn icon(self) -> &'static str {
        match self {
            Category::Portfolio => "◆",
            Category::Asset => "▲",
            Category::Document => "▤",
            Category::Article => "✎",
        }
    }

    /// Stable lowercase key, used as the SQLite column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Portfolio => "portfolio",
            Category::Asset => "asset",
            Category::Document => "document",
            Category::Article => "article",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "portfolio" => Some(Category::Portfolio),
            "asset" => Some(Category::Asset),
            "document" => Some(Category::Document),
            "article" => Some(Category::Article),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque key identifying the current user/session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionIdentity(String);

impl SessionIdentity {
    /// Returns `None` for blank input so an empty flag or env var means "signed out".
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single entity surfaced by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub href: String,
    /// Symbolic icon name supplied by the backend (e.g. "briefcase").
    #[serde(default)]
    pub icon: Option<String>,
    pub category: Category,
    /// Navigation leaves the application.
    #[serde(default)]
    pub external: bool,
}

/// Raw lookup payload, one bucket per category.
///
/// Unknown buckets in a JSON payload are ignored; missing buckets are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawResults {
    pub portfolios: Vec<ResultItem>,
    pub assets: Vec<ResultItem>,
    pub documents: Vec<ResultItem>,
    pub articles: Vec<ResultItem>,
}

impl RawResults {
    pub fn bucket(&self, category: Category) -> &[ResultItem] {
        match category {
            Category::Portfolio => &self.portfolios,
            Category::Asset => &self.assets,
            Category::Document => &self.documents,
            Category::Article => &self.articles,
        }
    }

    pub fn bucket_mut(&mut self, category: Category) -> &mut Vec<ResultItem> {
        match category {
            Category::Portfolio => &mut self.portfolios,
            Category::Asset => &mut self.assets,
            Category::Document => &mut self.documents,
            Category::Article => &mut self.articles,
        }
    }

    pub fn total(&self) -> usize {
        Category::PRIORITY
            .iter()
            .map(|c| self.bucket(*c).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
