//! Data models for scraped articles and their clustered representations.
//!
//! This module defines the core data structures shared by the ingestion and
//! clustering halves of the application:
//! - [`Category`]: The fixed set of newspaper sections we scrape
//! - [`ArticleLink`]: A candidate article discovered on a seed page
//! - [`Article`]: An accepted article with extracted body text
//! - [`ExportableArticle`]: An article after clustering, carrying its cluster
//!   id and the cluster's keywords
//!
//! An article moves through `Discovered → Fetched → Accepted | Rejected`
//! during ingestion. [`Article::accept`] is the only way to build an
//! [`Article`] from a link, so every `Article` in the program satisfies the
//! minimum content length.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date format used in every export (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Newspaper section an article was scraped from.
///
/// Declaration order is the order categories are scraped in and the order
/// they appear in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Business,
    Politics,
    #[serde(rename = "Arts/Culture/Celebrities")]
    ArtsCultureCelebrities,
    Sports,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Business,
        Category::Politics,
        Category::ArtsCultureCelebrities,
        Category::Sports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "Business",
            Category::Politics => "Politics",
            Category::ArtsCultureCelebrities => "Arts/Culture/Celebrities",
            Category::Sports => "Sports",
        }
    }

    /// URL path fragments that mark a link as belonging to this section.
    pub fn path_fragments(&self) -> &'static [&'static str] {
        match self {
            Category::Business => &["/business/"],
            Category::Politics => &["/politics/"],
            Category::ArtsCultureCelebrities => &["/entertainment/", "/arts/", "/culture/"],
            Category::Sports => &["/sport/", "/sports/"],
        }
    }

    /// Lenient match used when importing hand-edited files.
    ///
    /// Accepts any casing of the canonical name plus the slug aliases that
    /// appear in newspaper URLs (`sport`, `entertainment`, ...).
    pub fn parse_lenient(s: &str) -> Option<Category> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == needle)
            .or(match needle.as_str() {
                "business" => Some(Category::Business),
                "politics" => Some(Category::Politics),
                "arts" | "culture" | "celebrities" | "entertainment" => {
                    Some(Category::ArtsCultureCelebrities)
                }
                "sport" | "sports" => Some(Category::Sports),
                _ => None,
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not an exact category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A candidate article found on a seed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLink {
    /// Absolute URL of the article.
    pub url: String,
    /// Headline text as it appeared on the seed page.
    pub title: String,
}

/// An article whose body text passed the minimum length check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Display name of the newspaper.
    pub newspaper: String,
    pub category: Category,
    pub title: String,
    pub url: String,
    /// Extracted body text.
    pub content: String,
    /// Date the article was captured.
    pub date_scraped: NaiveDate,
}

/// A fetched link whose content was too short to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub link: ArticleLink,
    pub content_chars: usize,
}

impl Article {
    /// Minimum body length, in characters, for an article to be kept.
    pub const MIN_CONTENT_CHARS: usize = 50;

    /// Turn a fetched link into an [`Article`], or reject it when the content
    /// is shorter than `min_chars` characters.
    pub fn accept(
        newspaper: &str,
        category: Category,
        link: ArticleLink,
        content: String,
        date_scraped: NaiveDate,
        min_chars: usize,
    ) -> Result<Article, Rejection> {
        let content_chars = content.chars().count();
        if content_chars < min_chars.max(Self::MIN_CONTENT_CHARS) {
            return Err(Rejection {
                link,
                content_chars,
            });
        }
        Ok(Article {
            newspaper: newspaper.to_string(),
            category,
            title: link.title,
            url: link.url,
            content,
            date_scraped,
        })
    }

    pub fn date_string(&self) -> String {
        self.date_scraped.format(DATE_FORMAT).to_string()
    }
}

/// An article after clustering: its cluster id and that cluster's keywords.
///
/// This is the record shape the display layer reads from the cluster export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportableArticle {
    pub title: String,
    pub url: String,
    pub newspaper: String,
    pub category: Category,
    pub date_scraped: String,
    pub cluster_keywords: Vec<String>,
    #[serde(skip)]
    pub cluster: usize,
}
