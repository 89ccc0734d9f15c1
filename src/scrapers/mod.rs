//! Newspaper scraping: link discovery, body extraction, and orchestration.
//!
//! Every newspaper goes through the same two-phase pattern, driven by its
//! [`SourceDescriptor`](crate::registry::SourceDescriptor) instead of
//! per-site code:
//!
//! 1. **Indexing**: a category seed page is fetched and article links are
//!    resolved with the source's container and title selector chains
//! 2. **Fetching**: each link's page is fetched and its body text extracted
//!    with the source's body selector chain and generic fallbacks
//!
//! # Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetch`] | HTTP access behind the [`PageFetcher`](fetch::PageFetcher) trait, User-Agent rotation, pacing |
//! | [`links`] | Seed page → ordered, deduplicated [`ArticleLink`](crate::models::ArticleLink)s |
//! | [`content`] | Article page → body text |
//! | [`pipeline`] | Budgets, pacing, acceptance, and per-source grouping |
//!
//! Failed fetches are logged and skipped without failing the run.

pub mod content;
pub mod fetch;
pub mod links;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;
