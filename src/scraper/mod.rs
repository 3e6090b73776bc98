//! Scraping engine: fetch, extract, paginate
//!
//! This module contains the core harvesting logic:
//! - HTTP fetching with rate-limit cooldown and bounded retry
//! - Record extraction from timeline markup
//! - The pagination state machine that ties them together

mod controller;
mod extractor;
mod fetcher;

pub use controller::{Harvester, RunOptions};
pub use extractor::{extract_page, ExtractedPage};
pub use fetcher::{build_http_client, fetch_page, FetchResult};

use crate::config::Config;
use crate::model::Post;
use crate::storage::JsonStore;

/// Runs a complete harvest against the configured JSON collection
///
/// This is the main entry point for one run: it opens the collection
/// store, seeds the ledger from it, walks the timeline, and returns the
/// posts newly discovered by this run.
pub async fn harvest(config: Config, options: RunOptions) -> crate::Result<Vec<Post>> {
    let store = JsonStore::new(&config.output.collection_path);
    let mut harvester = Harvester::new(config, options, store)?;
    harvester.run().await
}
