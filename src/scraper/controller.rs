//! Pagination controller
//!
//! Drives the fetch → extract → decide loop for one feed owner. The run is
//! strictly sequential: no page is requested before the previous page's
//! extraction completes, which keeps cursor chaining correct and bounds
//! load on the mirror. Partial success is success — any failure ends the
//! run with whatever was accumulated so far.

use crate::config::{Config, PacingConfig};
use crate::ledger::Ledger;
use crate::model::Post;
use crate::scraper::extractor::extract_page;
use crate::scraper::fetcher::{build_http_client, fetch_page, FetchResult};
use crate::storage::{PageArchive, PostStore};
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::Client;
use std::time::Duration;

/// Per-run inputs
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Feed owner whose timeline is harvested
    pub username: String,

    /// Hard upper bound on pages fetched in this run
    pub max_pages: u32,

    /// Optional minimum-timestamp cutoff that halts pagination once crossed
    pub since: Option<DateTime<Utc>>,

    /// Walk the with-replies timeline instead of the default one
    pub with_replies: bool,
}

impl RunOptions {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            max_pages: 10,
            since: None,
            with_replies: false,
        }
    }
}

/// States of the pagination loop
enum Phase {
    Fetching,
    Extracting { body: String },
    Deciding { next_cursor: Option<String> },
    Done,
}

/// One harvest run over a single feed owner's timeline
///
/// Owns the HTTP client, the run-scoped ledger, and the store. The ledger
/// is seeded from the persisted collection so a re-run only discovers
/// identities it has never seen.
pub struct Harvester<S: PostStore> {
    config: Config,
    options: RunOptions,
    client: Client,
    store: S,
    archive: Option<PageArchive>,
    ledger: Ledger,
}

impl<S: PostStore> Harvester<S> {
    /// Builds a harvester seeded from the persisted collection
    ///
    /// A collection that exists but cannot be read is an error: starting
    /// empty would let a later persist overwrite it.
    pub fn new(config: Config, options: RunOptions, store: S) -> crate::Result<Self> {
        let client = build_http_client(&config.mirror)?;
        let existing = store.load()?;
        tracing::info!(
            owner = %options.username,
            existing = existing.len(),
            "seeding ledger from persisted collection"
        );

        let archive = config.output.archive_dir.as_deref().map(PageArchive::new);
        let ledger = Ledger::new(existing);

        Ok(Self {
            config,
            options,
            client,
            store,
            archive,
            ledger,
        })
    }

    /// Runs the pagination state machine to completion
    ///
    /// Returns the posts newly discovered by this run. The merged
    /// collection is persisted after every page so an interrupted run
    /// keeps everything harvested up to that point.
    pub async fn run(&mut self) -> crate::Result<Vec<Post>> {
        let mut cursor: Option<String> = None;
        let mut page: u32 = 1;
        let mut harvested: Vec<Post> = Vec::new();
        let mut phase = Phase::Fetching;

        loop {
            phase = match phase {
                Phase::Fetching => {
                    tracing::info!(
                        page,
                        cursor = cursor.as_deref().unwrap_or("-"),
                        "fetching timeline page"
                    );
                    let result = fetch_page(
                        &self.client,
                        &self.config.mirror,
                        &self.config.pacing,
                        &self.options.username,
                        cursor.as_deref(),
                        self.options.with_replies,
                    )
                    .await;

                    match result {
                        FetchResult::Success { body, .. } => {
                            if let Some(archive) = &self.archive {
                                if let Err(e) = archive.save_page(page, &body) {
                                    tracing::warn!(page, error = %e, "could not archive page");
                                }
                            }
                            Phase::Extracting { body }
                        }
                        FetchResult::HttpError { status } => {
                            tracing::warn!(page, status, "page fetch failed, ending run early");
                            Phase::Done
                        }
                        FetchResult::NetworkError { error } => {
                            tracing::warn!(page, error = %error, "network failure, ending run early");
                            Phase::Done
                        }
                    }
                }

                Phase::Extracting { body } => {
                    let extracted = extract_page(
                        &body,
                        &self.options.username,
                        self.ledger.known_ids_mut(),
                        self.options.since,
                    );
                    tracing::info!(page, new = extracted.posts.len(), "extracted page");

                    self.ledger.absorb(&extracted.posts);
                    harvested.extend(extracted.posts);
                    self.persist();

                    Phase::Deciding {
                        next_cursor: extracted.next_cursor,
                    }
                }

                Phase::Deciding { next_cursor } => match next_cursor {
                    Some(next) if page < self.options.max_pages => {
                        cursor = Some(next);
                        page += 1;
                        let delay = jittered_delay(&self.config.pacing);
                        tracing::debug!(
                            delay_ms = delay.as_millis() as u64,
                            "pausing before next page"
                        );
                        tokio::time::sleep(delay).await;
                        Phase::Fetching
                    }
                    Some(_) => {
                        tracing::info!(
                            max_pages = self.options.max_pages,
                            "page budget reached, stopping"
                        );
                        Phase::Done
                    }
                    None => {
                        tracing::info!("no continuation cursor, stopping");
                        Phase::Done
                    }
                },

                Phase::Done => break,
            };
        }

        tracing::info!(
            pages = page,
            new = harvested.len(),
            total = self.ledger.posts().len(),
            "harvest run finished"
        );
        Ok(harvested)
    }

    /// The merged collection accumulated so far
    pub fn collection(&self) -> &[Post] {
        self.ledger.posts()
    }

    /// Persists the merged collection, logging rather than aborting on
    /// failure — the run always prefers partial results over a hard stop
    fn persist(&self) {
        if let Err(e) = self.store.save(self.ledger.posts()) {
            tracing::warn!(error = %e, "could not persist collection");
        }
    }
}

/// Inter-request delay: a fixed base plus a bounded random component
fn jittered_delay(pacing: &PacingConfig) -> Duration {
    let jitter = if pacing.jitter_ms > 0 {
        rand::rng().random_range(0..pacing.jitter_ms)
    } else {
        0
    };
    Duration::from_millis(pacing.page_delay_ms + jitter)
}
