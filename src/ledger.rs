//! Dedup/merge ledger for the persisted collection
//!
//! The ledger owns two things: the set of identities already present in the
//! destination collection (consulted by the extractor to suppress known
//! posts) and the merge policy that folds newly harvested posts into the
//! ordered collection.
//!
//! Merging is an identity-based upsert: two posts with the same id are the
//! same logical post and the incoming one wins. The merged collection is
//! totally ordered — timestamp descending, posts without a timestamp last,
//! reverse-lexicographic id as the tie-breaker — so output is deterministic
//! even with partial timestamp data.

use crate::model::Post;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Merges incoming posts into an existing collection
///
/// Upserts by identity, then re-sorts. Idempotent: merging the same incoming
/// set twice produces the same collection as merging it once.
pub fn merge(existing: Vec<Post>, incoming: &[Post]) -> Vec<Post> {
    let mut by_id: HashMap<String, Post> =
        HashMap::with_capacity(existing.len() + incoming.len());
    for post in existing {
        by_id.insert(post.id.clone(), post);
    }
    for post in incoming {
        by_id.insert(post.id.clone(), post.clone());
    }

    let mut merged: Vec<Post> = by_id.into_values().collect();
    sort_posts(&mut merged);
    merged
}

/// Sorts a collection into its canonical order
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| b.id.cmp(&a.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.id.cmp(&a.id),
    });
}

/// Run-scoped ledger: known identities plus the merged collection
pub struct Ledger {
    posts: Vec<Post>,
    known_ids: HashSet<String>,
}

impl Ledger {
    /// Creates a ledger seeded from the previously persisted collection
    pub fn new(existing: Vec<Post>) -> Self {
        let known_ids = existing.iter().map(|p| p.id.clone()).collect();
        Self {
            posts: existing,
            known_ids,
        }
    }

    /// The known-identity set, handed to the extractor for each page
    pub fn known_ids_mut(&mut self) -> &mut HashSet<String> {
        &mut self.known_ids
    }

    /// Number of identities currently known
    pub fn known_count(&self) -> usize {
        self.known_ids.len()
    }

    /// Folds newly harvested posts into the collection
    pub fn absorb(&mut self, incoming: &[Post]) {
        for post in incoming {
            self.known_ids.insert(post.id.clone());
        }
        self.posts = merge(std::mem::take(&mut self.posts), incoming);
    }

    /// The current merged collection, in canonical order
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }
}
