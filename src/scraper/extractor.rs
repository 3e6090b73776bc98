//! Record extraction from timeline markup
//!
//! This module turns one fetched document into structured posts plus an
//! optional continuation cursor. The traversal is deliberately coupled to
//! one known document shape (the Nitter timeline); when that shape is
//! absent the extraction degrades to empty results rather than failing.
//!
//! Cursor discovery is a precision-recall cascade:
//! 1. an anchor labelled "Load more" whose href carries a cursor parameter
//! 2. any cursor-carrying anchor inside the show-more container
//! 3. any cursor-carrying anchor anywhere in the document

use crate::model::{engagement_score, Post, PostKind, PostReference};
use crate::timestamp;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Result of extracting one page
#[derive(Debug)]
pub struct ExtractedPage {
    /// Newly discovered posts, in document order
    pub posts: Vec<Post>,

    /// Continuation cursor for the next page; None is terminal
    pub next_cursor: Option<String>,
}

/// Pre-parsed selectors for the timeline shape
struct Selectors {
    anchor: Selector,
    show_more_anchor: Selector,
    timeline_item: Selector,
    pinned: Selector,
    permalink: Selector,
    body: Selector,
    date_anchor: Selector,
    replying_to: Selector,
    retweet_header: Selector,
    quote_link: Selector,
    stat_container: Selector,
    icon_comment: Selector,
    icon_retweet: Selector,
    icon_heart: Selector,
}

impl Selectors {
    fn new() -> Option<Self> {
        Some(Self {
            anchor: Selector::parse("a[href]").ok()?,
            show_more_anchor: Selector::parse(".show-more a[href]").ok()?,
            timeline_item: Selector::parse(".timeline-item").ok()?,
            pinned: Selector::parse(".pinned").ok()?,
            permalink: Selector::parse(".tweet-link").ok()?,
            body: Selector::parse(".tweet-content").ok()?,
            date_anchor: Selector::parse(".tweet-date a").ok()?,
            replying_to: Selector::parse(".replying-to").ok()?,
            retweet_header: Selector::parse(".retweet-header").ok()?,
            quote_link: Selector::parse(".quote-link").ok()?,
            stat_container: Selector::parse(".tweet-stat .icon-container").ok()?,
            icon_comment: Selector::parse(".icon-comment").ok()?,
            icon_retweet: Selector::parse(".icon-retweet").ok()?,
            icon_heart: Selector::parse(".icon-heart").ok()?,
        })
    }
}

/// Outcome of processing one timeline item
enum ItemOutcome {
    New(Post),
    Pinned,
    NoIdentity,
    AlreadyKnown,
}

/// Extracts posts and the continuation cursor from one timeline page
///
/// Newly discovered identities are registered into `known_ids` immediately,
/// so duplicates later on the same page are also suppressed. When
/// `since` is set, posts older than the boundary are dropped, and if that
/// drops anything the returned cursor is forced to `None`: pagination has
/// reached far enough back in time, regardless of what the page advertises.
pub fn extract_page(
    html: &str,
    username: &str,
    known_ids: &mut HashSet<String>,
    since: Option<DateTime<Utc>>,
) -> ExtractedPage {
    let Some(selectors) = Selectors::new() else {
        return ExtractedPage {
            posts: Vec::new(),
            next_cursor: None,
        };
    };

    let document = Html::parse_document(html);
    let mut next_cursor = find_next_cursor(&document, &selectors);

    let mut posts = Vec::new();
    let mut already_known = 0usize;
    let mut pinned = 0usize;
    let mut no_identity = 0usize;

    // Document order is the authoritative emission order for one page
    for item in document.select(&selectors.timeline_item) {
        match extract_item(item, username, known_ids, &selectors) {
            ItemOutcome::New(post) => posts.push(post),
            ItemOutcome::Pinned => pinned += 1,
            ItemOutcome::NoIdentity => no_identity += 1,
            ItemOutcome::AlreadyKnown => already_known += 1,
        }
    }

    tracing::debug!(
        new = posts.len(),
        already_known,
        pinned,
        no_identity,
        "extracted timeline page"
    );

    if let Some(boundary) = since {
        let boundary_ts = boundary.timestamp();
        let before = posts.len();
        posts.retain(|p| p.timestamp.map_or(false, |ts| ts >= boundary_ts));
        if posts.len() < before {
            tracing::debug!(
                dropped = before - posts.len(),
                "since boundary crossed, forcing terminal cursor"
            );
            next_cursor = None;
        }
    }

    ExtractedPage { posts, next_cursor }
}

/// Processes a single timeline item
///
/// Missing or malformed fields never abort the page: an item without a
/// derivable identity is skipped, and every other absent field falls back
/// to an empty/zero/None value.
fn extract_item(
    item: ElementRef,
    username: &str,
    known_ids: &mut HashSet<String>,
    selectors: &Selectors,
) -> ItemOutcome {
    // Pinned posts are excluded from all runs, unconditionally
    if item.select(&selectors.pinned).next().is_some() {
        return ItemOutcome::Pinned;
    }

    let id = item
        .select(&selectors.permalink)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(identity_from_permalink);
    let Some(id) = id else {
        return ItemOutcome::NoIdentity;
    };

    if known_ids.contains(&id) {
        return ItemOutcome::AlreadyKnown;
    }
    known_ids.insert(id.clone());

    let text = item
        .select(&selectors.body)
        .next()
        .map(collect_text)
        .unwrap_or_default();

    let (relative_label, absolute_title) = match item.select(&selectors.date_anchor).next() {
        Some(el) => (
            collect_text(el),
            el.value().attr("title").map(str::to_string),
        ),
        None => (String::new(), None),
    };
    let instant = timestamp::resolve(&relative_label, absolute_title.as_deref());

    let replies = stat_count(item, selectors, &selectors.icon_comment);
    let retweets = stat_count(item, selectors, &selectors.icon_retweet);
    let likes = stat_count(item, selectors, &selectors.icon_heart);

    let (kind, reference) = classify(item, selectors);

    ItemOutcome::New(Post {
        id,
        text,
        username: username.to_string(),
        created_at: instant.map(timestamp::format_display),
        timestamp: instant.map(|i| i.timestamp()),
        kind,
        reference,
        replies,
        retweets,
        likes,
        engagement: engagement_score(replies, retweets, likes),
    })
}

/// Classifies an item's kind and derives its reference, when present
///
/// A replying-to marker wins over share markers. Quote markers reference
/// the quoted post through the quote's own permalink; pure shares reference
/// the original through the shared permalink.
fn classify(item: ElementRef, selectors: &Selectors) -> (PostKind, Option<PostReference>) {
    if item.select(&selectors.replying_to).next().is_some() {
        return (PostKind::Response, None);
    }

    if let Some(reference) = item
        .select(&selectors.quote_link)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(reference_from_permalink)
    {
        return (PostKind::Shared, Some(reference));
    }

    if item.select(&selectors.retweet_header).next().is_some() {
        let reference = item
            .select(&selectors.permalink)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(reference_from_permalink);
        return (PostKind::Shared, reference);
    }

    (PostKind::Original, None)
}

/// Reads one engagement counter from the stats row
///
/// Unparsable or absent counters default to zero.
fn stat_count(item: ElementRef, selectors: &Selectors, icon: &Selector) -> u32 {
    for container in item.select(&selectors.stat_container) {
        if container.select(icon).next().is_some() {
            let text = container.text().collect::<String>();
            return parse_count(&text);
        }
    }
    0
}

fn parse_count(s: &str) -> u32 {
    let cleaned = s.trim().replace(',', "");
    cleaned.parse().unwrap_or(0)
}

fn collect_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Derives a post identity from a permalink's trailing path segment
///
/// The mirror appends a same-page anchor marker (`#m`) that must be
/// stripped.
fn identity_from_permalink(href: &str) -> Option<String> {
    let tail = href.rsplit('/').next()?;
    let id = tail.strip_suffix("#m").unwrap_or(tail);
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Derives a reference (identity + owning feed) from a permalink
fn reference_from_permalink(href: &str) -> Option<PostReference> {
    let id = identity_from_permalink(href)?;
    let username = feed_from_permalink(href)?;
    Some(PostReference { id, username })
}

/// First path segment of a permalink, the owning feed name
fn feed_from_permalink(href: &str) -> Option<String> {
    let path = match href.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
        None => href.trim_start_matches('/'),
    };
    path.split('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Locates the continuation cursor via the precision-recall cascade
fn find_next_cursor(document: &Html, selectors: &Selectors) -> Option<String> {
    // Exact affordance match first
    for el in document.select(&selectors.anchor) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if !href.contains("cursor=") {
            continue;
        }
        let label = el.text().collect::<String>();
        if label.contains("Load more") {
            if let Some(cursor) = cursor_from_href(href) {
                tracing::debug!(%cursor, "cursor from load-more link");
                return Some(cursor);
            }
        }
    }

    // Structural fallback: the show-more container
    for el in document.select(&selectors.show_more_anchor) {
        if let Some(cursor) = el.value().attr("href").and_then(cursor_from_href) {
            tracing::debug!(%cursor, "cursor from show-more container");
            return Some(cursor);
        }
    }

    // Best effort: anywhere in the document
    for el in document.select(&selectors.anchor) {
        if let Some(cursor) = el.value().attr("href").and_then(cursor_from_href) {
            tracing::debug!(%cursor, "cursor from fallback scan");
            return Some(cursor);
        }
    }

    tracing::debug!("no continuation cursor on page");
    None
}

/// Extracts the value of a `cursor=` query parameter from an href
fn cursor_from_href(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("cursor=")?;
    let value = match rest.split_once('&') {
        Some((value, _)) => value,
        None => rest,
    };
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn page(items: &[String], tail: &str) -> String {
        format!(
            r#"<html><body><div class="timeline">{}{}</div></body></html>"#,
            items.concat(),
            tail
        )
    }

    fn item(user: &str, id: &str, text: &str, title: &str, markers: &str) -> String {
        item_with_stats(user, id, text, title, markers, ("2", "1", "5"))
    }

    fn item_with_stats(
        user: &str,
        id: &str,
        text: &str,
        title: &str,
        markers: &str,
        (replies, retweets, likes): (&str, &str, &str),
    ) -> String {
        format!(
            r#"<div class="timeline-item">
                {markers}
                <a class="tweet-link" href="/{user}/status/{id}#m"></a>
                <div class="tweet-content">{text}</div>
                <span class="tweet-date"><a href="/{user}/status/{id}#m" title="{title}">Mar 2</a></span>
                <div class="tweet-stats">
                  <span class="tweet-stat"><div class="icon-container"><span class="icon-comment"></span> {replies}</div></span>
                  <span class="tweet-stat"><div class="icon-container"><span class="icon-retweet"></span> {retweets}</div></span>
                  <span class="tweet-stat"><div class="icon-container"><span class="icon-heart"></span> {likes}</div></span>
                </div>
              </div>"#
        )
    }

    const LOAD_MORE: &str = r#"<div class="show-more"><a href="/alice?cursor=NEXT123">Load more</a></div>"#;
    const TITLE_A: &str = "Mar 2, 2025 · 6:47 PM UTC";
    const TITLE_B: &str = "Mar 1, 2025 · 9:00 AM UTC";

    fn extract(html: &str) -> ExtractedPage {
        let mut known = HashSet::new();
        extract_page(html, "alice", &mut known, None)
    }

    #[test]
    fn test_extracts_basic_post() {
        let html = page(&[item("alice", "100", "hello world", TITLE_A, "")], "");
        let extracted = extract(&html);

        assert_eq!(extracted.posts.len(), 1);
        let post = &extracted.posts[0];
        assert_eq!(post.id, "100");
        assert_eq!(post.text, "hello world");
        assert_eq!(post.username, "alice");
        assert_eq!(post.kind, PostKind::Original);
        assert_eq!(post.reference, None);
        assert_eq!(post.replies, 2);
        assert_eq!(post.retweets, 1);
        assert_eq!(post.likes, 5);
        assert_eq!(post.engagement, 13);

        let expected = Utc.with_ymd_and_hms(2025, 3, 2, 18, 47, 0).unwrap();
        assert_eq!(post.timestamp, Some(expected.timestamp()));
        assert_eq!(post.created_at.as_deref(), Some("2025-03-02 18:47:00"));
    }

    #[test]
    fn test_cursor_from_load_more_link() {
        let html = page(&[item("alice", "1", "a", TITLE_A, "")], LOAD_MORE);
        assert_eq!(extract(&html).next_cursor.as_deref(), Some("NEXT123"));
    }

    #[test]
    fn test_cursor_falls_back_to_show_more_container() {
        let tail = r#"<div class="show-more"><a href="/alice?cursor=FALLBACK">More</a></div>"#;
        let html = page(&[], tail);
        assert_eq!(extract(&html).next_cursor.as_deref(), Some("FALLBACK"));
    }

    #[test]
    fn test_cursor_falls_back_to_any_link() {
        let tail = r#"<p><a href="/alice?cursor=ANYWHERE&x=1">next page</a></p>"#;
        let html = page(&[], tail);
        assert_eq!(extract(&html).next_cursor.as_deref(), Some("ANYWHERE"));
    }

    #[test]
    fn test_no_cursor_anywhere() {
        let html = page(&[item("alice", "1", "a", TITLE_A, "")], "");
        assert_eq!(extract(&html).next_cursor, None);
    }

    #[test]
    fn test_pinned_item_excluded() {
        let html = page(
            &[
                item("alice", "1", "pinned post", TITLE_A, r#"<div class="pinned">pinned</div>"#),
                item("alice", "2", "regular post", TITLE_B, ""),
            ],
            "",
        );
        let extracted = extract(&html);
        assert_eq!(extracted.posts.len(), 1);
        assert_eq!(extracted.posts[0].id, "2");
    }

    #[test]
    fn test_known_identity_suppressed() {
        let html = page(&[item("alice", "42", "seen before", TITLE_A, "")], "");
        let mut known = HashSet::from(["42".to_string()]);
        let extracted = extract_page(&html, "alice", &mut known, None);
        assert!(extracted.posts.is_empty());
    }

    #[test]
    fn test_within_page_duplicate_suppressed() {
        // Identity registration is immediate, so a repeat later on the same
        // page is dropped too
        let html = page(
            &[
                item("alice", "7", "first copy", TITLE_A, ""),
                item("alice", "7", "second copy", TITLE_A, ""),
            ],
            "",
        );
        let mut known = HashSet::new();
        let extracted = extract_page(&html, "alice", &mut known, None);
        assert_eq!(extracted.posts.len(), 1);
        assert_eq!(extracted.posts[0].text, "first copy");
        assert!(known.contains("7"));
    }

    #[test]
    fn test_item_without_permalink_skipped() {
        let broken = r#"<div class="timeline-item"><div class="tweet-content">orphan</div></div>"#;
        let html = page(
            &[broken.to_string(), item("alice", "9", "fine", TITLE_A, "")],
            "",
        );
        let extracted = extract(&html);
        assert_eq!(extracted.posts.len(), 1);
        assert_eq!(extracted.posts[0].id, "9");
    }

    #[test]
    fn test_reply_classified_as_response() {
        let marker = r#"<div class="replying-to">Replying to @bob</div>"#;
        let html = page(&[item("alice", "1", "a reply", TITLE_A, marker)], "");
        let extracted = extract(&html);
        assert_eq!(extracted.posts[0].kind, PostKind::Response);
        assert_eq!(extracted.posts[0].reference, None);
    }

    #[test]
    fn test_retweet_classified_with_reference() {
        let marker = r#"<div class="retweet-header">bob retweeted</div>"#;
        // The shared permalink points at the original author's feed
        let html = page(&[item("bob", "99", "shared text", TITLE_A, marker)], "");
        let extracted = extract(&html);

        let post = &extracted.posts[0];
        assert_eq!(post.kind, PostKind::Shared);
        assert_eq!(post.username, "alice");
        assert_eq!(
            post.reference,
            Some(PostReference {
                id: "99".to_string(),
                username: "bob".to_string(),
            })
        );
    }

    #[test]
    fn test_quote_classified_with_reference() {
        let marker = r#"<div class="quote"><a class="quote-link" href="/carol/status/77#m"></a></div>"#;
        let html = page(&[item("alice", "1", "quoting carol", TITLE_A, marker)], "");
        let extracted = extract(&html);

        let post = &extracted.posts[0];
        assert_eq!(post.kind, PostKind::Shared);
        assert_eq!(
            post.reference,
            Some(PostReference {
                id: "77".to_string(),
                username: "carol".to_string(),
            })
        );
    }

    #[test]
    fn test_unparsable_counters_default_to_zero() {
        let html = page(
            &[item_with_stats("alice", "1", "a", TITLE_A, "", ("", "x", "1,234"))],
            "",
        );
        let post = &extract(&html).posts[0];
        assert_eq!(post.replies, 0);
        assert_eq!(post.retweets, 0);
        assert_eq!(post.likes, 1234);
    }

    #[test]
    fn test_since_boundary_filters_and_forces_terminal_cursor() {
        let html = page(
            &[
                item("alice", "1", "new enough", TITLE_A, ""),
                item("alice", "2", "too old", TITLE_B, ""),
            ],
            LOAD_MORE,
        );
        let boundary = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        let mut known = HashSet::new();
        let extracted = extract_page(&html, "alice", &mut known, Some(boundary));

        assert_eq!(extracted.posts.len(), 1);
        assert_eq!(extracted.posts[0].id, "1");
        // The page advertised a cursor; the boundary overrides it
        assert_eq!(extracted.next_cursor, None);
    }

    #[test]
    fn test_since_boundary_drops_unresolvable_timestamp() {
        // An item whose date never resolves has no place in a bounded run;
        // dropping it is a boundary crossing like any other
        let undated = r#"<div class="timeline-item">
            <a class="tweet-link" href="/alice/status/3#m"></a>
            <div class="tweet-content">no usable date</div>
            <span class="tweet-date"><a href="/alice/status/3#m" title="not a date">garbled</a></span>
          </div>"#;
        let html = page(
            &[
                item("alice", "1", "new enough", TITLE_A, ""),
                undated.to_string(),
            ],
            LOAD_MORE,
        );
        let boundary = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut known = HashSet::new();
        let extracted = extract_page(&html, "alice", &mut known, Some(boundary));

        assert_eq!(extracted.posts.len(), 1);
        assert_eq!(extracted.posts[0].id, "1");
        assert_eq!(extracted.next_cursor, None);
    }

    #[test]
    fn test_since_boundary_keeps_cursor_when_nothing_dropped() {
        let html = page(&[item("alice", "1", "recent", TITLE_A, "")], LOAD_MORE);
        let boundary = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut known = HashSet::new();
        let extracted = extract_page(&html, "alice", &mut known, Some(boundary));

        assert_eq!(extracted.posts.len(), 1);
        assert_eq!(extracted.next_cursor.as_deref(), Some("NEXT123"));
    }

    #[test]
    fn test_document_order_preserved() {
        let html = page(
            &[
                item("alice", "30", "third newest", TITLE_B, ""),
                item("alice", "10", "newest", TITLE_A, ""),
                item("alice", "20", "middle", TITLE_B, ""),
            ],
            "",
        );
        let ids: Vec<String> = extract(&html).posts.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["30", "10", "20"]);
    }

    #[test]
    fn test_empty_document_degrades_gracefully() {
        let extracted = extract("<html><body><p>service unavailable</p></body></html>");
        assert!(extracted.posts.is_empty());
        assert_eq!(extracted.next_cursor, None);
    }

    #[test]
    fn test_identity_helpers() {
        assert_eq!(
            identity_from_permalink("/alice/status/123#m").as_deref(),
            Some("123")
        );
        assert_eq!(
            identity_from_permalink("/alice/status/123").as_deref(),
            Some("123")
        );
        assert_eq!(identity_from_permalink("/alice/status/"), None);
        assert_eq!(
            feed_from_permalink("https://nitter.net/bob/status/9").as_deref(),
            Some("bob")
        );
        assert_eq!(feed_from_permalink("/bob/status/9").as_deref(), Some("bob"));
    }

    #[test]
    fn test_cursor_from_href() {
        assert_eq!(
            cursor_from_href("/alice?cursor=AbC%3D&limit=20").as_deref(),
            Some("AbC%3D")
        );
        assert_eq!(cursor_from_href("/alice?cursor="), None);
        assert_eq!(cursor_from_href("/alice"), None);
    }
}
