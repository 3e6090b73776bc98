//! Data model for harvested posts
//!
//! A [`Post`] is one structured record extracted from a mirror timeline page.
//! Posts are immutable once extracted; only the ledger's membership set and
//! the persisted collection change between runs.

use serde::{Deserialize, Serialize};

/// The kind of a harvested post
///
/// Serialized with the wire names used by the persisted collection, so an
/// existing collection file written by earlier versions stays readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostKind {
    /// An ordinary post authored by the feed owner
    #[serde(rename = "tweet")]
    Original,

    /// A share of another post (plain retweet or quote)
    #[serde(rename = "retweet")]
    Shared,

    /// A reply to another post
    #[serde(rename = "reply")]
    Response,
}

/// A pointer to another post that this post quotes or shares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReference {
    /// Identity of the referenced post
    pub id: String,

    /// Feed that owns the referenced post
    pub username: String,
}

/// One harvested post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Stable identity, unique within the output collection
    pub id: String,

    /// Body text
    pub text: String,

    /// Owning feed name
    pub username: String,

    /// Display timestamp (`YYYY-MM-DD HH:MM:SS`), None when unresolvable
    pub created_at: Option<String>,

    /// Epoch seconds, None when unresolvable
    pub timestamp: Option<i64>,

    #[serde(rename = "type")]
    pub kind: PostKind,

    /// Quoted or shared source post, when this post carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<PostReference>,

    /// Reply count
    pub replies: u32,

    /// Share count
    pub retweets: u32,

    /// Favorite count
    pub likes: u32,

    /// Derived interaction score, see [`engagement_score`]
    pub engagement: u32,
}

/// Computes the derived engagement score for a set of counters
///
/// Replies weigh 3, shares 2, favorites 1.
pub fn engagement_score(replies: u32, retweets: u32, likes: u32) -> u32 {
    replies * 3 + retweets * 2 + likes
}
