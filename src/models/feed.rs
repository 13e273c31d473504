//! Content feed item types and wire format.

use serde::{Deserialize, Serialize};

/// An externally sourced content item, after ingestion mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Direct media URL.
    pub url: String,
    /// Item title.
    pub title: String,
    /// Where the item came from (community name).
    pub source_label: String,
    /// Popularity score.
    pub score: i64,
    /// Flagged as sensitive at the source.
    pub is_sensitive: bool,
    /// Flagged as a spoiler at the source.
    pub is_spoiler: bool,
}

impl ContentItem {
    /// Whether this item may be served at all.
    ///
    /// Flagged items are excluded from the servable pool at ingestion time;
    /// the filter is permanent for the cached batch.
    #[must_use]
    pub const fn servable(&self) -> bool {
        !self.is_sensitive && !self.is_spoiler
    }
}

/// Response body of the feed endpoint.
#[derive(Debug, Deserialize)]
pub struct FeedResponse {
    /// Number of items in the batch.
    #[allow(dead_code)]
    pub count: u32,
    /// The items themselves.
    pub memes: Vec<FeedItemWire>,
}

/// A single item as it appears on the wire.
#[derive(Debug, Deserialize)]
pub struct FeedItemWire {
    /// Link to the original post.
    #[serde(rename = "postLink")]
    pub post_link: String,
    /// Source community.
    pub subreddit: String,
    /// Item title.
    pub title: String,
    /// Direct media URL.
    pub url: String,
    /// Sensitive-content flag.
    pub nsfw: bool,
    /// Spoiler flag.
    pub spoiler: bool,
    /// Post author.
    pub author: String,
    /// Upvote count.
    pub ups: i64,
}

impl From<FeedItemWire> for ContentItem {
    fn from(wire: FeedItemWire) -> Self {
        Self {
            url: wire.url,
            title: wire.title,
            source_label: wire.subreddit,
            score: wire.ups,
            is_sensitive: wire.nsfw,
            is_spoiler: wire.spoiler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_deserialization() {
        let body = r#"{
            "count": 1,
            "memes": [{
                "postLink": "https://example.com/post/1",
                "subreddit": "programming",
                "title": "it compiles",
                "url": "https://example.com/1.png",
                "nsfw": false,
                "spoiler": true,
                "author": "someone",
                "ups": 1234
            }]
        }"#;

        let response: FeedResponse = serde_json::from_str(body).expect("deserialize feed body");
        assert_eq!(response.memes.len(), 1);

        let item = ContentItem::from(response.memes.into_iter().next().expect("one item"));
        assert_eq!(item.source_label, "programming");
        assert_eq!(item.score, 1234);
        assert!(item.is_spoiler);
        assert!(!item.servable());
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        let result: Result<FeedResponse, _> = serde_json::from_str(r#"{"count": "nope"}"#);
        assert!(result.is_err());
    }
}
