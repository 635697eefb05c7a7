use serde::{Deserialize, Serialize};

/// A single devlog entry, serialized in camelCase because that is the
/// on-disk format of the `devlog_posts` blob.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub date: String,
    pub image_url: String,
    pub author: String,
    pub tags: Vec<String>,
}

/// Positional neighbors of a post in stored order. `newer` is the entry
/// one slot closer to the front of the list, not the one with the later
/// `date` field; the two diverge when dates are hand-edited.
#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct AdjacentPosts {
    pub newer: Option<Post>,
    pub older: Option<Post>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub message: String,
    pub r#type: String, // 'success' or 'error'
}

pub mod db_operations;
