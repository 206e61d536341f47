use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display label for a post whose author cannot be resolved.
pub const UNKNOWN_USER: &str = "Unknown User";

/// A bearer credential issued by an identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
}

/// A stored beer post. `created_at` is the ordering key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BeerPost {
    pub id: String,
    pub user_id: String,
    pub image_url: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// A beer post with its author's display name joined on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BeerWithAuthor {
    pub id: String,
    pub image_url: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
}

impl BeerWithAuthor {
    pub fn new(post: BeerPost, user_name: Option<String>) -> Self {
        Self {
            id: post.id,
            image_url: post.image_url,
            note: post.note,
            created_at: post.created_at,
            user_id: post.user_id,
            user_name: user_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_USER.to_string()),
        }
    }
}
