use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::images::Image;
use crate::lenient;

const PLACEHOLDER_TITLE: &str = "Unable to load post";
const PLACEHOLDER_CONTENT: &str = "There was an error loading this post. Please try again later.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, with = "lenient::timestamp")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "lenient::timestamp")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub images: Vec<Image>,
    /// Set only on placeholders produced when a read failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Post {
    /// Placeholder shown in place of a post that could not be loaded.
    pub fn placeholder(id: u64, error: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            title: PLACEHOLDER_TITLE.to_string(),
            content: PLACEHOLDER_CONTENT.to_string(),
            published: false,
            slug: None,
            excerpt: None,
            created_at: Some(now),
            updated_at: Some(now),
            featured_image: None,
            images: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// Query for the post listing. Field order is the serialization order, which
/// doubles as the coalescing key, so keep it stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            published: Some(true),
            page: 1,
            page_size: 10,
        }
    }
}

impl PostQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(published) = self.published {
            pairs.push(("published", published.to_string()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("page_size", self.page_size.to_string()));
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Partial update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.published.is_none()
            && self.slug.is_none()
    }
}
