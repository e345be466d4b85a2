use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default, with = "lenient::id")]
    pub post: Option<u64>,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub approved: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub rejected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_reply: Option<String>,
    #[serde(default, with = "lenient::timestamp")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "lenient::timestamp")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }
}

impl Comment {
    /// Rejection wins over approval when a backend reports both flags.
    pub fn status(&self) -> ModerationStatus {
        if self.rejected {
            ModerationStatus::Rejected
        } else if self.approved {
            ModerationStatus::Approved
        } else {
            ModerationStatus::Pending
        }
    }
}

/// Filters for the comment listing, serialized in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl CommentQuery {
    /// Filter matching one moderation bucket across all posts.
    pub fn with_status(status: ModerationStatus) -> Self {
        match status {
            ModerationStatus::Pending => Self {
                approved: Some(false),
                rejected: Some(false),
                ..Self::default()
            },
            ModerationStatus::Approved => Self {
                approved: Some(true),
                rejected: Some(false),
                ..Self::default()
            },
            ModerationStatus::Rejected => Self {
                rejected: Some(true),
                ..Self::default()
            },
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(post) = self.post {
            pairs.push(("post", post.to_string()));
        }
        if let Some(approved) = self.approved {
            pairs.push(("approved", approved.to_string()));
        }
        if let Some(rejected) = self.rejected {
            pairs.push(("rejected", rejected.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size", page_size.to_string()));
        }
        pairs
    }
}

/// Reader-submitted comment. New comments always start unapproved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub post: u64,
    pub content: String,
    #[serde(default)]
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

impl NewComment {
    pub fn new(post: u64, content: impl Into<String>) -> Self {
        Self {
            post,
            content: content.into(),
            approved: false,
            author_name: None,
            author_email: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkModerationRequest {
    pub comment_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub admin_reply: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCount {
    #[serde(default)]
    pub count: u64,
}

/// Approved and pending comments of one post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentThread {
    #[serde(default, deserialize_with = "lenient::seq")]
    pub approved: Vec<Comment>,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub pending: Vec<Comment>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommentThread {
    pub fn from_parts(approved: Vec<Comment>, pending: Vec<Comment>) -> Self {
        let total = (approved.len() + pending.len()) as u64;
        Self {
            approved,
            pending,
            total,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
