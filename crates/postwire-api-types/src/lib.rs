//! Shared request and response types for the blog REST API.
//!
//! Backend entities are loosely structured: fields come and go between
//! backend versions. Every optional field here carries a serde default so a
//! response decodes as long as the entity id is present.

pub mod comments;
pub mod images;
pub mod lenient;
pub mod paging;
pub mod posts;

pub use comments::{
    BulkModerationRequest, Comment, CommentQuery, CommentThread, ModerationStatus, NewComment,
    PendingCount, ReplyRequest,
};
pub use images::Image;
pub use paging::PagingEnvelope;
pub use posts::{NewPost, Post, PostPatch, PostQuery};
