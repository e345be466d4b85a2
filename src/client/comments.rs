use postwire_api_types::{
    BulkModerationRequest, Comment, CommentQuery, CommentThread, ModerationStatus, NewComment,
    PagingEnvelope, PendingCount, ReplyRequest, lenient,
};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{
    ApiError, BlogClient, Fetched, list_key,
    normalize::normalize_as,
    transport::{Body, Reply},
};

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Comment endpoints, including the moderation workflow.
pub struct Comments<'a> {
    client: &'a BlogClient,
}

impl<'a> Comments<'a> {
    pub(super) fn new(client: &'a BlogClient) -> Self {
        Self { client }
    }

    /// One page of comments matching `query`. Coalesced; failures read as an
    /// empty page carrying the error.
    pub async fn list(&self, query: &CommentQuery) -> Fetched<PagingEnvelope<Comment>> {
        let client = self.client.clone();
        let query = query.clone();
        self.client
            .inner
            .comment_lists
            .issue(list_key("comments", &query), move || async move {
                let page = query.page.unwrap_or(1);
                client
                    .fetcher
                    .read(
                        "comments.list",
                        fetch_list(&client, &query),
                        |err| PagingEnvelope::fallback(page, err.to_string()),
                    )
                    .await
            })
            .await
    }

    /// First page of one moderation bucket across all posts.
    pub async fn by_status(&self, status: ModerationStatus) -> Fetched<PagingEnvelope<Comment>> {
        self.list(&CommentQuery::with_status(status)).await
    }

    /// Comment `id`. Unlike posts there is no placeholder: a failed read is
    /// `None`, with the cause in the `Fallback` error.
    pub async fn get(&self, id: u64) -> Fetched<Option<Comment>> {
        let client = self.client.clone();
        self.client
            .inner
            .comment_reads
            .issue(format!("comment_{id}"), move || async move {
                let path = format!("api/comments/{id}/");
                client
                    .fetcher
                    .read(
                        "comments.get",
                        async { client.inner.transport.get(&path, &[]).await?.decode::<Comment>().map(Some) },
                        |_| None,
                    )
                    .await
            })
            .await
    }

    /// Approved and pending comments of `post`.
    ///
    /// Reads the combined endpoint first. If that fails, the two buckets are
    /// listed separately; if either of those fails too, the result is an empty
    /// thread carrying the error.
    pub async fn thread(&self, post: u64) -> Fetched<CommentThread> {
        if post == 0 {
            let error = ApiError::invalid_input("Post ID is required");
            return Fetched::Fallback {
                value: CommentThread::failed(error.to_string()),
                error,
            };
        }

        let client = self.client.clone();
        self.client
            .inner
            .threads
            .issue(format!("thread_{post}"), move || async move {
                let fetcher = client.fetcher;
                let combined = fetcher
                    .attempt("comments.thread", async {
                        let reply = client
                            .inner
                            .transport
                            .get("api/comments/all/", &[("post", post.to_string())])
                            .await?;
                        thread_from_reply(reply)
                    })
                    .await;

                match combined {
                    Ok(thread) => Fetched::Fresh(thread),
                    Err(err) => {
                        warn!(
                            target = "postwire::comments",
                            post,
                            error = %err,
                            "combined comment read failed; listing buckets separately"
                        );
                        fetcher
                            .read(
                                "comments.thread_split",
                                split_thread(&client, post),
                                |err| CommentThread::failed(err.to_string()),
                            )
                            .await
                    }
                }
            })
            .await
    }

    /// Submit a reader comment. New comments always start unapproved.
    pub async fn submit(&self, comment: &NewComment) -> Result<Comment, ApiError> {
        if comment.post == 0 {
            return Err(ApiError::invalid_input("Missing required field: post ID"));
        }
        if comment.content.trim().is_empty() {
            return Err(ApiError::invalid_input(
                "Missing required field: comment content",
            ));
        }
        let comment = NewComment {
            approved: false,
            ..comment.clone()
        };

        let created: Comment = self
            .client
            .fetcher
            .write(
                "comments.submit",
                self.client.inner.transport.send(
                    Method::POST,
                    "api/comments/",
                    &[],
                    Body::Json(serde_json::to_value(&comment)?),
                ),
            )
            .await?
            .decode()?;
        info!(
            target = "postwire::comments",
            id = created.id,
            post = comment.post,
            "comment submitted"
        );
        Ok(created)
    }

    pub async fn approve(&self, id: u64) -> Result<Value, ApiError> {
        self.action("comments.approve", &format!("api/comments/{id}/approve/"), json!({}))
            .await
    }

    pub async fn reject(&self, id: u64) -> Result<Value, ApiError> {
        self.action("comments.reject", &format!("api/comments/{id}/reject/"), json!({}))
            .await
    }

    pub async fn bulk_approve(&self, ids: &[u64]) -> Result<Value, ApiError> {
        let body = bulk_body(ids)?;
        self.action("comments.bulk_approve", "api/comments/bulk_approve/", body)
            .await
    }

    pub async fn bulk_reject(&self, ids: &[u64]) -> Result<Value, ApiError> {
        let body = bulk_body(ids)?;
        self.action("comments.bulk_reject", "api/comments/bulk_reject/", body)
            .await
    }

    /// Attach an administrator reply to comment `id`.
    pub async fn reply(&self, id: u64, text: &str) -> Result<Comment, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::invalid_input("reply text must not be empty"));
        }
        let body = serde_json::to_value(ReplyRequest {
            admin_reply: text.to_string(),
        })?;
        let path = format!("api/comments/{id}/");
        self.client
            .fetcher
            .write(
                "comments.reply",
                self.client
                    .inner
                    .transport
                    .send(Method::PATCH, &path, &[], Body::Json(body)),
            )
            .await?
            .decode()
    }

    /// Number of comments awaiting moderation; zero when unavailable.
    pub async fn pending_count(&self) -> Fetched<PendingCount> {
        let client = self.client.clone();
        self.client
            .inner
            .pending_counts
            .issue("comments_pending_count", move || async move {
                client
                    .fetcher
                    .read(
                        "comments.pending_count",
                        async {
                            let reply = client
                                .inner
                                .transport
                                .get("api/comments/pending_count/", &[])
                                .await?;
                            pending_from_value(reply.into_value())
                        },
                        |_| PendingCount::default(),
                    )
                    .await
            })
            .await
    }

    async fn action(&self, op: &'static str, path: &str, body: Value) -> Result<Value, ApiError> {
        let reply = self
            .client
            .fetcher
            .write(
                op,
                self.client
                    .inner
                    .transport
                    .send(Method::POST, path, &[], Body::Json(body)),
            )
            .await?;
        Ok(reply.into_value())
    }
}

async fn fetch_list(
    client: &BlogClient,
    query: &CommentQuery,
) -> Result<PagingEnvelope<Comment>, ApiError> {
    let reply = client
        .inner
        .transport
        .get("api/comments/", &query.to_pairs())
        .await?;
    Ok(normalize_as(
        Some(reply.into_value()),
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    ))
}

async fn split_thread(client: &BlogClient, post: u64) -> Result<CommentThread, ApiError> {
    let bucket = |approved: bool| CommentQuery {
        post: Some(post),
        approved: Some(approved),
        ..CommentQuery::default()
    };
    let approved_query = bucket(true);
    let pending_query = bucket(false);
    let (approved, pending) = futures::try_join!(
        fetch_list(client, &approved_query),
        fetch_list(client, &pending_query),
    )?;
    Ok(CommentThread::from_parts(approved.results, pending.results))
}

/// The combined endpoint answers with `{approved, pending}` buckets; a plain
/// list is split by moderation status, dropping rejected comments.
fn thread_from_reply(reply: Reply) -> Result<CommentThread, ApiError> {
    let value = reply.into_value();
    let is_bucketed = value
        .as_object()
        .is_some_and(|map| map.contains_key("approved") || map.contains_key("pending"));
    if is_bucketed {
        let mut thread: CommentThread = serde_json::from_value(value)?;
        if thread.total == 0 {
            thread.total = (thread.approved.len() + thread.pending.len()) as u64;
        }
        return Ok(thread);
    }

    let comments = normalize_as::<Comment>(Some(value), 1, 0).results;
    let (approved, pending): (Vec<Comment>, Vec<Comment>) = comments
        .into_iter()
        .filter(|comment| comment.status() != ModerationStatus::Rejected)
        .partition(|comment| comment.status() == ModerationStatus::Approved);
    Ok(CommentThread::from_parts(approved, pending))
}

fn pending_from_value(value: Value) -> Result<PendingCount, ApiError> {
    let count = match &value {
        Value::Object(map) => map.get("count").and_then(lenient::as_id),
        other => lenient::as_id(other),
    };
    count
        .map(|count| PendingCount { count })
        .ok_or_else(|| ApiError::Decode(format!("unexpected pending count payload: {value}")))
}

fn bulk_body(ids: &[u64]) -> Result<Value, ApiError> {
    if ids.is_empty() {
        return Err(ApiError::invalid_input("no comment ids given"));
    }
    Ok(serde_json::to_value(BulkModerationRequest {
        comment_ids: ids.to_vec(),
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_count_accepts_object_or_number() {
        assert_eq!(
            pending_from_value(json!({"count": 4})).expect("object").count,
            4
        );
        assert_eq!(pending_from_value(json!(7)).expect("number").count, 7);
        assert!(pending_from_value(json!({"total": 1})).is_err());
    }

    #[test]
    fn plain_list_is_split_into_buckets() {
        let reply = Reply::Json(json!([
            {"id": 1, "post": 5, "content": "a", "approved": true},
            {"id": 2, "post": 5, "content": "b", "approved": false},
            {"id": 3, "post": 5, "content": "c", "approved": false, "rejected": true}
        ]));
        let thread = thread_from_reply(reply).expect("thread");
        assert_eq!(thread.approved.len(), 1);
        assert_eq!(thread.pending.len(), 1);
        assert_eq!(thread.total, 2);
    }

    #[test]
    fn bucketed_reply_is_decoded_directly() {
        let reply = Reply::Json(json!({
            "approved": [{"id": 1, "content": "a", "approved": true}],
            "pending": [],
            "total": 1
        }));
        let thread = thread_from_reply(reply).expect("thread");
        assert_eq!(thread.approved[0].id, 1);
        assert!(thread.pending.is_empty());
    }

    #[test]
    fn bucketed_reply_without_total_counts_buckets() {
        let reply = Reply::Json(json!({
            "approved": [{"id": 1, "content": "a", "approved": true}],
            "pending": [{"id": 2, "content": "b"}],
            "total": null
        }));
        let thread = thread_from_reply(reply).expect("thread");
        assert_eq!(thread.approved[0].id, 1);
        assert_eq!(thread.pending[0].id, 2);
        assert_eq!(thread.total, 2);
    }

    #[test]
    fn empty_bulk_request_is_rejected() {
        assert!(matches!(bulk_body(&[]), Err(ApiError::InvalidInput(_))));
        assert_eq!(
            bulk_body(&[1, 2]).expect("body"),
            json!({"comment_ids": [1, 2]})
        );
    }
}
