use postwire_api_types::{Image, NewPost, PagingEnvelope, Post, PostPatch, PostQuery};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::info;

use super::{
    ApiError, BlogClient, Fetched, SharedResult, list_key,
    normalize::normalize_as,
    transport::{Body, FormField, Upload},
};

/// Files sent with a post create or update.
#[derive(Debug, Clone, Default)]
pub struct PostAttachments {
    pub featured_image: Option<Upload>,
    pub additional_images: Vec<Upload>,
}

impl PostAttachments {
    pub fn is_empty(&self) -> bool {
        self.featured_image.is_none() && self.additional_images.is_empty()
    }

    fn into_fields(self, fields: &mut Vec<FormField>) {
        if let Some(upload) = self.featured_image {
            fields.push(FormField::File {
                name: "featured_image",
                upload,
            });
        }
        for upload in self.additional_images {
            fields.push(FormField::File {
                name: "additional_images",
                upload,
            });
        }
    }
}

/// Post endpoints.
pub struct Posts<'a> {
    client: &'a BlogClient,
}

impl<'a> Posts<'a> {
    pub(super) fn new(client: &'a BlogClient) -> Self {
        Self { client }
    }

    /// One page of posts. Coalesced on the serialized query; failures read as
    /// an empty page carrying the error.
    pub async fn list(&self, query: &PostQuery) -> Fetched<PagingEnvelope<Post>> {
        let client = self.client.clone();
        let query = query.clone();
        self.client
            .inner
            .post_lists
            .issue(list_key("posts", &query), move || async move {
                let pairs = query.to_pairs();
                client
                    .fetcher
                    .read(
                        "posts.list",
                        async {
                            let reply = client.inner.transport.get("api/posts/", &pairs).await?;
                            Ok(normalize_as(
                                Some(reply.into_value()),
                                query.page,
                                query.page_size,
                            ))
                        },
                        |err| PagingEnvelope::fallback(query.page, err.to_string()),
                    )
                    .await
            })
            .await
    }

    /// Post `id`, or a placeholder carrying the error. Fresh results
    /// overwrite the post cache.
    pub async fn get(&self, id: u64) -> Fetched<Post> {
        self.fetch(id).await
    }

    pub(crate) fn fetch(&self, id: u64) -> SharedResult<Fetched<Post>> {
        let client = self.client.clone();
        self.client
            .inner
            .post_reads
            .issue(format!("post_{id}"), move || async move {
                let path = format!("api/posts/{id}/");
                let fetched = client
                    .fetcher
                    .read(
                        "posts.get",
                        async { client.inner.transport.get(&path, &[]).await?.decode::<Post>() },
                        |err| Post::placeholder(id, err.to_string()),
                    )
                    .await;
                if let Fetched::Fresh(post) = &fetched {
                    client.inner.posts.put(id, post.clone());
                }
                fetched
            })
    }

    pub async fn create(
        &self,
        post: &NewPost,
        attachments: PostAttachments,
    ) -> Result<Post, ApiError> {
        let body = if attachments.is_empty() {
            Body::Json(serde_json::to_value(post)?)
        } else {
            let mut fields = vec![
                text("title", &post.title),
                text("content", &post.content),
                text("published", post.published.to_string()),
            ];
            if let Some(slug) = post.slug.as_deref() {
                fields.push(text("slug", slug));
            }
            attachments.into_fields(&mut fields);
            Body::Multipart(fields)
        };

        let inner = &self.client.inner;
        let created: Post = self
            .client
            .fetcher
            .write(
                "posts.create",
                inner.transport.send(Method::POST, "api/posts/", &[], body),
            )
            .await?
            .decode()?;
        info!(target = "postwire::posts", id = created.id, "post created");
        inner.posts.put(created.id, created.clone());
        Ok(created)
    }

    /// Partial update; only the fields set in `patch` are sent.
    pub async fn update(
        &self,
        id: u64,
        patch: &PostPatch,
        attachments: PostAttachments,
    ) -> Result<Post, ApiError> {
        if patch.is_empty() && attachments.is_empty() {
            return Err(ApiError::invalid_input("nothing to update"));
        }

        let body = if attachments.is_empty() {
            Body::Json(serde_json::to_value(patch)?)
        } else {
            let mut fields = Vec::new();
            if let Some(title) = patch.title.as_deref() {
                fields.push(text("title", title));
            }
            if let Some(content) = patch.content.as_deref() {
                fields.push(text("content", content));
            }
            if let Some(published) = patch.published {
                fields.push(text("published", published.to_string()));
            }
            if let Some(slug) = patch.slug.as_deref() {
                fields.push(text("slug", slug));
            }
            attachments.into_fields(&mut fields);
            Body::Multipart(fields)
        };

        let inner = &self.client.inner;
        let path = format!("api/posts/{id}/");
        let updated: Post = self
            .client
            .fetcher
            .write(
                "posts.update",
                inner.transport.send(Method::PATCH, &path, &[], body),
            )
            .await?
            .decode()?;
        inner.posts.put(id, updated.clone());
        Ok(updated)
    }

    /// `true` when the server answered `204 No Content`.
    pub async fn delete(&self, id: u64) -> Result<bool, ApiError> {
        let inner = &self.client.inner;
        let path = format!("api/posts/{id}/");
        let reply = self
            .client
            .fetcher
            .write(
                "posts.delete",
                inner.transport.send(Method::DELETE, &path, &[], Body::Empty),
            )
            .await?;
        let deleted = reply.is_no_content();
        if deleted {
            inner.posts.remove(&id);
            info!(target = "postwire::posts", id, "post deleted");
        }
        Ok(deleted)
    }

    pub async fn upload_images(&self, id: u64, images: Vec<Upload>) -> Result<Vec<Image>, ApiError> {
        if images.is_empty() {
            return Err(ApiError::invalid_input("at least one image is required"));
        }
        let fields = images
            .into_iter()
            .map(|upload| FormField::File {
                name: "images",
                upload,
            })
            .collect();

        let inner = &self.client.inner;
        let path = format!("api/posts/{id}/upload_images/");
        let reply = self
            .client
            .fetcher
            .write(
                "posts.upload_images",
                inner
                    .transport
                    .send(Method::POST, &path, &[], Body::Multipart(fields)),
            )
            .await?;
        Ok(normalize_as::<Image>(Some(reply.into_value()), 1, 0).results)
    }

    /// Render a draft server-side without saving it. Always sent as multipart.
    pub async fn preview(
        &self,
        title: &str,
        content: &str,
        featured_image: Option<Upload>,
    ) -> Result<Value, ApiError> {
        let mut fields = vec![text("title", title), text("content", content)];
        if let Some(upload) = featured_image {
            fields.push(FormField::File {
                name: "featured_image",
                upload,
            });
        }
        Ok(self
            .client
            .fetcher
            .write(
                "posts.preview",
                self.client.inner.transport.send(
                    Method::POST,
                    "api/posts/preview/",
                    &[],
                    Body::Multipart(fields),
                ),
            )
            .await?
            .into_value())
    }

    /// Ask the backend which links in `content` are broken.
    pub async fn check_links(&self, content: &str) -> Result<Value, ApiError> {
        Ok(self
            .client
            .fetcher
            .write(
                "posts.check_links",
                self.client.inner.transport.send(
                    Method::POST,
                    "api/posts/check-links/",
                    &[],
                    Body::Json(json!({ "content": content })),
                ),
            )
            .await?
            .into_value())
    }
}

fn text(name: &'static str, value: impl Into<String>) -> FormField {
    FormField::Text {
        name,
        value: value.into(),
    }
}
