use postwire_api_types::{Image, PagingEnvelope};
use reqwest::Method;
use url::Url;

use super::{
    ApiError, BlogClient, Fetched,
    normalize::normalize_as,
    transport::{Body, FormField, Upload},
};

/// Image endpoints.
pub struct Images<'a> {
    client: &'a BlogClient,
}

impl<'a> Images<'a> {
    pub(super) fn new(client: &'a BlogClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: u32) -> Fetched<PagingEnvelope<Image>> {
        let client = self.client.clone();
        let page = page.max(1);
        self.client
            .inner
            .image_lists
            .issue(format!("images?page={page}"), move || async move {
                client
                    .fetcher
                    .read(
                        "images.list",
                        async {
                            let reply = client
                                .inner
                                .transport
                                .get("api/images/", &[("page", page.to_string())])
                                .await?;
                            Ok(normalize_as(Some(reply.into_value()), page, 0))
                        },
                        |err| PagingEnvelope::fallback(page, err.to_string()),
                    )
                    .await
            })
            .await
    }

    /// Image `id`. A failed read is `None` rather than a placeholder; the
    /// cause is in the `Fallback` error.
    pub async fn get(&self, id: u64) -> Fetched<Option<Image>> {
        let client = self.client.clone();
        self.client
            .inner
            .image_reads
            .issue(format!("image_{id}"), move || async move {
                let path = format!("api/images/{id}/");
                client
                    .fetcher
                    .read(
                        "images.get",
                        async {
                            client
                                .inner
                                .transport
                                .get(&path, &[])
                                .await?
                                .decode::<Image>()
                                .map(Some)
                        },
                        |_| None,
                    )
                    .await
            })
            .await
    }

    /// Attach `upload` to post `post`.
    pub async fn upload(&self, post: u64, upload: Upload) -> Result<Image, ApiError> {
        let fields = vec![
            FormField::Text {
                name: "post",
                value: post.to_string(),
            },
            FormField::File {
                name: "image",
                upload,
            },
        ];
        self.client
            .fetcher
            .write(
                "images.upload",
                self.client.inner.transport.send(
                    Method::POST,
                    "api/images/",
                    &[],
                    Body::Multipart(fields),
                ),
            )
            .await?
            .decode()
    }

    /// `true` when the server answered `204 No Content`.
    pub async fn delete(&self, id: u64) -> Result<bool, ApiError> {
        let path = format!("api/images/{id}/");
        let reply = self
            .client
            .fetcher
            .write(
                "images.delete",
                self.client
                    .inner
                    .transport
                    .send(Method::DELETE, &path, &[], Body::Empty),
            )
            .await?;
        Ok(reply.is_no_content())
    }

    /// Absolute URL of an image as returned by the API.
    pub fn url(&self, image: &Image) -> Option<Url> {
        self.client.media().resolve(&image.image)
    }
}
