//! The blog API client: request coalescing, timeout-bounded fetching with
//! fallbacks, response normalization and the post cache, behind one
//! injectable [`BlogClient`].

mod coalesce;
mod comments;
mod diagnostics;
mod error;
mod fetcher;
mod images;
pub mod normalize;
mod posts;
mod transport;

use std::{fmt, sync::Arc, time::Duration};

use postwire_api_types::{Comment, CommentThread, Image, PagingEnvelope, PendingCount, Post};
use serde::Serialize;
use serde_json::Value;

use crate::cache::{LocalEntityCache, PostNavigator, Revalidation};
use crate::config::{ApiSettings, Settings};
use crate::media::MediaResolver;

pub use coalesce::{RequestCoalescer, SharedResult};
pub use comments::Comments;
pub use diagnostics::Diagnostics;
pub use error::{ApiError, ErrorBody};
pub use fetcher::{DEFAULT_TIMEOUT, Fetched, ResilientFetcher};
pub use images::Images;
pub use posts::{PostAttachments, Posts};
pub use transport::Upload;

use transport::HttpTransport;

type Envelope<T> = Fetched<PagingEnvelope<T>>;

pub(crate) struct ClientInner {
    transport: HttpTransport,
    media: MediaResolver,
    posts: LocalEntityCache<u64, Post>,
    post_reads: RequestCoalescer<Fetched<Post>>,
    post_lists: RequestCoalescer<Envelope<Post>>,
    image_reads: RequestCoalescer<Fetched<Option<Image>>>,
    image_lists: RequestCoalescer<Envelope<Image>>,
    comment_reads: RequestCoalescer<Fetched<Option<Comment>>>,
    comment_lists: RequestCoalescer<Envelope<Comment>>,
    threads: RequestCoalescer<Fetched<CommentThread>>,
    pending_counts: RequestCoalescer<Fetched<PendingCount>>,
    debug_info: RequestCoalescer<Fetched<Option<Value>>>,
    cancel_on_navigate: bool,
}

/// Session-scoped API client.
///
/// Cloning is cheap and clones share the in-flight registries and the post
/// cache, so one instance should be built per session and handed to every
/// caller. Separate instances share nothing.
#[derive(Clone)]
pub struct BlogClient {
    inner: Arc<ClientInner>,
    fetcher: ResilientFetcher,
}

impl BlogClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        Self::build(settings, false)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        Self::build(&settings.api, settings.navigation.cancel_on_navigate)
    }

    fn build(settings: &ApiSettings, cancel_on_navigate: bool) -> Result<Self, ApiError> {
        let inner = ClientInner {
            transport: HttpTransport::new(settings)?,
            media: MediaResolver::from_settings(settings),
            posts: LocalEntityCache::new("post"),
            post_reads: RequestCoalescer::new(),
            post_lists: RequestCoalescer::new(),
            image_reads: RequestCoalescer::new(),
            image_lists: RequestCoalescer::new(),
            comment_reads: RequestCoalescer::new(),
            comment_lists: RequestCoalescer::new(),
            threads: RequestCoalescer::new(),
            pending_counts: RequestCoalescer::new(),
            debug_info: RequestCoalescer::new(),
            cancel_on_navigate,
        };
        Ok(Self {
            inner: Arc::new(inner),
            fetcher: ResilientFetcher::new(settings.timeout),
        })
    }

    /// A handle sharing this client's state but using a different timeout budget.
    pub fn with_timeout(&self, budget: Duration) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            fetcher: self.fetcher.with_budget(budget),
        }
    }

    pub fn posts(&self) -> Posts<'_> {
        Posts::new(self)
    }

    pub fn comments(&self) -> Comments<'_> {
        Comments::new(self)
    }

    pub fn images(&self) -> Images<'_> {
        Images::new(self)
    }

    pub fn diagnostics(&self) -> Diagnostics<'_> {
        Diagnostics::new(self)
    }

    pub fn media(&self) -> &MediaResolver {
        &self.inner.media
    }

    pub fn fetcher(&self) -> ResilientFetcher {
        self.fetcher
    }

    pub fn post_cache(&self) -> &LocalEntityCache<u64, Post> {
        &self.inner.posts
    }

    pub fn cancel_on_navigate(&self) -> bool {
        self.inner.cancel_on_navigate
    }

    /// Distinct logical reads currently in flight across all resources.
    pub fn in_flight(&self) -> usize {
        let inner = &self.inner;
        inner.post_reads.in_flight()
            + inner.post_lists.in_flight()
            + inner.image_reads.in_flight()
            + inner.image_lists.in_flight()
            + inner.comment_reads.in_flight()
            + inner.comment_lists.in_flight()
            + inner.threads.in_flight()
            + inner.pending_counts.in_flight()
            + inner.debug_info.in_flight()
    }

    /// Open the detail view of post `id`: paint the cached copy (if any) and
    /// revalidate in the background. Must be called inside a Tokio runtime.
    pub fn open_post(&self, id: u64) -> Revalidation<Post> {
        let cached = self.inner.posts.get(&id);
        Revalidation::start(cached, self.posts().fetch(id))
    }

    pub fn navigator(&self) -> PostNavigator {
        PostNavigator::new(self.clone())
    }
}

impl fmt::Debug for BlogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlogClient")
            .field("base_url", &self.inner.transport.base().as_str())
            .field("budget", &self.fetcher.budget())
            .field("cached_posts", &self.inner.posts.len())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Coalescing key for a list read: `prefix` plus the JSON form of `query`.
fn list_key<Q: Serialize + fmt::Debug>(prefix: &str, query: &Q) -> String {
    match serde_json::to_string(query) {
        Ok(json) => format!("{prefix}?{json}"),
        Err(_) => format!("{prefix}?{query:?}"),
    }
}
