//! postwire: the data-fetching layer behind a blog front-end.
//!
//! Page-level callers talk to a [`BlogClient`], which coalesces identical
//! in-flight reads, bounds every call with a timeout, degrades failed reads to
//! fallback payloads, normalizes list responses into a [`PagingEnvelope`] and
//! keeps a session-lifetime post cache for cache-then-revalidate rendering.

pub mod cache;
pub mod client;
pub mod config;
pub mod infra;
pub mod media;

pub use cache::{LocalEntityCache, PostNavigator, Revalidation, ViewState};
pub use client::{
    ApiError, BlogClient, Diagnostics, ErrorBody, Fetched, PostAttachments, RequestCoalescer,
    ResilientFetcher, Upload,
};
pub use media::MediaResolver;
pub use postwire_api_types::PagingEnvelope;
