//! Reshapes the backend's list responses into one [`PagingEnvelope`].
//!
//! Accepted shapes, in order of precedence: an object whose `results` is an
//! array, a bare array, and anything else (read as an empty list). The
//! normalizer never fails.

use postwire_api_types::PagingEnvelope;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

/// Decoded shape of a raw list response.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPage {
    Paged {
        results: Vec<Value>,
        count: Option<u64>,
        next: Option<String>,
        previous: Option<String>,
        error: Option<String>,
    },
    Bare(Vec<Value>),
    /// Absent body, or an object with no `results` (such as an error marker).
    Empty { error: Option<String> },
    /// Present but unusable; carries a description for logging.
    Malformed(String),
}

impl RawPage {
    pub fn decode(raw: Option<Value>) -> Self {
        match raw {
            None | Some(Value::Null) => Self::Empty { error: None },
            Some(Value::Array(items)) => Self::Bare(items),
            Some(Value::Object(mut map)) => match map.remove("results") {
                Some(Value::Array(results)) => Self::Paged {
                    results,
                    count: map.get("count").and_then(Value::as_u64),
                    next: string_field(&map, "next"),
                    previous: string_field(&map, "previous"),
                    error: string_field(&map, "error"),
                },
                Some(other) => Self::Malformed(format!(
                    "`results` is {} rather than an array",
                    kind(&other)
                )),
                None => Self::Empty {
                    error: string_field(&map, "error"),
                },
            },
            Some(other) => Self::Malformed(format!("list response is {}", kind(&other))),
        }
    }
}

/// Normalize a raw list response for the requested page.
///
/// A `page_size` of 0 means the server picked the page size; it is then
/// inferred from the response.
pub fn normalize(raw: Option<Value>, page: u32, page_size: u32) -> PagingEnvelope<Value> {
    let current_page = page.max(1);
    match RawPage::decode(raw) {
        RawPage::Paged {
            results,
            count,
            next,
            previous,
            error,
        } => {
            let count = count.unwrap_or(results.len() as u64);
            let total_pages = if page_size > 0 {
                total_pages(count, page_size)
            } else {
                inferred_total_pages(count, results.len(), next.is_some(), current_page)
            };
            PagingEnvelope {
                results,
                count,
                next,
                previous,
                current_page,
                total_pages,
                error,
            }
        }
        RawPage::Bare(results) => PagingEnvelope {
            count: results.len() as u64,
            results,
            ..PagingEnvelope::empty(current_page)
        },
        RawPage::Empty { error } => PagingEnvelope {
            error,
            ..PagingEnvelope::empty(current_page)
        },
        RawPage::Malformed(reason) => {
            warn!(
                target = "postwire::normalize",
                reason = %reason,
                "malformed list response; treating as empty"
            );
            PagingEnvelope::empty(current_page)
        }
    }
}

/// [`normalize`], then decode each item. Items that do not decode are dropped.
pub fn normalize_as<T: DeserializeOwned>(
    raw: Option<Value>,
    page: u32,
    page_size: u32,
) -> PagingEnvelope<T> {
    let envelope = normalize(raw, page, page_size);
    let PagingEnvelope {
        results,
        count,
        next,
        previous,
        current_page,
        total_pages,
        error,
    } = envelope;

    // `count` stays as reported; it spans every page, not just this one.
    let results = results
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    target = "postwire::normalize",
                    error = %err,
                    "skipping list item that failed to decode"
                );
                None
            }
        })
        .collect::<Vec<_>>();

    PagingEnvelope {
        results,
        count,
        next,
        previous,
        current_page,
        total_pages,
        error,
    }
}

/// `ceil(count / page_size)` when both are positive, otherwise 1.
pub fn total_pages(count: u64, page_size: u32) -> u32 {
    if count == 0 || page_size == 0 {
        return 1;
    }
    let pages = count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Page count when the server chose the page size. A page followed by another
/// one is full, so its length is the page size; a page with no successor is
/// the last one.
fn inferred_total_pages(count: u64, served: usize, has_next: bool, current_page: u32) -> u32 {
    if !has_next || served == 0 {
        return current_page;
    }
    let page_size = u32::try_from(served).unwrap_or(u32::MAX);
    total_pages(count, page_size).max(current_page.saturating_add(1))
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
