//! Cache-then-revalidate view state.
//!
//! Opening an entity view paints the cached value at once (if any), then a
//! background fetch replaces it when it settles. Each opened view is one
//! instance of the state machine below; a new navigation is a new instance.

use std::{future::Future, sync::Arc};

use tokio::{sync::watch, task::AbortHandle};
use tracing::debug;

use crate::client::Fetched;

/// Where one opened view stands.
///
/// ```text
/// Idle ──────────────┐
///                    ├──> Fetching ──> Fresh | Failed
/// PaintedStale(v) ───┘        └──────> Cancelled
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<V> {
    /// Nothing cached; the caller shows a loading state.
    Idle,
    /// Cached value painted, possibly stale.
    PaintedStale(V),
    Fetching { stale: Option<V> },
    Fresh(V),
    /// The fetch failed; `fallback` is displayed.
    Failed { fallback: V, error: String },
    /// Superseded by a navigation before the fetch settled.
    Cancelled { stale: Option<V> },
}

impl<V> ViewState<V> {
    /// Value currently on screen, if any.
    pub fn displayed(&self) -> Option<&V> {
        match self {
            Self::Idle => None,
            Self::PaintedStale(value) | Self::Fresh(value) => Some(value),
            Self::Fetching { stale } | Self::Cancelled { stale } => stale.as_ref(),
            Self::Failed { fallback, .. } => Some(fallback),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Fresh(_) | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }
}

/// One opened view: observable state plus the background fetch driving it.
#[derive(Debug, Clone)]
pub struct Revalidation<V> {
    state: Arc<watch::Sender<ViewState<V>>>,
    task: AbortHandle,
}

impl<V> Revalidation<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Paint `cached` and spawn `fetch`. Must be called inside a Tokio runtime.
    pub fn start<Fut>(cached: Option<V>, fetch: Fut) -> Self
    where
        Fut: Future<Output = Fetched<V>> + Send + 'static,
    {
        let initial = match cached {
            Some(value) => ViewState::PaintedStale(value),
            None => ViewState::Idle,
        };
        let state = Arc::new(watch::Sender::new(initial));
        let driver = Arc::clone(&state);

        let task = tokio::spawn(async move {
            driver.send_modify(|current| {
                let stale = current.displayed().cloned();
                *current = ViewState::Fetching { stale };
            });

            let fetched = fetch.await;
            let applied = driver.send_if_modified(|current| {
                if !matches!(current, ViewState::Fetching { .. }) {
                    return false;
                }
                *current = match fetched {
                    Fetched::Fresh(value) => ViewState::Fresh(value),
                    Fetched::Fallback { value, error } => ViewState::Failed {
                        fallback: value,
                        error: error.to_string(),
                    },
                };
                true
            });
            if !applied {
                debug!(
                    target = "postwire::revalidate",
                    "fetch settled after the view was cancelled"
                );
            }
        });

        Self {
            state,
            task: task.abort_handle(),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ViewState<V> {
        self.state.borrow().clone()
    }

    pub fn displayed(&self) -> Option<V> {
        self.state.borrow().displayed().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<V>> {
        self.state.subscribe()
    }

    /// Wait for a terminal state and return it.
    pub async fn settled(&self) -> ViewState<V> {
        let mut receiver = self.state.subscribe();
        match receiver.wait_for(ViewState::is_terminal).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.state(),
        }
    }

    /// Stop the background fetch. A view that already settled keeps its state.
    pub fn cancel(&self) {
        self.task.abort();
        self.state.send_if_modified(|current| {
            if current.is_terminal() {
                return false;
            }
            let stale = current.displayed().cloned();
            *current = ViewState::Cancelled { stale };
            true
        });
    }
}
