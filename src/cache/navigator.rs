use std::sync::Mutex;

use postwire_api_types::Post;
use tracing::debug;

use crate::client::BlogClient;

use super::{lock::mutex_lock, revalidate::Revalidation};

const SOURCE: &str = "cache::navigator";

/// Tracks the post view currently on screen.
///
/// With `navigation.cancel_on_navigate` enabled, opening a new post cancels
/// the previous view, so a late result can no longer land in it. The
/// underlying request keeps running for any other caller attached to it.
#[derive(Debug)]
pub struct PostNavigator {
    client: BlogClient,
    current: Mutex<Option<(u64, Revalidation<Post>)>>,
}

impl PostNavigator {
    pub fn new(client: BlogClient) -> Self {
        Self {
            client,
            current: Mutex::new(None),
        }
    }

    /// Open post `id` and make it the current view.
    pub fn navigate(&self, id: u64) -> Revalidation<Post> {
        let view = self.client.open_post(id);
        let previous = mutex_lock(&self.current, SOURCE, "navigate").replace((id, view.clone()));

        if let Some((previous_id, previous)) = previous {
            if self.client.cancel_on_navigate() {
                previous.cancel();
                debug!(
                    target = "postwire::navigation",
                    from = previous_id,
                    to = id,
                    "cancelled superseded post view"
                );
            }
        }
        view
    }

    pub fn current(&self) -> Option<Revalidation<Post>> {
        mutex_lock(&self.current, SOURCE, "current")
            .as_ref()
            .map(|(_, view)| view.clone())
    }

    pub fn current_id(&self) -> Option<u64> {
        mutex_lock(&self.current, SOURCE, "current_id")
            .as_ref()
            .map(|(id, _)| *id)
    }
}
