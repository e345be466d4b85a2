use serde_json::Value;

use super::{BlogClient, Fetched};

/// Backend health endpoint used by the diagnostics view.
pub struct Diagnostics<'a> {
    client: &'a BlogClient,
}

impl<'a> Diagnostics<'a> {
    pub(super) fn new(client: &'a BlogClient) -> Self {
        Self { client }
    }

    /// Whatever `debug-info/` reports, or `None` when it is unreachable. The
    /// endpoint sits at the host root, not under `api/`.
    pub async fn info(&self) -> Fetched<Option<Value>> {
        let client = self.client.clone();
        self.client
            .inner
            .debug_info
            .issue("debug_info", move || async move {
                client
                    .fetcher
                    .read(
                        "diagnostics.info",
                        async {
                            let reply = client.inner.transport.get("debug-info/", &[]).await?;
                            Ok(Some(reply.into_value()))
                        },
                        |_| None,
                    )
                    .await
            })
            .await
    }

    /// `true` when the debug endpoint answered.
    pub async fn is_available(&self) -> bool {
        self.info().await.is_fresh()
    }
}
