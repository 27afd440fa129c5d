use gov_relayer_store::ActionKind;
use gov_relayer_types::rpc_url::RpcUrl;

/// Pings an operator webhook when an action is committed.
///
/// The message is appended to the configured url, which usually ends in a
/// query parameter such as `...sendMessage?chat_id=1&text=`.
#[derive(Debug, Clone)]
pub struct NotificationHook {
    client: reqwest::Client,
    url: RpcUrl,
}

impl NotificationHook {
    pub fn new(client: reqwest::Client, url: RpcUrl) -> Self {
        Self { client, url }
    }

    pub fn message(kind: ActionKind) -> &'static str {
        match kind {
            ActionKind::Vote => "New vote signature",
            ActionKind::Delegate => "New delegation signature",
        }
    }

    /// Best effort. Failures are logged and dropped.
    pub async fn notify(&self, kind: ActionKind) {
        let target = format!("{}{}", self.url.as_url(), Self::message(kind));
        let result = self
            .client
            .get(&target)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        if let Err(e) = result {
            tracing::warn!(%kind, "Failed to deliver notification: {e}");
        }
    }
}
