//! Webhook notifications after a deploy

use reqwest::Client;
use tracing::{debug, instrument};

use launchpad_core::Config;

use crate::error::{check_status, Result};
use crate::result::DeploymentResults;

/// Posts `{ "text": ... }` to a chat-style incoming webhook
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }

    /// Notifier for the configured webhook, if notifications are enabled and
    /// the URL variable resolves
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.notify.enabled {
            return None;
        }
        config.env_var(&config.notify.webhook_url_env).map(Self::new)
    }

    /// Whether an outcome should be announced
    pub fn should_notify(config: &Config, success: bool) -> bool {
        if success {
            config.notify.on_success
        } else {
            config.notify.on_failure
        }
    }

    #[instrument(skip(self, text))]
    pub async fn send(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        check_status(response).await?;
        debug!("notification sent");
        Ok(())
    }
}

/// Plain-text summary of a deploy run
pub fn deploy_summary(config: &Config, version: &str, results: &[DeploymentResults]) -> String {
    let ok = results.iter().all(DeploymentResults::success);
    let mut lines = vec![format!(
        "{} {} {}: {}",
        if ok { "✅" } else { "❌" },
        config.app.name,
        version,
        if ok { "deploy succeeded" } else { "deploy failed" }
    )];

    for platform in results {
        for result in &platform.individual {
            let detail = match (&result.error, &result.build_url) {
                (Some(error), _) => error.clone(),
                (None, Some(url)) => url.clone(),
                (None, None) => result.message.clone(),
            };
            lines.push(format!(
                "• {} → {}: {} ({})",
                platform.platform.display_name(),
                result.destination.display_name(),
                if result.success { "ok" } else { "failed" },
                detail
            ));
        }
    }

    lines.join("\n")
}
