//! Best-effort notifications.
//!
//! Every notification is logged.  If the `WEBHOOK_URL` environment variable
//! holds a URL, it is also POSTed there as `{"content": <message>}` from a
//! detached task.  Delivery failures are logged and otherwise ignored.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Url;
use tokio::task::JoinHandle;

/// Environment variable holding the webhook URL.
pub const WEBHOOK_URL_VAR: &str = "WEBHOOK_URL";

const TIMEOUT: Duration = Duration::from_secs(10);


/// Sends notifications to an optional webhook.
#[derive(Clone, Debug)]
pub struct Notifier {
    webhook: Option<Url>,
    http: reqwest::Client,
}

impl Notifier {
    pub fn new(webhook: Option<Url>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!("{err}; using default HTTP client");
                reqwest::Client::new()
            });
        Self { webhook, http }
    }

    /// Creates notifier posting to URL from the `WEBHOOK_URL` environment
    /// variable.
    ///
    /// If the variable is unset or empty, webhook is disabled.  If it isn’t
    /// a valid URL, a warning is logged and webhook is disabled.
    pub fn from_env() -> Self {
        let url = std::env::var(WEBHOOK_URL_VAR).ok();
        Self::new(parse_webhook(url.as_deref()))
    }

    pub fn webhook(&self) -> Option<&Url> { self.webhook.as_ref() }

    /// Logs `content` and posts it to the webhook.
    ///
    /// Nothing is posted if `content` is empty, webhook is not configured or
    /// there is no Tokio runtime.  Otherwise returns handle of the detached
    /// task doing the delivery; the caller is free to drop it.
    pub fn notify(&self, content: &str) -> Option<JoinHandle<()>> {
        tracing::info!("{content}");
        let url = self.webhook.as_ref().filter(|_| !content.is_empty())?;
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::warn!("not posting notification: {err}");
                return None;
            }
        };
        let request = self
            .http
            .post(url.clone())
            .json(&serde_json::json!({ "content": content }));
        Some(runtime.spawn(async move {
            let result =
                request.send().await.and_then(|resp| resp.error_for_status());
            if let Err(err) = result {
                tracing::warn!("error posting to notify webhook: {err}");
            }
        }))
    }
}


fn parse_webhook(url: Option<&str>) -> Option<Url> {
    let url = url.filter(|url| !url.is_empty())?;
    match Url::parse(url) {
        Ok(url) => Some(url),
        Err(err) => {
            tracing::warn!("invalid {WEBHOOK_URL_VAR} {url:?}: {err}");
            None
        }
    }
}


/// Logs `content` and posts it to webhook configured in the environment.
///
/// See [`Notifier::notify`].  The notifier is created with
/// [`Notifier::from_env`] on first use.
pub fn notify(content: &str) -> Option<JoinHandle<()>> {
    static NOTIFIER: LazyLock<Notifier> = LazyLock::new(Notifier::from_env);
    NOTIFIER.notify(content)
}
