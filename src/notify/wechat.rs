use std::time::Duration;

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::config::Config;

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    text: TextContent<'a>,
}

#[derive(Debug, Serialize)]
struct TextContent<'a> {
    content: &'a str,
}

/// The webhook answers 200 even for rejected messages; the real verdict is
/// in the errcode field
#[derive(Debug, Deserialize)]
struct WebhookResponse {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// WeChat Work group-robot webhook delivery
#[derive(Debug, Clone)]
pub struct WeChatClient {
    http_client: reqwest::Client,
    webhook_url: String,
    webhook_key: String,
}

impl WeChatClient {
    pub fn new(cfg: &Config) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            webhook_url: cfg.webhook_url.clone(),
            webhook_key: cfg.webhook_key.clone(),
        }
    }

    /// Deliver one text message. Single best-effort attempt; delivery
    /// failures are the caller's to log, never to retry here.
    #[instrument(skip(self, content))]
    pub async fn send_text(&self, content: &str) -> Result<()> {
        let mut url = Url::parse(&self.webhook_url)?;
        url.query_pairs_mut().append_pair("key", &self.webhook_key);

        let message = TextMessage {
            msgtype: "text",
            text: TextContent { content },
        };

        let response = self
            .http_client
            .post(url)
            .json(&message)
            .send()
            .await?
            .error_for_status()?;

        let body: WebhookResponse = response.json().await?;
        if body.errcode != 0 {
            return Err(eyre!(
                "webhook rejected message: errcode={} errmsg={}",
                body.errcode,
                body.errmsg
            ));
        }

        debug!("Webhook message accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_body_matches_the_webhook_wire_format() {
        let message = TextMessage {
            msgtype: "text",
            text: TextContent { content: "hello" },
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"msgtype": "text", "text": {"content": "hello"}})
        );
    }

    #[test]
    fn rejection_codes_deserialize() {
        let body: WebhookResponse =
            serde_json::from_str(r#"{"errcode": 93000, "errmsg": "invalid webhook key"}"#).unwrap();
        assert_eq!(body.errcode, 93000);
        assert_eq!(body.errmsg, "invalid webhook key");

        let ok: WebhookResponse = serde_json::from_str(r#"{"errcode": 0}"#).unwrap();
        assert_eq!(ok.errcode, 0);
        assert!(ok.errmsg.is_empty());
    }
}
