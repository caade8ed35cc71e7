//! Delivers composed messages to zoom chat incoming webhooks.
//!
//! Delivery is best effort: failures are logged and counted, never retried and
//! never reported back to the caller.
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    StatusCode,
};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::{metrics::Metrics, zoom_message::ZoomMessage};

/// destination of a webhook request, supplied by the caller through the query string
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct RoutingParams {
    #[serde(rename = "channel-id")]
    pub channel_id: String,
    pub token: String,
}

impl RoutingParams {
    pub fn new(channel_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            token: token.into(),
        }
    }

    /// both the channel id and the token have to be non-empty
    pub fn validate(&self) -> Result<(), DeliveryError> {
        if self.channel_id.is_empty() {
            return Err(DeliveryError::MissingRoute("channel-id"));
        }
        if self.token.is_empty() {
            return Err(DeliveryError::MissingRoute("token"));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("query parameter {0} is missing or empty")]
    MissingRoute(&'static str),
    #[error("chat host {0} can't carry a path")]
    InvalidChatHost(Url),
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook answered with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// sends one message per call
#[async_trait]
pub trait Deliver: Send + Sync {
    /// sends `message` to the channel named in `route`, never fails
    async fn send(&self, message: &ZoomMessage, route: &RoutingParams);
}

/// http client posting to `{chat_host}/incoming/hook/{channel_id}?format=full`
#[derive(Debug, Clone)]
pub struct ZoomClient {
    client: reqwest::Client,
    chat_host: Url,
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl ZoomClient {
    /// # Arguments
    ///
    /// * `chat_host` - base url of the zoom chat api, e.g. `https://inbots.zoom.us`
    ///
    /// * `timeout` - deadline for each webhook request
    ///
    /// * `metrics` - records the status code of every webhook response
    pub fn new(chat_host: Url, timeout: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            client: reqwest::Client::new(),
            chat_host,
            timeout,
            metrics,
        }
    }

    /// webhook url for `channel_id`, the id is encoded as a single path segment
    pub fn hook_url(&self, channel_id: &str) -> Result<Url, DeliveryError> {
        let mut url = self.chat_host.clone();

        url.path_segments_mut()
            .map_err(|_| DeliveryError::InvalidChatHost(self.chat_host.clone()))?
            .pop_if_empty()
            .extend(["incoming", "hook", channel_id]);
        url.set_query(Some("format=full"));

        Ok(url)
    }

    async fn post(&self, url: Url, body: Vec<u8>, token: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, token)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        self.metrics.record_send(status);

        if status != StatusCode::OK {
            // consuming the body releases the connection
            let body = response.text().await.unwrap_or_else(|err| {
                tracing::warn!("failed to read webhook response body: {}", err);
                String::new()
            });

            return Err(DeliveryError::Rejected { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl Deliver for ZoomClient {
    async fn send(&self, message: &ZoomMessage, route: &RoutingParams) {
        if let Err(err) = route.validate() {
            tracing::warn!("skipping delivery: {}", err);
            return;
        }

        let url = match self.hook_url(&route.channel_id) {
            Ok(url) => url,
            Err(err) => {
                tracing::error!("skipping delivery: {}", err);
                return;
            }
        };

        let body = match serde_json::to_vec(message) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(?message, "skipping delivery: {}", DeliveryError::from(err));
                return;
            }
        };

        match self.post(url.clone(), body.clone(), &route.token).await {
            Ok(()) => {
                tracing::debug!(%url, items = message.body().len(), "message delivered");
            }
            Err(err) => {
                tracing::error!(
                    %url,
                    token = %route.token,
                    body = %String::from_utf8_lossy(&body),
                    "failed to deliver message: {}",
                    err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::zoom_message::{BodyItem, HeadColor};

    fn message() -> ZoomMessage {
        ZoomMessage::new(
            HeadColor::Red,
            "disk full (firing) critical".to_owned(),
            "http://am/#/alerts?receiver=ops".to_owned(),
            vec![BodyItem::message("disk at 95% http://runbook".to_owned())],
        )
    }

    fn client(server: &MockServer, metrics: &Arc<Metrics>) -> ZoomClient {
        ZoomClient::new(
            Url::parse(&server.uri()).unwrap(),
            Duration::from_secs(2),
            Arc::clone(metrics),
        )
    }

    #[test]
    fn hook_url_appends_channel_and_format() {
        let client = ZoomClient::new(
            Url::parse("https://inbots.zoom.us").unwrap(),
            Duration::from_secs(1),
            Arc::new(Metrics::unregistered()),
        );

        assert_eq!(
            client.hook_url("abc123").unwrap().as_str(),
            "https://inbots.zoom.us/incoming/hook/abc123?format=full"
        );
        assert_eq!(
            client.hook_url("a/b").unwrap().as_str(),
            "https://inbots.zoom.us/incoming/hook/a%2Fb?format=full"
        );
    }

    #[test]
    fn empty_routing_params_are_invalid() {
        assert!(RoutingParams::new("abc", "tok").validate().is_ok());
        assert!(matches!(
            RoutingParams::new("", "tok").validate(),
            Err(DeliveryError::MissingRoute("channel-id"))
        ));
        assert!(matches!(
            RoutingParams::new("abc", "").validate(),
            Err(DeliveryError::MissingRoute("token"))
        ));
    }

    #[tokio::test]
    async fn posts_message_with_verbatim_token() {
        let server = MockServer::start().await;
        let metrics = Arc::new(Metrics::unregistered());

        Mock::given(method("POST"))
            .and(path("/incoming/hook/abc123"))
            .and(query_param("format", "full"))
            .and(header("Authorization", "tok"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(&message()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, &metrics)
            .send(&message(), &RoutingParams::new("abc123", "tok"))
            .await;

        assert_eq!(metrics.sends_with_code(200), 1);
    }

    #[tokio::test]
    async fn rejected_message_is_counted_not_retried() {
        let server = MockServer::start().await;
        let metrics = Arc::new(Metrics::unregistered());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, &metrics)
            .send(&message(), &RoutingParams::new("abc123", "tok"))
            .await;

        assert_eq!(metrics.sends_with_code(500), 1);
        assert_eq!(metrics.sends_with_code(200), 0);
    }

    #[tokio::test]
    async fn missing_route_skips_delivery() {
        let server = MockServer::start().await;
        let metrics = Arc::new(Metrics::unregistered());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        client(&server, &metrics)
            .send(&message(), &RoutingParams::new("", "tok"))
            .await;

        assert_eq!(metrics.sends_with_code(200), 0);
    }

    #[tokio::test]
    async fn slow_webhook_hits_deadline() {
        let server = MockServer::start().await;
        let metrics = Arc::new(Metrics::unregistered());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = ZoomClient::new(
            Url::parse(&server.uri()).unwrap(),
            Duration::from_millis(200),
            Arc::clone(&metrics),
        );
        let url = client.hook_url("abc123").unwrap();
        let result = client.post(url, b"{}".to_vec(), "tok").await;

        match result {
            Err(DeliveryError::Transport(err)) => assert!(err.is_timeout()),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(metrics.sends_with_code(200), 0);
    }

    #[tokio::test]
    async fn unreachable_host_is_swallowed() {
        let metrics = Arc::new(Metrics::unregistered());
        let client = ZoomClient::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            Duration::from_secs(1),
            Arc::clone(&metrics),
        );

        client
            .send(&message(), &RoutingParams::new("abc123", "tok"))
            .await;

        assert_eq!(metrics.sends_with_code(200), 0);
    }
}
