//! Signal delivery transport
//!
//! Delivery is a blocking I/O call per subscriber and therefore runs off
//! the thread that generated the event. The trait seam lets tests swap the
//! HTTP client for an in-memory transport.

use crate::notifications::error::{NotificationError, NotificationResult};
use crate::protocol::message::Message;
use async_trait::async_trait;
use std::time::Duration;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Asynchronous delivery of protocol messages to a callback URL
#[async_trait]
pub trait SignalTransport: Send + Sync {
    async fn deliver(&self, url: &str, message: &Message) -> NotificationResult<()>;
}

/// HTTP transport posting messages as JSON
pub struct HttpSignalTransport {
    client: reqwest::Client,
}

impl Default for HttpSignalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpSignalTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[async_trait]
impl SignalTransport for HttpSignalTransport {
    async fn deliver(&self, url: &str, message: &Message) -> NotificationResult<()> {
        let response = self
            .client
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(|e| NotificationError::DeliveryFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(NotificationError::EndpointRejected {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
