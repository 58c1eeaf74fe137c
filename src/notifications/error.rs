//! Notification Error Types

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("signal delivery to {url} failed: {reason}")]
    DeliveryFailed { url: String, reason: String },

    #[error("subscriber endpoint {url} answered status {status}")]
    EndpointRejected { url: String, status: u16 },
}

/// Result type for notification operations
pub type NotificationResult<T> = Result<T, NotificationError>;
