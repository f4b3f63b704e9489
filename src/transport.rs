//! Transport collaborator interface.
//!
//! The transport owns the network side of a subscription: sending the
//! SUBSCRIBE, refreshing it, and delivering NOTIFY bodies. Sessions only hold
//! an opaque [`TransportHandle`] and ask the transport to act on it.

use crate::error::Result;
use crate::types::ConferenceIdentity;
use std::fmt;
use std::time::Duration;

/// Opaque reference to a transport-level subscription.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportHandle(pub u64);

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransportHandle({})", self.0)
    }
}

impl fmt::Display for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters for creating a subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeRequest {
    pub target: ConferenceIdentity,
    pub event_package: String,
    pub expires: Duration,
    /// Internal subscriptions are not surfaced to the application's own
    /// subscription callbacks.
    pub internal: bool,
}

/// Network side of a conference subscription.
///
/// Handles returned by `create_subscription` stay valid until `release` is
/// called for them; sessions call `release` exactly once per handle.
pub trait SubscriptionTransport: Send + Sync {
    fn create_subscription(&self, request: &SubscribeRequest) -> Result<TransportHandle>;

    fn add_correlation_header(&self, handle: TransportHandle, key: &str, value: &str) -> Result<()>;

    fn send(&self, handle: TransportHandle) -> Result<()>;

    /// Ask the peer to end the subscription. Completion is reported later.
    fn terminate(&self, handle: TransportHandle) -> Result<()>;

    /// Drop the session's reference to the handle.
    fn release(&self, handle: TransportHandle);
}
