//! # Conference Events
//!
//! Passive mirror of a remote conference's participant roster, fed by the
//! conference event package.
//!
//! ## Core Concepts
//!
//! - **Sessions**: One subscription per conference, from subscribe to termination
//! - **Documents**: `conference-info` snapshots pushed by the server
//! - **Reconciliation**: Each document becomes added/removed/admin events
//! - **Transport**: Network plumbing stays behind the [`SubscriptionTransport`] trait
//!
//! ## Example
//!
//! ```ignore
//! use conference_events::{event_channel, ConferenceIdentity, SubscriptionSession};
//!
//! let (listener, events) = event_channel();
//! let mut session = SubscriptionSession::new(
//!     ConferenceIdentity::new("sip:conf@example.org"),
//!     transport,
//!     listener,
//! );
//!
//! session.subscribe("conf-42")?;
//!
//! // Called by the transport for every NOTIFY body
//! session.on_document_received(body)?;
//!
//! for event in events.try_iter() {
//!     println!("{:?}", event);
//! }
//! ```

pub mod document;
pub mod error;
pub mod membership;
pub mod session;
pub mod transport;
pub mod types;

// Re-exports
pub use document::{parse, parse_str};
pub use error::{EventError, ParseError, Result};
pub use membership::{
    event_channel, ChannelListener, DefaultIdentityResolver, IdentityResolver, MembershipEvent,
    MembershipListener, MembershipReconciler, ReconcileSummary,
};
pub use session::{
    DocumentOutcome, SessionConfig, SessionRegistry, SessionState, SessionStats, SharedSession,
    SubscriptionSession,
};
pub use transport::{SubscribeRequest, SubscriptionTransport, TransportHandle};
pub use types::*;
