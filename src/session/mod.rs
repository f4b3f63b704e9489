//! Conference subscription sessions.
//!
//! A [`SubscriptionSession`] owns one subscription to a conference's event
//! package:
//! - `subscribe` sends the subscription, tagged with a correlation token
//! - `on_document_received` parses and reconciles each pushed document
//! - `unsubscribe` and `on_terminated` take it down
//!
//! A [`SessionRegistry`] lets a transport route documents and completion
//! signals by handle when it drives several conferences at once.
//!
//! # Example
//!
//! ```ignore
//! let (listener, events) = event_channel();
//! let mut session = SubscriptionSession::new(
//!     ConferenceIdentity::new("sip:conf@example.org"),
//!     transport,
//!     listener,
//! );
//!
//! session.subscribe("conf-42")?;
//! session.on_document_received(body)?;
//!
//! for event in events.try_iter() {
//!     println!("{:?}", event);
//! }
//!
//! session.unsubscribe()?;
//! ```

mod handler;
mod registry;
mod types;

pub use handler::SubscriptionSession;
pub use registry::{SessionRegistry, SharedSession};
pub use types::{DocumentOutcome, SessionConfig, SessionState, SessionStats};
