//! Membership reconciliation.
//!
//! A [`MembershipReconciler`] turns one parsed document into listener calls:
//! - `deleted` records become `participant_removed`
//! - `full` records become `participant_added` followed by `participant_set_admin`
//! - any other record becomes `participant_set_admin` alone
//!
//! Listeners either implement [`MembershipListener`] directly or receive
//! [`MembershipEvent`] messages through a [`ChannelListener`].
//!
//! # Example
//!
//! ```ignore
//! let (listener, events) = event_channel();
//! let mut listener = listener;
//! let reconciler = MembershipReconciler::default();
//!
//! let doc = parse(body)?;
//! reconciler.reconcile(&doc, &conference, &mut listener);
//!
//! for event in events.try_iter() {
//!     println!("{:?}", event);
//! }
//! ```

mod listener;
mod reconciler;
mod resolver;

pub use listener::{event_channel, ChannelListener, MembershipEvent, MembershipListener};
pub use reconciler::{MembershipReconciler, ReconcileSummary};
pub use resolver::{DefaultIdentityResolver, IdentityResolver};
