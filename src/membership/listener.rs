//! Listener capability for membership changes.

use crate::types::ParticipantAddress;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Observer of roster changes for one conference.
///
/// Calls are synchronous and arrive in document order.
pub trait MembershipListener {
    fn participant_added(&mut self, participant: &ParticipantAddress);

    fn participant_removed(&mut self, participant: &ParticipantAddress);

    fn participant_set_admin(&mut self, participant: &ParticipantAddress, is_admin: bool);
}

impl<L: MembershipListener + ?Sized> MembershipListener for Box<L> {
    fn participant_added(&mut self, participant: &ParticipantAddress) {
        (**self).participant_added(participant)
    }

    fn participant_removed(&mut self, participant: &ParticipantAddress) {
        (**self).participant_removed(participant)
    }

    fn participant_set_admin(&mut self, participant: &ParticipantAddress, is_admin: bool) {
        (**self).participant_set_admin(participant, is_admin)
    }
}

/// Membership change, as a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MembershipEvent {
    Added {
        participant: ParticipantAddress,
    },
    Removed {
        participant: ParticipantAddress,
    },
    AdminChanged {
        participant: ParticipantAddress,
        is_admin: bool,
    },
}

impl MembershipEvent {
    /// Participant the event is about.
    pub fn participant(&self) -> &ParticipantAddress {
        match self {
            MembershipEvent::Added { participant }
            | MembershipEvent::Removed { participant }
            | MembershipEvent::AdminChanged { participant, .. } => participant,
        }
    }
}

/// Listener that forwards every call into a channel as a [`MembershipEvent`].
///
/// The channel is unbounded: listener calls must not block or drop events.
#[derive(Clone)]
pub struct ChannelListener {
    sender: Sender<MembershipEvent>,
}

impl ChannelListener {
    pub fn new(sender: Sender<MembershipEvent>) -> Self {
        Self { sender }
    }

    fn forward(&self, event: MembershipEvent) {
        if self.sender.send(event).is_err() {
            debug!("Membership event receiver dropped");
        }
    }
}

impl MembershipListener for ChannelListener {
    fn participant_added(&mut self, participant: &ParticipantAddress) {
        self.forward(MembershipEvent::Added {
            participant: participant.clone(),
        });
    }

    fn participant_removed(&mut self, participant: &ParticipantAddress) {
        self.forward(MembershipEvent::Removed {
            participant: participant.clone(),
        });
    }

    fn participant_set_admin(&mut self, participant: &ParticipantAddress, is_admin: bool) {
        self.forward(MembershipEvent::AdminChanged {
            participant: participant.clone(),
            is_admin,
        });
    }
}

/// Create a channel-backed listener and the receiver for its events.
pub fn event_channel() -> (ChannelListener, Receiver<MembershipEvent>) {
    let (sender, receiver) = unbounded();
    (ChannelListener::new(sender), receiver)
}
