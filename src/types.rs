//! Core types for conference membership documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Role label that marks a participant as a conference administrator.
pub const ADMIN_ROLE: &str = "admin";

/// Canonical URI-like identifier naming a conference.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConferenceIdentity(String);

impl ConferenceIdentity {
    /// Create an identity, trimming surrounding whitespace.
    pub fn new(uri: impl AsRef<str>) -> Self {
        ConferenceIdentity(uri.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConferenceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConferenceIdentity({})", self.0)
    }
}

impl fmt::Display for ConferenceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConferenceIdentity {
    fn from(uri: &str) -> Self {
        ConferenceIdentity::new(uri)
    }
}

/// Addressable participant identity, as handed to listeners.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantAddress(String);

impl ParticipantAddress {
    pub fn new(address: impl Into<String>) -> Self {
        ParticipantAddress(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ParticipantAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantAddress({})", self.0)
    }
}

impl fmt::Display for ParticipantAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Membership state of a single participant record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    /// Newly or fully present.
    #[default]
    Full,
    /// Present, but not newly added.
    Partial,
    /// Removed from the conference.
    Deleted,
}

impl MembershipState {
    /// Interpret a `state` attribute value.
    ///
    /// Unknown literals map to `Partial` so one bad record never blocks the rest
    /// of the roster.
    pub fn from_attribute(value: &str) -> Self {
        match value.trim() {
            "full" => MembershipState::Full,
            "deleted" => MembershipState::Deleted,
            _ => MembershipState::Partial,
        }
    }
}

/// State of the whole document (full snapshot or partial update).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    #[default]
    Full,
    Partial,
    Deleted,
}

impl DocumentState {
    pub fn from_attribute(value: &str) -> Self {
        match value.trim() {
            "partial" => DocumentState::Partial,
            "deleted" => DocumentState::Deleted,
            _ => DocumentState::Full,
        }
    }
}

/// One `user` entry of a membership document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// Raw participant entity, not yet interpreted as an address.
    pub participant_identity: String,

    pub membership_state: MembershipState,

    /// Role labels attached to the participant.
    pub roles: BTreeSet<String>,

    /// Human-readable name, if the server sent one.
    pub display_text: Option<String>,
}

impl ParticipantRecord {
    /// Create a record with no roles.
    pub fn new(participant_identity: impl Into<String>, membership_state: MembershipState) -> Self {
        Self {
            participant_identity: participant_identity.into(),
            membership_state,
            roles: BTreeSet::new(),
            display_text: None,
        }
    }

    /// Add a role label.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Whether the record carries the admin role.
    pub fn is_admin(&self) -> bool {
        self.roles.contains(ADMIN_ROLE)
    }
}

/// Parsed membership snapshot pushed by the conference server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipDocument {
    /// Conference the document claims to describe.
    pub entity: ConferenceIdentity,

    /// Document version, when present.
    pub version: Option<u64>,

    pub state: DocumentState,

    /// Participant records in the order received.
    pub participants: Vec<ParticipantRecord>,
}

impl MembershipDocument {
    /// Create an empty full-state document for `entity`.
    pub fn new(entity: ConferenceIdentity) -> Self {
        Self {
            entity,
            version: None,
            state: DocumentState::Full,
            participants: Vec::new(),
        }
    }

    /// Append a participant record.
    pub fn with_participant(mut self, record: ParticipantRecord) -> Self {
        self.participants.push(record);
        self
    }
}
