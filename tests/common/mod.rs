//! Shared fixtures for integration tests.

#![allow(dead_code)]

use conference_events::{
    EventError, MembershipListener, ParticipantAddress, Result, SubscribeRequest,
    SubscriptionTransport, TransportHandle,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const CONFERENCE: &str = "sips:conf233@example.com";

/// Route test logs through the libtest writer. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// One call made to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportCall {
    Create(SubscribeRequest),
    Header(TransportHandle, String, String),
    Send(TransportHandle),
    Terminate(TransportHandle),
    Release(TransportHandle),
}

/// In-memory transport that records every call.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    next_id: AtomicU64,
    fail_create: bool,
    fail_header: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport whose `create_subscription` always fails.
    pub fn failing_create() -> Arc<Self> {
        Arc::new(Self {
            fail_create: true,
            ..Default::default()
        })
    }

    /// Transport that rejects correlation headers.
    pub fn failing_header() -> Arc<Self> {
        Arc::new(Self {
            fail_header: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    pub fn terminations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, TransportCall::Terminate(_)))
            .count()
    }

    pub fn releases(&self) -> Vec<TransportHandle> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                TransportCall::Release(h) => Some(*h),
                _ => None,
            })
            .collect()
    }

    pub fn creations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, TransportCall::Create(_)))
            .count()
    }
}

impl SubscriptionTransport for RecordingTransport {
    fn create_subscription(&self, request: &SubscribeRequest) -> Result<TransportHandle> {
        if self.fail_create {
            return Err(EventError::Transport("no route to host".into()));
        }
        let handle = TransportHandle(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.calls.lock().push(TransportCall::Create(request.clone()));
        Ok(handle)
    }

    fn add_correlation_header(
        &self,
        handle: TransportHandle,
        key: &str,
        value: &str,
    ) -> Result<()> {
        if self.fail_header {
            return Err(EventError::Transport("header rejected".into()));
        }
        self.calls
            .lock()
            .push(TransportCall::Header(handle, key.to_string(), value.to_string()));
        Ok(())
    }

    fn send(&self, handle: TransportHandle) -> Result<()> {
        self.calls.lock().push(TransportCall::Send(handle));
        Ok(())
    }

    fn terminate(&self, handle: TransportHandle) -> Result<()> {
        self.calls.lock().push(TransportCall::Terminate(handle));
        Ok(())
    }

    fn release(&self, handle: TransportHandle) {
        self.calls.lock().push(TransportCall::Release(handle));
    }
}

/// Listener call, flattened for assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Added(String),
    Removed(String),
    SetAdmin(String, bool),
}

/// Listener that appends calls to a shared log.
#[derive(Clone, Default)]
pub struct RecordingListener {
    pub calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingListener {
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl MembershipListener for RecordingListener {
    fn participant_added(&mut self, participant: &ParticipantAddress) {
        self.calls.lock().push(Call::Added(participant.to_string()));
    }

    fn participant_removed(&mut self, participant: &ParticipantAddress) {
        self.calls.lock().push(Call::Removed(participant.to_string()));
    }

    fn participant_set_admin(&mut self, participant: &ParticipantAddress, is_admin: bool) {
        self.calls
            .lock()
            .push(Call::SetAdmin(participant.to_string(), is_admin));
    }
}

/// Build a `conference-info` body with the given `user` elements.
pub fn conference_info(entity: &str, users: &[&str]) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<conference-info xmlns="urn:ietf:params:xml:ns:conference-info"
    entity="{}" state="full" version="1">
  <users>
    {}
  </users>
</conference-info>"#,
        entity,
        users.join("\n    ")
    )
    .into_bytes()
}

/// A `user` element with optional roles.
pub fn user(entity: &str, state: &str, roles: &[&str]) -> String {
    let entries: String = roles
        .iter()
        .map(|r| format!("<entry>{}</entry>", r))
        .collect();
    format!(
        r#"<user entity="{}" state="{}"><roles>{}</roles></user>"#,
        entity, state, entries
    )
}
