//! Registry routing transport callbacks to sessions.

use crate::error::{EventError, Result};
use crate::transport::TransportHandle;
use crate::types::ConferenceIdentity;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::handler::SubscriptionSession;
use super::types::DocumentOutcome;

/// A session shared between its owner and the registry.
pub type SharedSession = Arc<Mutex<SubscriptionSession>>;

/// Maps conferences and transport handles to their sessions.
///
/// Each session sits behind its own mutex, so documents for one conference
/// are applied one at a time while different conferences proceed
/// independently. Registry locks are never held while a session is locked.
///
/// The session mutex is held while listener callbacks run, and it is not
/// re-entrant: a listener must not call back into the registry (`deliver`,
/// `unsubscribe`, `terminated`, ...) for its own conference from inside a
/// callback, or it deadlocks. Hand such work off to another thread or queue
/// it, e.g. through a [`ChannelListener`](crate::membership::ChannelListener).
pub struct SessionRegistry {
    /// Sessions by conference.
    sessions: RwLock<HashMap<ConferenceIdentity, SharedSession>>,
    /// Conference owning each live transport handle.
    routes: RwLock<HashMap<TransportHandle, ConferenceIdentity>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Register a session. One session per conference.
    pub fn insert(&self, session: SubscriptionSession) -> Result<SharedSession> {
        let identity = session.identity().clone();
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&identity) {
            return Err(EventError::SessionExists(identity));
        }

        let shared = Arc::new(Mutex::new(session));
        sessions.insert(identity, Arc::clone(&shared));
        Ok(shared)
    }

    pub fn get(&self, identity: &ConferenceIdentity) -> Option<SharedSession> {
        self.sessions.read().get(identity).cloned()
    }

    /// Subscribe a registered session and start routing its handle.
    pub fn subscribe(
        &self,
        identity: &ConferenceIdentity,
        token: impl Into<String>,
    ) -> Result<()> {
        let session = self.session(identity)?;
        let handle = {
            let mut session = session.lock();
            session.subscribe(token)?;
            session.transport_handle()
        };

        if let Some(handle) = handle {
            self.routes.write().insert(handle, identity.clone());
        }
        Ok(())
    }

    /// Request termination for a conference.
    ///
    /// Terminated sessions leave the registry, so a conference that is no
    /// longer registered is treated like a terminated session: a no-op.
    pub fn unsubscribe(&self, identity: &ConferenceIdentity) -> Result<()> {
        let Some(session) = self.get(identity) else {
            debug!(conference = %identity, "Unsubscribe for unregistered conference");
            return Ok(());
        };
        let mut session = session.lock();
        session.unsubscribe()
    }

    /// Deliver a document body the transport received for `handle`.
    pub fn deliver(&self, handle: TransportHandle, raw: &[u8]) -> Result<DocumentOutcome> {
        let session = self.route(handle)?;
        let mut session = session.lock();
        session.on_document_received(raw)
    }

    /// Transport completion for `handle`. The session is terminated and
    /// removed from the registry.
    pub fn terminated(&self, handle: TransportHandle) -> Result<()> {
        let identity = self
            .routes
            .write()
            .remove(&handle)
            .ok_or(EventError::UnknownHandle(handle))?;

        let session = self.sessions.write().remove(&identity);
        if let Some(session) = session {
            session.lock().on_terminated();
        }

        debug!(conference = %identity, handle = %handle, "Removed terminated session");
        Ok(())
    }

    /// Remove a session regardless of its state.
    ///
    /// The handle is released once the last reference to the session drops.
    pub fn remove(&self, identity: &ConferenceIdentity) -> Option<SharedSession> {
        let session = self.sessions.write().remove(identity)?;
        self.routes.write().retain(|_, owner| *owner != *identity);
        Some(session)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn session(&self, identity: &ConferenceIdentity) -> Result<SharedSession> {
        self.get(identity)
            .ok_or_else(|| EventError::UnknownConference(identity.clone()))
    }

    fn route(&self, handle: TransportHandle) -> Result<SharedSession> {
        let identity = self
            .routes
            .read()
            .get(&handle)
            .cloned()
            .ok_or(EventError::UnknownHandle(handle))?;
        self.session(&identity)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
