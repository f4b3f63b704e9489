//! Subscription session for a single conference.

use crate::document;
use crate::error::{EventError, Result};
use crate::membership::{MembershipListener, MembershipReconciler};
use crate::transport::{SubscribeRequest, SubscriptionTransport, TransportHandle};
use crate::types::ConferenceIdentity;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{DocumentOutcome, SessionConfig, SessionState, SessionStats};

/// Watches the membership of one remote conference.
///
/// The session moves through `Idle -> Active -> Terminating -> Terminated`
/// and never goes back. Documents are applied only while `Active`. The
/// transport handle is released exactly once, when the session reaches
/// `Terminated` or when it is dropped.
pub struct SubscriptionSession {
    identity: ConferenceIdentity,
    config: SessionConfig,
    session_token: String,
    state: SessionState,
    /// Held while `Active` or `Terminating`.
    handle: Option<TransportHandle>,
    transport: Arc<dyn SubscriptionTransport>,
    reconciler: MembershipReconciler,
    listener: Box<dyn MembershipListener + Send>,
    stats: SessionStats,
}

impl SubscriptionSession {
    /// Create an idle session for `identity`.
    pub fn new<L>(
        identity: ConferenceIdentity,
        transport: Arc<dyn SubscriptionTransport>,
        listener: L,
    ) -> Self
    where
        L: MembershipListener + Send + 'static,
    {
        Self {
            identity,
            config: SessionConfig::default(),
            session_token: String::new(),
            state: SessionState::Idle,
            handle: None,
            transport,
            reconciler: MembershipReconciler::default(),
            listener: Box::new(listener),
            stats: SessionStats::default(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a reconciler with a custom identity resolver.
    pub fn with_reconciler(mut self, reconciler: MembershipReconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn identity(&self) -> &ConferenceIdentity {
        &self.identity
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Correlation token sent with the subscription. Empty until subscribed.
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub fn transport_handle(&self) -> Option<TransportHandle> {
        self.handle
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    // --- Lifecycle ---

    /// Subscribe to the conference event package, tagged with `token`.
    ///
    /// Only valid from `Idle`. If the transport fails after creating the
    /// subscription, the handle is released and the session stays `Idle`.
    pub fn subscribe(&mut self, token: impl Into<String>) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("subscribe"));
        }

        let token = token.into();
        let request = SubscribeRequest {
            target: self.identity.clone(),
            event_package: self.config.event_package.clone(),
            expires: self.config.expires(),
            internal: self.config.internal,
        };

        let handle = self.transport.create_subscription(&request)?;
        if let Err(e) = self.start(handle, &token) {
            warn!(
                conference = %self.identity,
                handle = %handle,
                error = %e,
                "Subscription could not be sent"
            );
            self.transport.release(handle);
            return Err(e);
        }

        self.session_token = token;
        self.handle = Some(handle);
        self.state = SessionState::Active;

        info!(
            conference = %self.identity,
            handle = %handle,
            token = %self.session_token,
            "Subscribed to conference events"
        );
        Ok(())
    }

    fn start(&self, handle: TransportHandle, token: &str) -> Result<()> {
        self.transport
            .add_correlation_header(handle, &self.config.correlation_header, token)?;
        self.transport.send(handle)
    }

    /// Request termination of the subscription.
    ///
    /// Repeated calls after the first are no-ops, so the transport sees a
    /// single terminate request.
    pub fn unsubscribe(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle => Err(self.invalid("unsubscribe")),
            SessionState::Active => {
                if let Some(handle) = self.handle {
                    self.transport.terminate(handle)?;
                }
                self.state = SessionState::Terminating;
                info!(conference = %self.identity, "Unsubscribing from conference events");
                Ok(())
            }
            SessionState::Terminating | SessionState::Terminated => {
                debug!(
                    conference = %self.identity,
                    state = ?self.state,
                    "Unsubscribe already in progress"
                );
                Ok(())
            }
        }
    }

    /// Transport completion signal: the subscription has ended.
    ///
    /// Accepted from `Active` too, for terminations started by the server.
    pub fn on_terminated(&mut self) {
        match self.state {
            SessionState::Idle => {
                warn!(conference = %self.identity, "Termination signal for idle session");
            }
            SessionState::Terminated => {
                debug!(conference = %self.identity, "Duplicate termination signal");
            }
            SessionState::Active | SessionState::Terminating => {
                self.state = SessionState::Terminated;
                self.release_handle();
                info!(conference = %self.identity, "Conference subscription terminated");
            }
        }
    }

    // --- Documents ---

    /// Parse and apply one membership document delivered by the transport.
    ///
    /// A parse failure is returned as an error but leaves the session active.
    pub fn on_document_received(&mut self, raw: &[u8]) -> Result<DocumentOutcome> {
        if self.state != SessionState::Active {
            self.stats.documents_ignored += 1;
            debug!(
                conference = %self.identity,
                state = ?self.state,
                bytes = raw.len(),
                "Ignoring membership document for inactive session"
            );
            return Ok(DocumentOutcome::Ignored(self.state));
        }

        let doc = match document::parse(raw) {
            Ok(doc) => doc,
            Err(e) => {
                self.stats.parse_failures += 1;
                warn!(
                    conference = %self.identity,
                    error = %e,
                    "Discarding unparsable membership document"
                );
                return Err(e.into());
            }
        };

        let summary = self
            .reconciler
            .reconcile(&doc, &self.identity, self.listener.as_mut());

        if !summary.in_scope {
            self.stats.documents_out_of_scope += 1;
            return Ok(DocumentOutcome::OutOfScope);
        }

        self.stats.record(&summary);
        debug!(
            conference = %self.identity,
            version = ?doc.version,
            records = doc.participants.len(),
            "Applied membership document"
        );
        Ok(DocumentOutcome::Applied(summary))
    }

    fn invalid(&self, operation: &'static str) -> EventError {
        EventError::InvalidState {
            operation,
            state: self.state,
        }
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.transport.release(handle);
        }
    }
}

impl Drop for SubscriptionSession {
    fn drop(&mut self) {
        self.release_handle();
    }
}
