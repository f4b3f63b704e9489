//! Applies membership documents to a listener.

use super::listener::MembershipListener;
use super::resolver::{DefaultIdentityResolver, IdentityResolver};
use crate::types::{ConferenceIdentity, MembershipDocument, MembershipState};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// What a single [`MembershipReconciler::reconcile`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// False when the document described another conference and was skipped.
    pub in_scope: bool,
    pub added: usize,
    pub removed: usize,
    pub admin_updates: usize,
}

/// Stateless diff engine shared by all sessions.
#[derive(Clone)]
pub struct MembershipReconciler {
    resolver: Arc<dyn IdentityResolver>,
}

impl MembershipReconciler {
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { resolver }
    }

    /// Emit listener calls for every record of `doc`, in document order.
    ///
    /// Documents whose entity is not `expected` produce no calls. For each
    /// record, `Deleted` yields a removal only; `Full` yields an add followed by
    /// the admin flag; `Partial` yields the admin flag only.
    pub fn reconcile<L>(
        &self,
        doc: &MembershipDocument,
        expected: &ConferenceIdentity,
        listener: &mut L,
    ) -> ReconcileSummary
    where
        L: MembershipListener + ?Sized,
    {
        let mut summary = ReconcileSummary::default();

        if doc.entity != *expected {
            debug!(
                expected = %expected,
                entity = %doc.entity,
                "Ignoring membership document for another conference"
            );
            return summary;
        }
        summary.in_scope = true;

        for record in &doc.participants {
            let participant = self.resolver.interpret(&record.participant_identity);

            match record.membership_state {
                MembershipState::Deleted => {
                    listener.participant_removed(&participant);
                    summary.removed += 1;
                }
                state => {
                    if state == MembershipState::Full {
                        listener.participant_added(&participant);
                        summary.added += 1;
                    }
                    listener.participant_set_admin(&participant, record.is_admin());
                    summary.admin_updates += 1;
                }
            }
        }

        summary
    }
}

impl Default for MembershipReconciler {
    fn default() -> Self {
        Self::new(Arc::new(DefaultIdentityResolver::new()))
    }
}
