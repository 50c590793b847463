use crate::domain::{DirectoryUser, RawContact};
use crate::matching::result::MatchType;
use tracing::{debug, info};

/// Receives progress events from a reconciliation run.
///
/// Every method has an empty default so observers only implement what they
/// need. Events from different batches may interleave when batches run on
/// several workers.
pub trait MatchObserver: Send + Sync {
    fn batch_started(&self, _batch: usize, _contacts: usize, _tokens: usize) {}

    fn batch_resolved(&self, _batch: usize, _exact_users: usize, _pattern_users: usize) {}

    fn contact_matched(
        &self,
        _batch: usize,
        _contact: &RawContact,
        _user: &DirectoryUser,
        _match_type: MatchType,
    ) {
    }

    fn contact_unmatched(&self, _batch: usize, _contact: &RawContact) {}

    fn run_finished(&self, _contacts: usize, _matched: usize) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MatchObserver for NoopObserver {}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn batch_started(&self, batch: usize, contacts: usize, tokens: usize) {
        debug!(batch, contacts, tokens, "processing batch");
    }

    fn batch_resolved(&self, batch: usize, exact_users: usize, pattern_users: usize) {
        debug!(batch, exact_users, pattern_users, "directory lookups finished");
    }

    fn contact_matched(
        &self,
        batch: usize,
        contact: &RawContact,
        user: &DirectoryUser,
        match_type: MatchType,
    ) {
        debug!(
            batch,
            contact = %contact.name,
            user_id = %user.id,
            user_phone = %user.phone_number,
            match_type = match_type.as_str(),
            "contact matched"
        );
    }

    fn contact_unmatched(&self, batch: usize, contact: &RawContact) {
        debug!(batch, contact = %contact.name, "no match");
    }

    fn run_finished(&self, contacts: usize, matched: usize) {
        info!(
            contacts,
            matched,
            unmatched = contacts - matched,
            "reconciliation finished"
        );
    }
}
