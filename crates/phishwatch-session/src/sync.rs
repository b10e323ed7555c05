//! Local copy of the server's link collection.
//!
//! # Design
//! - The synchronizer is the only writer of the collection; every successful
//!   listing replaces it wholesale.
//! - Overlapping refreshes are applied in resolution order (last resolved wins).
//!   Each applied snapshot bumps `revision` and records the sequence number of
//!   the request that produced it.
//! - After `detach` any response still in flight is dropped without touching
//!   the collection, the phase or the shell.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use phishwatch_api_models::LinkRecord;
use tracing::{debug, info, warn};

use crate::api::LinkApi;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::shell::Notice;

/// Shown when the listing endpoint rejects the request.
pub const FETCH_REJECTED: &str = "Failed to fetch links. Please log in again.";
/// Shown when the listing request produced no usable response.
pub const FETCH_FAILED: &str = "An error occurred while fetching links.";

/// Where the synchronizer is in its fetch cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing fetched yet, or detached.
    #[default]
    Idle,
    /// A listing request is in flight.
    Fetching,
    /// The last applied response replaced the collection.
    Synced,
    /// The backend refused the credential; the user was sent to login.
    AuthFailed,
    /// The last request produced no usable response.
    TransientError,
}

/// Result of a single `refresh` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The collection was replaced with `records` entries.
    Synced {
        /// Number of records applied.
        records: usize,
    },
    /// No credential was stored; no request was made.
    NoCredential,
    /// 401: the session was ended.
    AuthFailed,
    /// Another non-2xx status.
    RequestFailed {
        /// HTTP status code.
        status: u16,
    },
    /// No usable response.
    TransientError,
    /// The synchronizer was detached before the response arrived.
    Discarded,
}

#[derive(Debug)]
struct SyncState {
    links: Vec<LinkRecord>,
    phase: SyncPhase,
    last_error: Option<ClientError>,
    revision: u64,
    issued: u64,
    applied_sequence: u64,
    epoch: u64,
    attached: bool,
}

enum Resolution {
    Discarded,
    Applied { records: usize, revision: u64 },
    Failed(ClientError),
}

impl SyncState {
    fn resolve(
        &mut self,
        sequence: u64,
        epoch: u64,
        result: ClientResult<Vec<LinkRecord>>,
    ) -> Resolution {
        if !self.attached || self.epoch != epoch {
            return Resolution::Discarded;
        }
        match result {
            Ok(records) => {
                let count = records.len();
                self.links = records;
                self.phase = SyncPhase::Synced;
                self.last_error = None;
                self.revision += 1;
                self.applied_sequence = sequence;
                Resolution::Applied {
                    records: count,
                    revision: self.revision,
                }
            }
            Err(error) => {
                self.phase = match error {
                    ClientError::Authentication { .. } | ClientError::Request { .. } => {
                        SyncPhase::AuthFailed
                    }
                    _ => SyncPhase::TransientError,
                };
                self.last_error = Some(error.clone());
                Resolution::Failed(error)
            }
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            links: Vec::new(),
            phase: SyncPhase::Idle,
            last_error: None,
            revision: 0,
            issued: 0,
            applied_sequence: 0,
            epoch: 0,
            attached: true,
        }
    }
}

/// Keeps the local link collection in step with the backend.
#[derive(Clone)]
pub struct LinkSynchronizer {
    session: Session,
    api: Arc<dyn LinkApi>,
    state: Arc<Mutex<SyncState>>,
}

impl LinkSynchronizer {
    /// Create an attached synchronizer with an empty collection.
    pub fn new(session: Session, api: Arc<dyn LinkApi>) -> Self {
        Self {
            session,
            api,
            state: Arc::new(Mutex::new(SyncState::default())),
        }
    }

    /// Fetch the collection once and apply the outcome.
    pub async fn refresh(&self) -> SyncOutcome {
        if !self.is_attached() {
            debug!("refresh skipped; synchronizer detached");
            return SyncOutcome::Discarded;
        }
        let Some(token) = self.session.require_token() else {
            return SyncOutcome::NoCredential;
        };

        let (sequence, epoch) = {
            let mut state = self.state();
            state.issued += 1;
            state.phase = SyncPhase::Fetching;
            (state.issued, state.epoch)
        };
        debug!(sequence, "fetching links");

        let result = self.api.list_links(&token).await;

        let resolution = self.state().resolve(sequence, epoch, result);
        match resolution {
            Resolution::Discarded => {
                debug!(sequence, "discarding listing that resolved after detach");
                SyncOutcome::Discarded
            }
            Resolution::Applied { records, revision } => {
                info!(sequence, revision, records, "link snapshot applied");
                SyncOutcome::Synced { records }
            }
            Resolution::Failed(error) => self.report(sequence, &error),
        }
    }

    fn report(&self, sequence: u64, error: &ClientError) -> SyncOutcome {
        match error {
            ClientError::Authentication { .. } => {
                self.session.notify(Notice::error(FETCH_REJECTED));
                self.session.force_logout();
                SyncOutcome::AuthFailed
            }
            ClientError::Request { status, .. } => {
                warn!(sequence, status, "listing rejected");
                self.session.notify(Notice::error(FETCH_REJECTED));
                self.session.redirect_to_login();
                SyncOutcome::RequestFailed { status: *status }
            }
            other => {
                warn!(sequence, error = %other, "listing produced no usable response");
                self.session.notify(Notice::error(FETCH_FAILED));
                SyncOutcome::TransientError
            }
        }
    }

    /// Snapshot of the current collection.
    #[must_use]
    pub fn links(&self) -> Vec<LinkRecord> {
        self.state().links.clone()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        self.state().phase
    }

    /// Error from the most recent failed refresh, cleared on success.
    #[must_use]
    pub fn last_error(&self) -> Option<ClientError> {
        self.state().last_error.clone()
    }

    /// Number of snapshots applied so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.state().revision
    }

    /// Sequence number of the request whose response is currently shown.
    #[must_use]
    pub fn applied_sequence(&self) -> u64 {
        self.state().applied_sequence
    }

    /// Resume applying responses (view mounted).
    pub fn attach(&self) {
        self.state().attached = true;
    }

    /// Stop applying responses (view torn down). In-flight responses are dropped.
    pub fn detach(&self) {
        let mut state = self.state();
        state.attached = false;
        state.epoch += 1;
        state.phase = SyncPhase::Idle;
    }

    /// Whether responses are currently applied.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.state().attached
    }

    /// Session this synchronizer reports to.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::NoticeKind;
    use crate::testing::{Endpoint, FakeBackend, Harness};
    use phishwatch_test_support::fixtures::{link, sample_links};

    fn synced(harness: &Harness) -> LinkSynchronizer {
        LinkSynchronizer::new(harness.session.clone(), harness.api())
    }

    #[tokio::test]
    async fn successful_listing_replaces_the_whole_collection() {
        let harness = Harness::new(Some("tok"), FakeBackend::with_links(sample_links()));
        let sync = synced(&harness);
        assert_eq!(sync.phase(), SyncPhase::Idle);

        assert_eq!(sync.refresh().await, SyncOutcome::Synced { records: 4 });
        assert_eq!(sync.links(), sample_links());

        let replacement = vec![link("http://new.example", "new.example", true, false)];
        harness.backend.set_links(replacement.clone());
        sync.refresh().await;
        assert_eq!(sync.links(), replacement);
        assert_eq!(sync.phase(), SyncPhase::Synced);
        assert_eq!(sync.revision(), 2);

        harness.backend.set_links(Vec::new());
        sync.refresh().await;
        assert!(sync.links().is_empty());
    }

    #[tokio::test]
    async fn the_response_that_resolves_last_wins() {
        let harness = Harness::new(Some("tok"), FakeBackend::default());
        let sync = synced(&harness);
        let older = vec![link("http://older.example", "older.example", true, false)];
        let newer = vec![link("http://newer.example", "newer.example", false, true)];

        let first_gate = harness.backend.gate_next_list();
        let second_gate = harness.backend.gate_next_list();
        let first = tokio::spawn({
            let sync = sync.clone();
            async move { sync.refresh().await }
        });
        harness.wait_for(Endpoint::ListLinks, 1).await;
        let second = tokio::spawn({
            let sync = sync.clone();
            async move { sync.refresh().await }
        });
        harness.wait_for(Endpoint::ListLinks, 2).await;

        second_gate.send(Ok(newer.clone())).expect("second listener");
        assert_eq!(
            second.await.expect("second refresh"),
            SyncOutcome::Synced { records: 1 }
        );
        assert_eq!(sync.links(), newer);
        assert_eq!(sync.applied_sequence(), 2);

        first_gate.send(Ok(older.clone())).expect("first listener");
        first.await.expect("first refresh");
        assert_eq!(sync.links(), older, "issued first but resolved last");
        assert_eq!(sync.applied_sequence(), 1);
        assert_eq!(sync.revision(), 2);
    }

    #[tokio::test]
    async fn unauthorized_listing_notifies_and_logs_out_without_touching_the_collection() {
        let harness = Harness::new(Some("tok"), FakeBackend::with_links(sample_links()));
        let sync = synced(&harness);
        sync.refresh().await;

        harness
            .backend
            .fail(Endpoint::ListLinks, ClientError::Authentication { message: None });
        assert_eq!(sync.refresh().await, SyncOutcome::AuthFailed);
        assert_eq!(sync.links(), sample_links());
        assert_eq!(sync.phase(), SyncPhase::AuthFailed);
        assert_eq!(harness.token(), None);
        assert_eq!(harness.shell.login_redirects(), 1);
        assert_eq!(harness.shell.messages(NoticeKind::Error), vec![FETCH_REJECTED]);
    }

    #[tokio::test]
    async fn rejected_listing_notifies_and_redirects_but_keeps_the_credential() {
        let harness = Harness::new(Some("tok"), FakeBackend::with_links(sample_links()));
        harness.backend.fail(
            Endpoint::ListLinks,
            ClientError::Request {
                status: 500,
                message: None,
            },
        );
        let sync = synced(&harness);

        assert_eq!(
            sync.refresh().await,
            SyncOutcome::RequestFailed { status: 500 }
        );
        assert!(sync.links().is_empty());
        assert_eq!(harness.shell.messages(NoticeKind::Error), vec![FETCH_REJECTED]);
        assert_eq!(harness.shell.login_redirects(), 1);
        assert_eq!(harness.token().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn transport_failure_is_transient_and_recovers_on_next_refresh() {
        let harness = Harness::new(Some("tok"), FakeBackend::with_links(sample_links()));
        let sync = synced(&harness);
        sync.refresh().await;

        harness
            .backend
            .fail(Endpoint::ListLinks, ClientError::network("connection reset"));
        assert_eq!(sync.refresh().await, SyncOutcome::TransientError);
        assert_eq!(sync.links(), sample_links());
        assert_eq!(sync.phase(), SyncPhase::TransientError);
        assert!(sync.last_error().is_some());
        assert_eq!(harness.shell.messages(NoticeKind::Error), vec![FETCH_FAILED]);

        harness.backend.recover(Endpoint::ListLinks);
        assert_eq!(sync.refresh().await, SyncOutcome::Synced { records: 4 });
        assert_eq!(sync.last_error(), None);
    }

    #[tokio::test]
    async fn missing_credential_redirects_without_a_request() {
        let harness = Harness::new(None, FakeBackend::with_links(sample_links()));
        let sync = synced(&harness);

        assert_eq!(sync.refresh().await, SyncOutcome::NoCredential);
        assert_eq!(harness.backend.count(Endpoint::ListLinks), 0);
        assert_eq!(harness.shell.login_redirects(), 1);
    }

    #[tokio::test]
    async fn late_listing_after_detach_is_ignored() {
        let harness = Harness::new(Some("tok"), FakeBackend::default());
        let sync = synced(&harness);
        let gate = harness.backend.gate_next_list();
        let pending = tokio::spawn({
            let sync = sync.clone();
            async move { sync.refresh().await }
        });
        harness.wait_for(Endpoint::ListLinks, 1).await;

        sync.detach();
        gate.send(Ok(sample_links())).expect("listener");
        assert_eq!(pending.await.expect("refresh"), SyncOutcome::Discarded);
        assert!(sync.links().is_empty());
        assert_eq!(sync.phase(), SyncPhase::Idle);
        assert_eq!(sync.revision(), 0);

        assert_eq!(sync.refresh().await, SyncOutcome::Discarded);
        assert_eq!(harness.backend.count(Endpoint::ListLinks), 1);

        sync.attach();
        harness.backend.set_links(sample_links());
        assert_eq!(sync.refresh().await, SyncOutcome::Synced { records: 4 });
    }
}
