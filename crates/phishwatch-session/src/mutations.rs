//! Server-side changes to links and the account.
//!
//! # Design
//! - Request then resync: a successful toggle or delete triggers a full
//!   refresh; the local collection is never edited in place.
//! - One mutation per key at a time. The key stays pending until the follow-up
//!   refresh has resolved, so a UI can keep the control disabled for the whole
//!   round trip.
//! - Failures leave local state untouched and are never retried.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::api::LinkApi;
use crate::error::ClientError;
use crate::session::Session;
use crate::shell::Notice;
use crate::sync::{LinkSynchronizer, SyncOutcome};

/// Shown after the account was removed.
pub const ACCOUNT_DELETED: &str = "Account deleted successfully.";
/// Shown when account deletion is rejected.
pub const ACCOUNT_DELETE_FAILED: &str = "Failed to delete account.";
/// Shown when account deletion produced no usable response.
pub const ACCOUNT_DELETE_ERROR: &str = "An error occurred. Please try again.";

/// A change to a single tracked link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkMutation {
    /// Flip the blocked flag.
    ToggleBlock,
    /// Remove the link.
    Delete,
}

impl LinkMutation {
    /// Notice shown when the backend rejects the request.
    #[must_use]
    pub const fn rejected_message(self) -> &'static str {
        match self {
            Self::ToggleBlock => "Failed to update link status.",
            Self::Delete => "Failed to delete the URL.",
        }
    }

    /// Notice shown when no usable response arrived.
    #[must_use]
    pub const fn failed_message(self) -> &'static str {
        match self {
            Self::ToggleBlock => "An error occurred while updating the link status.",
            Self::Delete => "An error occurred while deleting the URL.",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::ToggleBlock => "toggle_block",
            Self::Delete => "delete_link",
        }
    }
}

/// Result of a mutation call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The backend accepted the change; `resync` is the follow-up refresh.
    Applied {
        /// Outcome of the refresh triggered by the change.
        resync: SyncOutcome,
    },
    /// The account is gone and the session was cleared.
    AccountDeleted,
    /// No credential was stored; no request was made.
    NoCredential,
    /// The same key already has a mutation in flight; no request was made.
    Busy,
    /// The input was rejected before any request.
    Invalid(String),
    /// 401: the session was ended.
    AuthFailed,
    /// The backend rejected the change or did not answer.
    Failed(ClientError),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum PendingKey {
    Link(String),
    Account,
}

/// Marks a key pending for as long as it lives.
struct PendingGuard {
    pending: Arc<Mutex<HashSet<PendingKey>>>,
    key: PendingKey,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Issues mutations and keeps the synchronizer informed.
#[derive(Clone)]
pub struct MutationDispatcher {
    session: Session,
    api: Arc<dyn LinkApi>,
    sync: LinkSynchronizer,
    pending: Arc<Mutex<HashSet<PendingKey>>>,
}

impl MutationDispatcher {
    /// Dispatcher that resyncs through `sync`.
    pub fn new(session: Session, api: Arc<dyn LinkApi>, sync: LinkSynchronizer) -> Self {
        Self {
            session,
            api,
            sync,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Flip the blocked flag of `url`, then resync.
    pub async fn toggle_block(&self, url: &str) -> MutationOutcome {
        self.mutate_link(LinkMutation::ToggleBlock, url).await
    }

    /// Delete `url`, then resync.
    pub async fn delete_link(&self, url: &str) -> MutationOutcome {
        self.mutate_link(LinkMutation::Delete, url).await
    }

    /// Delete the signed-in account and end the session.
    pub async fn delete_account(&self) -> MutationOutcome {
        let Some(token) = self.session.require_token() else {
            return MutationOutcome::NoCredential;
        };
        let Some(_guard) = self.claim(PendingKey::Account) else {
            debug!("account deletion already in flight");
            return MutationOutcome::Busy;
        };

        match self.api.delete_account(&token).await {
            Ok(()) => {
                info!("account deleted");
                self.session.notify(Notice::success(ACCOUNT_DELETED));
                self.session.logout();
                MutationOutcome::AccountDeleted
            }
            Err(error) => self.fail(
                "delete_account",
                error,
                ACCOUNT_DELETE_FAILED,
                ACCOUNT_DELETE_ERROR,
            ),
        }
    }

    /// Whether a mutation for `url` (including its resync) is in flight.
    ///
    /// `url` is trimmed the same way the mutation calls trim it.
    #[must_use]
    pub fn is_pending(&self, url: &str) -> bool {
        self.pending_keys()
            .contains(&PendingKey::Link(url.trim().to_string()))
    }

    /// Whether account deletion is in flight.
    #[must_use]
    pub fn is_account_pending(&self) -> bool {
        self.pending_keys().contains(&PendingKey::Account)
    }

    async fn mutate_link(&self, mutation: LinkMutation, url: &str) -> MutationOutcome {
        let url = url.trim();
        if url.is_empty() {
            return MutationOutcome::Invalid("URL is required".to_string());
        }
        let Some(token) = self.session.require_token() else {
            return MutationOutcome::NoCredential;
        };
        let Some(_guard) = self.claim(PendingKey::Link(url.to_string())) else {
            debug!(operation = mutation.as_str(), url, "mutation already in flight");
            return MutationOutcome::Busy;
        };

        let result = match mutation {
            LinkMutation::ToggleBlock => self.api.toggle_block(&token, url).await,
            LinkMutation::Delete => self.api.delete_link(&token, url).await,
        };
        match result {
            Ok(()) => {
                info!(operation = mutation.as_str(), url, "mutation accepted; resyncing");
                let resync = self.sync.refresh().await;
                MutationOutcome::Applied { resync }
            }
            Err(error) => self.fail(
                mutation.as_str(),
                error,
                mutation.rejected_message(),
                mutation.failed_message(),
            ),
        }
    }

    fn fail(
        &self,
        operation: &'static str,
        error: ClientError,
        rejected: &str,
        failed: &str,
    ) -> MutationOutcome {
        match error {
            ClientError::Authentication { .. } => {
                self.session.force_logout();
                MutationOutcome::AuthFailed
            }
            ClientError::Request { status, .. } => {
                warn!(operation, status, "mutation rejected");
                self.session.notify(Notice::error(rejected));
                MutationOutcome::Failed(error)
            }
            _ => {
                warn!(operation, error = %error, "mutation produced no usable response");
                self.session.notify(Notice::error(failed));
                MutationOutcome::Failed(error)
            }
        }
    }

    fn claim(&self, key: PendingKey) -> Option<PendingGuard> {
        self.pending_keys().insert(key.clone()).then(|| PendingGuard {
            pending: Arc::clone(&self.pending),
            key,
        })
    }

    fn pending_keys(&self) -> MutexGuard<'_, HashSet<PendingKey>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
