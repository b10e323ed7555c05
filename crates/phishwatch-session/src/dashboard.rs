//! Components of the signed-in view wired to one session and one transport.

use std::sync::Arc;

use phishwatch_api_models::LinkRecord;

use crate::account::AccountFlows;
use crate::api::LinkApi;
use crate::check::CheckWorkflow;
use crate::filter::LinkFilter;
use crate::mutations::MutationDispatcher;
use crate::profile::SessionProfile;
use crate::session::Session;
use crate::sync::LinkSynchronizer;

/// Everything a front end needs to drive the dashboard.
#[derive(Clone)]
pub struct Dashboard {
    session: Session,
    sync: LinkSynchronizer,
    mutations: MutationDispatcher,
    check: CheckWorkflow,
    account: AccountFlows,
}

impl Dashboard {
    /// Wire every component to `session` and `api`.
    pub fn new(session: Session, api: Arc<dyn LinkApi>) -> Self {
        let sync = LinkSynchronizer::new(session.clone(), Arc::clone(&api));
        let mutations = MutationDispatcher::new(session.clone(), Arc::clone(&api), sync.clone());
        let check = CheckWorkflow::new(session.clone(), Arc::clone(&api));
        let account = AccountFlows::new(session.clone(), api);
        Self {
            session,
            sync,
            mutations,
            check,
            account,
        }
    }

    /// Shared session context.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Link synchronizer.
    #[must_use]
    pub const fn sync(&self) -> &LinkSynchronizer {
        &self.sync
    }

    /// Mutation dispatcher.
    #[must_use]
    pub const fn mutations(&self) -> &MutationDispatcher {
        &self.mutations
    }

    /// URL check workflow.
    #[must_use]
    pub const fn check(&self) -> &CheckWorkflow {
        &self.check
    }

    /// Login and registration.
    #[must_use]
    pub const fn account(&self) -> &AccountFlows {
        &self.account
    }

    /// Display profile for the navigation bar.
    #[must_use]
    pub fn profile(&self) -> SessionProfile {
        self.session.profile()
    }

    /// Current collection narrowed by `filter`.
    #[must_use]
    pub fn visible_links(&self, filter: &LinkFilter) -> Vec<LinkRecord> {
        let links = self.sync.links();
        filter.apply(&links).into_iter().cloned().collect()
    }

    /// Start polling for the lifetime of the returned handle.
    #[cfg(not(target_arch = "wasm32"))]
    #[must_use = "dropping the handle stops polling"]
    pub fn mount(&self, period: std::time::Duration) -> crate::poller::PollHandle {
        crate::poller::Poller::start(self.sync.clone(), period)
    }

    /// Start polling for the lifetime of the returned handle.
    #[cfg(target_arch = "wasm32")]
    #[must_use = "dropping the handle stops polling"]
    pub fn mount(&self, period: std::time::Duration) -> crate::browser::IntervalPoller {
        crate::browser::IntervalPoller::start(self.sync.clone(), period)
    }

    /// Explicit logout from the navigation bar.
    pub fn logout(&self) {
        self.sync.detach();
        self.check.close();
        self.session.logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterOption;
    use crate::mutations::MutationOutcome;
    use crate::testing::{Endpoint, FakeBackend, Harness};
    use phishwatch_test_support::fixtures::{profile_token, sample_links};
    use std::time::Duration;

    #[tokio::test]
    async fn mounted_dashboard_reflects_mutations_after_resync() {
        let token = profile_token("ada", "ada@example.com", "");
        let harness = Harness::new(Some(&token), FakeBackend::with_links(sample_links()));
        let dashboard = Dashboard::new(harness.session.clone(), harness.api());
        let handle = dashboard.mount(Duration::from_secs(5));
        harness.wait_for(Endpoint::ListLinks, 1).await;
        tokio::time::timeout(Duration::from_secs(5), async {
            while dashboard.sync().revision() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("initial snapshot");

        let outcome = dashboard
            .mutations()
            .toggle_block("https://bank-secure.example/verify")
            .await;
        assert!(matches!(outcome, MutationOutcome::Applied { .. }));

        let blocked = dashboard.visible_links(&LinkFilter::new("", FilterOption::Blocked));
        assert_eq!(blocked.len(), 3);
        assert_eq!(dashboard.profile().username, "ada");
        drop(handle);
        assert!(!dashboard.sync().is_attached());
    }

    #[tokio::test]
    async fn logout_detaches_and_clears_the_session() {
        let harness = Harness::new(Some("tok"), FakeBackend::with_links(sample_links()));
        let dashboard = Dashboard::new(harness.session.clone(), harness.api());
        dashboard.sync().refresh().await;

        dashboard.logout();
        assert_eq!(harness.token(), None);
        assert_eq!(harness.shell.login_redirects(), 1);
        assert!(!dashboard.sync().is_attached());
        assert!(dashboard.profile().is_empty());
    }
}
