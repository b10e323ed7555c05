//! Explicit session context shared by every component.
//!
//! # Design
//! - Components receive a `Session` instead of reading ambient storage.
//! - The credential has several writers (login, logout, account deletion,
//!   forced logout); each write is a plain last-write-wins replacement.
//! - Decoded profile data is for display only.

use std::sync::Arc;

use tracing::{info, warn};

use crate::credentials::CredentialStore;
use crate::error::StoreError;
use crate::profile::{self, SessionProfile};
use crate::shell::{Notice, Shell};

/// Credential store plus the shell that reacts to session changes.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
    shell: Arc<dyn Shell>,
}

impl Session {
    /// Bundle a store and a shell.
    pub const fn new(store: Arc<dyn CredentialStore>, shell: Arc<dyn Shell>) -> Self {
        Self { store, shell }
    }

    /// Current token without side effects.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.read()
    }

    /// Whether a token is stored. Validity is unknown until the next request.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.store.has_token()
    }

    /// Current token, or a redirect to the login flow when there is none.
    #[must_use]
    pub fn require_token(&self) -> Option<String> {
        let token = self.store.read();
        if token.is_none() {
            info!("no credential present; redirecting to login");
            self.shell.redirect_to_login();
        }
        token
    }

    /// Persist a freshly issued token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store rejects the write.
    pub fn adopt(&self, token: &str) -> Result<(), StoreError> {
        self.store.save(token)?;
        info!("credential stored");
        Ok(())
    }

    /// Explicit logout: forget the token and go to the login flow.
    pub fn logout(&self) {
        self.clear_credential();
        info!("signed out");
        self.shell.redirect_to_login();
    }

    /// Logout triggered by a 401 from any authenticated endpoint.
    pub fn force_logout(&self) {
        warn!("credential rejected by backend; forcing logout");
        self.clear_credential();
        self.shell.redirect_to_login();
    }

    /// Display profile decoded from the stored token (empty when signed out).
    #[must_use]
    pub fn profile(&self) -> SessionProfile {
        self.store
            .read()
            .map(|token| profile::decode(&token))
            .unwrap_or_default()
    }

    /// Forward a notice to the shell.
    pub fn notify(&self, notice: Notice) {
        self.shell.notify(notice);
    }

    /// Ask the shell to show the login flow.
    pub fn redirect_to_login(&self) {
        self.shell.redirect_to_login();
    }

    /// Ask the shell to show the dashboard.
    pub fn redirect_to_dashboard(&self) {
        self.shell.redirect_to_dashboard();
    }

    fn clear_credential(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear stored credential");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::testing::RecordingShell;
    use phishwatch_test_support::fixtures::profile_token;

    fn session_with(token: Option<&str>) -> (Session, Arc<MemoryCredentialStore>, Arc<RecordingShell>) {
        let store = Arc::new(
            token.map_or_else(MemoryCredentialStore::new, MemoryCredentialStore::with_token),
        );
        let shell = Arc::new(RecordingShell::default());
        (Session::new(store.clone(), shell.clone()), store, shell)
    }

    #[test]
    fn require_token_redirects_when_absent() {
        let (session, _, shell) = session_with(None);
        assert_eq!(session.require_token(), None);
        assert_eq!(shell.login_redirects(), 1);
    }

    #[test]
    fn require_token_is_silent_when_present() {
        let (session, _, shell) = session_with(Some("tok"));
        assert_eq!(session.require_token().as_deref(), Some("tok"));
        assert_eq!(shell.login_redirects(), 0);
    }

    #[test]
    fn force_logout_clears_and_redirects() {
        let (session, store, shell) = session_with(Some("tok"));
        session.force_logout();
        assert!(!store.has_token());
        assert_eq!(shell.login_redirects(), 1);
    }

    #[test]
    fn adopt_replaces_previous_token() {
        let (session, store, _) = session_with(Some("old"));
        session.adopt("new").expect("adopt");
        assert_eq!(store.read().as_deref(), Some("new"));
        assert!(session.is_signed_in());
    }

    #[test]
    fn profile_comes_from_the_stored_token() {
        let token = profile_token("ada", "ada@example.com", "");
        let (session, _, _) = session_with(Some(&token));
        assert_eq!(session.profile().username, "ada");

        session.logout();
        assert!(session.profile().is_empty());
    }
}
