//! Modal-scoped URL safety check.
//!
//! Each submission is numbered. A response is shown only while its submission
//! is still the latest one and the check has not been closed; otherwise it is
//! dropped (a 401 still ends the session).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::api::LinkApi;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// Shown for any check failure other than a rejected credential.
pub const CHECK_FAILED: &str = "Error checking URL";

/// What the check view displays.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckState {
    /// Closed or not yet submitted.
    #[default]
    Idle,
    /// A request is in flight; the submit control is disabled.
    Checking,
    /// The backend classified the URL as safe.
    Safe,
    /// The backend classified the URL as unsafe.
    Unsafe,
    /// The credential was rejected; the session has been ended.
    AuthError,
    /// The check failed for any other reason.
    GenericError(String),
}

impl CheckState {
    /// Short verdict line, if the state has one.
    #[must_use]
    pub fn verdict(&self) -> Option<&str> {
        match self {
            Self::Safe => Some("Safe URL"),
            Self::Unsafe => Some("Unsafe URL"),
            Self::GenericError(message) => Some(message.as_str()),
            Self::Idle | Self::Checking | Self::AuthError => None,
        }
    }
}

#[derive(Debug, Default)]
struct CheckInner {
    state: CheckState,
    submission: u64,
}

impl CheckInner {
    /// Show `settled` if `submission` is still the latest one; otherwise
    /// return what is shown instead.
    fn settle(&mut self, submission: u64, settled: &CheckState) -> Option<CheckState> {
        if self.submission == submission {
            self.state = settled.clone();
            None
        } else {
            Some(self.state.clone())
        }
    }
}

/// Runs URL checks and tracks the displayed result.
#[derive(Clone)]
pub struct CheckWorkflow {
    session: Session,
    api: Arc<dyn LinkApi>,
    inner: Arc<Mutex<CheckInner>>,
}

impl CheckWorkflow {
    /// Idle workflow.
    pub fn new(session: Session, api: Arc<dyn LinkApi>) -> Self {
        Self {
            session,
            api,
            inner: Arc::new(Mutex::new(CheckInner::default())),
        }
    }

    /// Submit `url` for classification.
    ///
    /// Returns the state this submission settled on, or the current state when
    /// the result was dropped because a newer submission or `close` happened
    /// first.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`] when `url` is blank; the state is unchanged.
    /// - [`ClientError::Authentication`] when no credential is stored; the user is
    ///   sent to the login flow.
    pub async fn check(&self, url: &str) -> ClientResult<CheckState> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ClientError::validation("Please enter a URL"));
        }
        let Some(token) = self.session.require_token() else {
            return Err(ClientError::Authentication { message: None });
        };

        let submission = {
            let mut inner = self.inner();
            inner.submission += 1;
            inner.state = CheckState::Checking;
            inner.submission
        };
        debug!(submission, "checking URL");

        let result = self.api.check_url(&token, url).await;

        let settled = match result {
            Ok(response) if response.is_safe => CheckState::Safe,
            Ok(_) => CheckState::Unsafe,
            Err(ClientError::Authentication { .. }) => {
                self.session.force_logout();
                CheckState::AuthError
            }
            Err(error) => {
                debug!(submission, error = %error, "check failed");
                CheckState::GenericError(CHECK_FAILED.to_string())
            }
        };

        let superseded = self.inner().settle(submission, &settled);
        if let Some(current) = superseded {
            debug!(submission, "dropping superseded check result");
            return Ok(current);
        }
        info!(submission, verdict = ?settled, "check settled");
        Ok(settled)
    }

    /// Reset to `Idle` and drop any result still in flight.
    pub fn close(&self) {
        let mut inner = self.inner();
        inner.submission += 1;
        inner.state = CheckState::Idle;
    }

    /// Currently displayed state.
    #[must_use]
    pub fn state(&self) -> CheckState {
        self.inner().state.clone()
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner().state == CheckState::Checking
    }

    fn inner(&self) -> MutexGuard<'_, CheckInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
