//! Application context, terminal shell and error mapping for the CLI.

use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use phishwatch_session::api::LinkApi;
use phishwatch_session::config::ClientConfig;
use phishwatch_session::credentials::CredentialStore;
use phishwatch_session::dashboard::Dashboard;
use phishwatch_session::error::ClientError;
use phishwatch_session::http::HttpLinkApi;
use phishwatch_session::session::Session;
use phishwatch_session::shell::{Notice, NoticeKind, Shell};
use phishwatch_session::sync::{FETCH_FAILED, FETCH_REJECTED, SyncOutcome};
use tracing::debug;

/// Hint printed when a command needs a stored credential.
pub(crate) const LOGIN_HINT: &str = "not signed in; run `phishwatch login` first";
/// Hint printed when the backend ended the session.
pub(crate) const SESSION_ENDED: &str = "session expired; run `phishwatch login` again";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Map a core error, using `fallback` when it carries no user-facing text.
    pub(crate) fn from_client(error: ClientError, fallback: &str) -> Self {
        match error {
            ClientError::Validation { message } => Self::Validation(message),
            other => Self::Failure(anyhow!(other.user_message(fallback))),
        }
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Shell for a terminal session.
///
/// Info and success notices go straight to stderr. Error notices are held so
/// the command can report them once, as its exit message.
#[derive(Debug, Default)]
pub(crate) struct TerminalShell {
    login_required: AtomicBool,
    errors: Mutex<Vec<String>>,
}

impl TerminalShell {
    /// Whether the core asked for the login flow since the last reset.
    pub(crate) fn login_required(&self) -> bool {
        self.login_required.load(Ordering::SeqCst)
    }

    /// Drain held error notices.
    pub(crate) fn take_errors(&self) -> Vec<String> {
        std::mem::take(&mut *self.errors.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Shell for TerminalShell {
    fn redirect_to_login(&self) {
        debug!("login flow requested");
        self.login_required.store(true, Ordering::SeqCst);
    }

    fn redirect_to_dashboard(&self) {
        self.login_required.store(false, Ordering::SeqCst);
    }

    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Error => self
                .errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notice.message),
            NoticeKind::Info | NoticeKind::Success => eprintln!("{}", notice.message),
        }
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) config: ClientConfig,
    pub(crate) session: Session,
    pub(crate) shell: Arc<TerminalShell>,
    pub(crate) dashboard: Dashboard,
}

impl AppContext {
    /// Context talking to the configured backend over HTTP.
    pub(crate) fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> CliResult<Self> {
        let api = HttpLinkApi::new(&config)
            .map_err(|err| CliError::from_client(err, "failed to build HTTP client"))?;
        Ok(Self::with_api(config, store, Arc::new(api)))
    }

    /// Context over an arbitrary transport.
    pub(crate) fn with_api(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        api: Arc<dyn LinkApi>,
    ) -> Self {
        let shell = Arc::new(TerminalShell::default());
        let session = Session::new(store, shell.clone());
        let dashboard = Dashboard::new(session.clone(), api);
        Self {
            config,
            session,
            shell,
            dashboard,
        }
    }

    /// Failure carrying the most recent error notice, or `fallback`.
    pub(crate) fn failure(&self, fallback: &str) -> CliError {
        let message = self
            .shell
            .take_errors()
            .pop()
            .unwrap_or_else(|| fallback.to_string());
        CliError::failure(anyhow!(message))
    }

    /// Convert a refresh outcome into a command result.
    pub(crate) fn settle_sync(&self, outcome: &SyncOutcome) -> CliResult<()> {
        match outcome {
            SyncOutcome::Synced { .. } => Ok(()),
            SyncOutcome::NoCredential => Err(CliError::failure(anyhow!(LOGIN_HINT))),
            SyncOutcome::AuthFailed => Err(CliError::failure(anyhow!(SESSION_ENDED))),
            SyncOutcome::RequestFailed { .. } => Err(self.failure(FETCH_REJECTED)),
            SyncOutcome::TransientError => Err(self.failure(FETCH_FAILED)),
            SyncOutcome::Discarded => Err(CliError::failure(anyhow!("refresh was cancelled"))),
        }
    }
}

/// Parse the backend URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<url::Url, String> {
    phishwatch_session::config::parse_base_url("--api-url", input)
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use httpmock::MockServer;
    use phishwatch_session::credentials::MemoryCredentialStore;
    use std::time::Duration;

    /// Context bound to `server` with an optional stored token.
    pub(crate) fn context_with(server: &MockServer, token: Option<&str>) -> AppContext {
        let store: Arc<dyn CredentialStore> = Arc::new(
            token.map_or_else(MemoryCredentialStore::new, MemoryCredentialStore::with_token),
        );
        let config = ClientConfig {
            base_url: server.base_url().parse().expect("valid URL"),
            poll_interval: Duration::from_millis(50),
            ..ClientConfig::default()
        };
        AppContext::new(config, store).expect("context")
    }

    #[test]
    fn validation_and_failure_exit_codes_differ() {
        let validation = CliError::from_client(ClientError::validation("URL is required"), "x");
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.display_message(), "URL is required");

        let failure = CliError::from_client(
            ClientError::Request {
                status: 409,
                message: Some("Username already exists".into()),
            },
            "Registration failed",
        );
        assert_eq!(failure.exit_code(), 3);
        assert_eq!(failure.display_message(), "Username already exists");

        let network = CliError::from_client(ClientError::network("refused"), "Registration failed");
        assert_eq!(network.display_message(), "Registration failed");
    }

    #[test]
    fn terminal_shell_holds_errors_and_tracks_login_requests() {
        let shell = TerminalShell::default();
        shell.notify(Notice::error("first"));
        shell.notify(Notice::success("printed"));
        shell.notify(Notice::error("second"));
        assert_eq!(shell.take_errors(), vec!["first", "second"]);
        assert!(shell.take_errors().is_empty());

        assert!(!shell.login_required());
        shell.redirect_to_login();
        assert!(shell.login_required());
        shell.redirect_to_dashboard();
        assert!(!shell.login_required());
    }

    #[test]
    fn parse_url_rejects_non_http_schemes() {
        assert!(parse_url("http://127.0.0.1:5000").is_ok());
        assert!(parse_url("ftp://example.com").is_err());
        assert!(parse_url("not a url").is_err());
    }

    #[test]
    fn settle_sync_prefers_the_notice_text() {
        let server = MockServer::start();
        let ctx = context_with(&server, Some("tok"));
        assert!(ctx.settle_sync(&SyncOutcome::Synced { records: 0 }).is_ok());

        ctx.shell.notify(Notice::error(FETCH_FAILED));
        let err = ctx
            .settle_sync(&SyncOutcome::TransientError)
            .expect_err("transient");
        assert_eq!(err.display_message(), FETCH_FAILED);

        let err = ctx
            .settle_sync(&SyncOutcome::NoCredential)
            .expect_err("missing");
        assert_eq!(err.display_message(), LOGIN_HINT);
    }
}
