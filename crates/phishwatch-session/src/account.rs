//! Login, registration and the "already signed in" shortcut.

use std::sync::Arc;

use phishwatch_api_models::{LoginRequest, RegisterRequest};
use tracing::{info, warn};

use crate::api::LinkApi;
use crate::error::{ClientError, ClientResult};
use crate::profile::SessionProfile;
use crate::session::Session;
use crate::shell::Notice;

/// Shown when login fails without a server message.
pub const LOGIN_FAILED: &str = "Invalid username or password";
/// Shown when registration fails without a server message.
pub const REGISTRATION_FAILED: &str = "Registration failed";
/// Shown when the two password fields differ.
pub const PASSWORD_MISMATCH: &str = "Passwords do not match";

/// Account entry points backing the login and register views.
#[derive(Clone)]
pub struct AccountFlows {
    session: Session,
    api: Arc<dyn LinkApi>,
}

impl AccountFlows {
    /// Flows bound to `session`.
    pub const fn new(session: Session, api: Arc<dyn LinkApi>) -> Self {
        Self { session, api }
    }

    /// Send a signed-in user straight to the dashboard.
    ///
    /// Returns `true` when a credential was present.
    pub fn resume(&self) -> bool {
        let signed_in = self.session.is_signed_in();
        if signed_in {
            self.session.redirect_to_dashboard();
        }
        signed_in
    }

    /// Exchange credentials for a token and store it.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`] when a field is blank; nothing is sent.
    /// - Any transport error from the backend, after an error notice.
    /// - [`ClientError::Storage`] when the token cannot be persisted.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<SessionProfile> {
        let username = username.trim();
        require(username, "Username is required")?;
        require(password, "Password is required")?;

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = match self.api.login(&request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "login rejected");
                self.session
                    .notify(Notice::error(error.user_message(LOGIN_FAILED)));
                return Err(error);
            }
        };

        self.session.adopt(&response.token)?;
        info!("signed in");
        self.session.redirect_to_dashboard();
        Ok(self.session.profile())
    }

    /// Create an account. Does not sign in; the caller is sent to the login flow.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`] for a blank required field or mismatched
    ///   passwords; nothing is sent.
    /// - Any transport error from the backend, after an error notice.
    pub async fn register(&self, mut form: RegisterRequest) -> ClientResult<()> {
        form.username = form.username.trim().to_string();
        form.email = form.email.trim().to_string();
        require(&form.username, "Username is required")?;
        require(&form.email, "Email is required")?;
        require(&form.password, "Password is required")?;
        require(&form.confirm_password, "Confirmation is required")?;
        if form.password != form.confirm_password {
            return Err(ClientError::validation(PASSWORD_MISMATCH));
        }
        form.profile_image = form
            .profile_image
            .map(|image| image.trim().to_string())
            .filter(|image| !image.is_empty());

        if let Err(error) = self.api.register(&form).await {
            warn!(error = %error, "registration rejected");
            self.session
                .notify(Notice::error(error.user_message(REGISTRATION_FAILED)));
            return Err(error);
        }
        info!(username = %form.username, "account registered");
        self.session.redirect_to_login();
        Ok(())
    }
}

fn require(value: &str, message: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        Err(ClientError::validation(message))
    } else {
        Ok(())
    }
}
