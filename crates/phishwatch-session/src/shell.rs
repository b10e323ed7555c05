//! Side effects the core asks the hosting view to perform.
//!
//! The core never renders or navigates itself. It asks the shell to show a
//! notice or to move to the login (or dashboard) view. The browser build maps
//! these to toasts and route changes; the CLI prints and exits.

use std::fmt;

use crate::platform::MaybeSendSync;

/// Severity of a user-visible notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// Informational notice.
    Info,
    /// Confirmation of a completed action.
    Success,
    /// Something failed; local state was left unchanged.
    Error,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

/// A message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity classification.
    pub kind: NoticeKind,
    /// Display message.
    pub message: String,
}

impl Notice {
    /// Informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    /// Success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    /// Error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Navigation and notification hooks supplied by the front end.
pub trait Shell: MaybeSendSync {
    /// Leave the current view for the login flow.
    fn redirect_to_login(&self);

    /// Leave the login/register view for the dashboard.
    fn redirect_to_dashboard(&self) {}

    /// Surface a message to the user.
    fn notify(&self, notice: Notice);
}
