#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the `phishwatch` backend API.
//!
//! These types are used by the session core and the CLI for request/response
//! encoding so the wire contract lives in exactly one place. Field names match
//! the backend verbatim, including the `camelCase` registration fields.
use serde::{Deserialize, Serialize};

/// Route prefix shared by every backend endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Backend endpoint paths.
pub mod paths {
    /// Exchange credentials for a token.
    pub const LOGIN: &str = "/api/v1/login";
    /// Create a new account.
    pub const REGISTER: &str = "/api/v1/register";
    /// List every link recorded for the caller.
    pub const URLS: &str = "/api/v1/urls";
    /// Flip the block flag of one link.
    pub const BLOCK_TOGGLE: &str = "/api/v1/block-toggle";
    /// Remove one link.
    pub const DELETE_URL: &str = "/api/v1/delete-url";
    /// Ask for a safety verdict on a URL.
    pub const CHECK: &str = "/api/v1/check";
    /// Remove the caller's account.
    pub const DELETE_ACCOUNT: &str = "/api/v1/delete-account";
}

/// A link the backend has seen for the current user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkRecord {
    /// Full URL; unique within one listing.
    pub url: String,
    /// Host portion used for searching and display.
    pub domain: String,
    /// Whether the backend judged the link safe.
    pub is_safe: bool,
    /// Whether the user blocked the link.
    pub is_blocked: bool,
}

/// Body for `POST /api/v1/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Plain-text password; hashing is the server's concern.
    pub password: String,
}

/// Response for a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Bearer token to persist for the session.
    pub token: String,
}

/// Body for `POST /api/v1/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Desired account name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Optional avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// Chosen password.
    pub password: String,
    /// Repeat of the chosen password.
    pub confirm_password: String,
}

/// Body shared by the single-URL endpoints (`block-toggle`, `delete-url`, `check`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlRequest {
    /// Target URL.
    pub url: String,
}

impl UrlRequest {
    /// Build a request body for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Verdict returned by `POST /api/v1/check`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResponse {
    /// `true` when the URL is considered safe.
    pub is_safe: bool,
}

/// Error document returned by the backend on failures.
///
/// The backend is not consistent about the field it fills, so both are
/// optional and [`ErrorBody::detail`] picks the first one present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorBody {
    /// Primary error text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Secondary message some endpoints use instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// User-facing detail, preferring `error` over `message`.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}
