//! Transport seam between the core and the backend.
//!
//! Implementations translate transport outcomes into [`ClientError`]:
//! 401 becomes [`ClientError::Authentication`], any other non-2xx becomes
//! [`ClientError::Request`], and a missing or unreadable response becomes
//! [`ClientError::Network`].

use async_trait::async_trait;
use phishwatch_api_models::{CheckResponse, LinkRecord, LoginRequest, LoginResponse, RegisterRequest};

use crate::error::ClientResult;
use crate::platform::MaybeSendSync;

/// Backend operations used by the client.
///
/// Authenticated calls take the token explicitly; the transport decides how it
/// travels (see [`crate::config::AuthScheme`]).
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait LinkApi: MaybeSendSync {
    /// `POST /api/v1/login`.
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse>;

    /// `POST /api/v1/register`.
    async fn register(&self, request: &RegisterRequest) -> ClientResult<()>;

    /// `GET /api/v1/urls`.
    async fn list_links(&self, token: &str) -> ClientResult<Vec<LinkRecord>>;

    /// `POST /api/v1/block-toggle`.
    async fn toggle_block(&self, token: &str, url: &str) -> ClientResult<()>;

    /// `POST /api/v1/delete-url`.
    async fn delete_link(&self, token: &str, url: &str) -> ClientResult<()>;

    /// `POST /api/v1/check`.
    async fn check_url(&self, token: &str, url: &str) -> ClientResult<CheckResponse>;

    /// `POST /api/v1/delete-account`.
    async fn delete_account(&self, token: &str) -> ClientResult<()>;
}
