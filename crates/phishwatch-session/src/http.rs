//! Native HTTP transport built on `reqwest`.

use async_trait::async_trait;
use phishwatch_api_models::{
    CheckResponse, ErrorBody, LinkRecord, LoginRequest, LoginResponse, RegisterRequest,
    UrlRequest, paths,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::api::LinkApi;
use crate::config::{AuthScheme, ClientConfig};
use crate::error::{ClientError, ClientResult};

/// Correlation header attached to every request.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// `reqwest`-backed [`LinkApi`].
#[derive(Clone, Debug)]
pub struct HttpLinkApi {
    client: Client,
    base_url: Url,
    auth_scheme: AuthScheme,
}

impl HttpLinkApi {
    /// Build a client from configuration with a fresh request id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Self::with_request_id(config, &Uuid::new_v4().to_string())
    }

    /// Build a client that tags every request with `request_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] if the id is not a valid header value or
    /// the HTTP client cannot be constructed.
    pub fn with_request_id(config: &ClientConfig, request_id: &str) -> ClientResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(request_id)
            .map_err(|_| ClientError::network("request identifier contains invalid characters"))?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|err| ClientError::network(format!("failed to build HTTP client: {err}")))?;

        Ok(Self::with_client(
            client,
            config.base_url.clone(),
            config.auth_scheme,
        ))
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url, auth_scheme: AuthScheme) -> Self {
        Self {
            client,
            base_url,
            auth_scheme,
        }
    }

    /// Backend origin.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `path` is appended to the base so a path prefix on the backend URL is kept.
    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|err| ClientError::network(format!("invalid endpoint URL: {err}")))
    }

    fn authorize(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.header(
            self.auth_scheme.header_name(),
            self.auth_scheme.header_value(token),
        )
    }

    async fn send(&self, path: &'static str, builder: RequestBuilder) -> ClientResult<Response> {
        debug!(path, "dispatching request");
        let response = builder
            .send()
            .await
            .map_err(|err| ClientError::network(format!("request to {path} failed: {err}")))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            let error = classify_problem(response).await;
            debug!(path, error = %error, "request rejected");
            Err(error)
        }
    }

    async fn post_url(&self, path: &'static str, token: &str, url: &str) -> ClientResult<Response> {
        let builder = self
            .authorize(self.client.post(self.endpoint(path)?), token)
            .json(&UrlRequest::new(url));
        self.send(path, builder).await
    }
}

#[async_trait]
impl LinkApi for HttpLinkApi {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        let builder = self.client.post(self.endpoint(paths::LOGIN)?).json(request);
        let response = self.send(paths::LOGIN, builder).await?;
        decode_json(paths::LOGIN, response).await
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<()> {
        let builder = self
            .client
            .post(self.endpoint(paths::REGISTER)?)
            .json(request);
        self.send(paths::REGISTER, builder).await.map(drop)
    }

    async fn list_links(&self, token: &str) -> ClientResult<Vec<LinkRecord>> {
        let builder = self.authorize(self.client.get(self.endpoint(paths::URLS)?), token);
        let response = self.send(paths::URLS, builder).await?;
        decode_json(paths::URLS, response).await
    }

    async fn toggle_block(&self, token: &str, url: &str) -> ClientResult<()> {
        self.post_url(paths::BLOCK_TOGGLE, token, url).await.map(drop)
    }

    async fn delete_link(&self, token: &str, url: &str) -> ClientResult<()> {
        self.post_url(paths::DELETE_URL, token, url).await.map(drop)
    }

    async fn check_url(&self, token: &str, url: &str) -> ClientResult<CheckResponse> {
        let response = self.post_url(paths::CHECK, token, url).await?;
        decode_json(paths::CHECK, response).await
    }

    async fn delete_account(&self, token: &str) -> ClientResult<()> {
        let builder = self.authorize(
            self.client.post(self.endpoint(paths::DELETE_ACCOUNT)?),
            token,
        );
        self.send(paths::DELETE_ACCOUNT, builder).await.map(drop)
    }
}

async fn decode_json<T: DeserializeOwned>(path: &'static str, response: Response) -> ClientResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| ClientError::network(format!("unreadable response from {path}: {err}")))
}

/// Classify a non-2xx response.
pub(crate) async fn classify_problem(response: Response) -> ClientError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.detail().map(str::to_string))
        .or_else(|| {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            (!text.is_empty() && !text.starts_with('{') && !text.starts_with('<')).then_some(text)
        });

    if status == StatusCode::UNAUTHORIZED {
        ClientError::Authentication { message }
    } else {
        ClientError::Request {
            status: status.as_u16(),
            message,
        }
    }
}
