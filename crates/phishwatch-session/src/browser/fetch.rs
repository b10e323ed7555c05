use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use phishwatch_api_models::{
    CheckResponse, ErrorBody, LinkRecord, LoginRequest, LoginResponse, RegisterRequest,
    UrlRequest, paths,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::LinkApi;
use crate::config::{AuthScheme, ClientConfig};
use crate::error::{ClientError, ClientResult};

/// `fetch`-backed [`LinkApi`] for the browser build.
#[derive(Clone, Debug)]
pub struct FetchLinkApi {
    base_url: String,
    auth_scheme: AuthScheme,
}

impl FetchLinkApi {
    /// Transport for the configured backend origin.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            auth_scheme: config.auth_scheme,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: Request, token: &str) -> Request {
        request.header(
            self.auth_scheme.header_name(),
            &self.auth_scheme.header_value(token),
        )
    }

    async fn send(&self, path: &'static str, request: Request) -> ClientResult<Response> {
        debug!(path, "dispatching request");
        let response = request
            .send()
            .await
            .map_err(|err| ClientError::network(format!("request to {path} failed: {err}")))?;
        if response.ok() {
            Ok(response)
        } else {
            Err(classify_problem(response).await)
        }
    }

    async fn post_json<B: Serialize>(
        &self,
        path: &'static str,
        token: Option<&str>,
        body: &B,
    ) -> ClientResult<Response> {
        let mut request = Request::post(&self.url(path));
        if let Some(token) = token {
            request = self.authorize(request, token);
        }
        let request = request
            .json(body)
            .map_err(|err| ClientError::network(format!("failed to encode body: {err}")))?;
        self.send(path, request).await
    }
}

#[async_trait(?Send)]
impl LinkApi for FetchLinkApi {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        let response = self.post_json(paths::LOGIN, None, request).await?;
        decode_json(paths::LOGIN, response).await
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<()> {
        self.post_json(paths::REGISTER, None, request)
            .await
            .map(drop)
    }

    async fn list_links(&self, token: &str) -> ClientResult<Vec<LinkRecord>> {
        let request = self.authorize(Request::get(&self.url(paths::URLS)), token);
        let response = self.send(paths::URLS, request).await?;
        decode_json(paths::URLS, response).await
    }

    async fn toggle_block(&self, token: &str, url: &str) -> ClientResult<()> {
        self.post_json(paths::BLOCK_TOGGLE, Some(token), &UrlRequest::new(url))
            .await
            .map(drop)
    }

    async fn delete_link(&self, token: &str, url: &str) -> ClientResult<()> {
        self.post_json(paths::DELETE_URL, Some(token), &UrlRequest::new(url))
            .await
            .map(drop)
    }

    async fn check_url(&self, token: &str, url: &str) -> ClientResult<CheckResponse> {
        let response = self
            .post_json(paths::CHECK, Some(token), &UrlRequest::new(url))
            .await?;
        decode_json(paths::CHECK, response).await
    }

    async fn delete_account(&self, token: &str) -> ClientResult<()> {
        let request = self.authorize(Request::post(&self.url(paths::DELETE_ACCOUNT)), token);
        self.send(paths::DELETE_ACCOUNT, request).await.map(drop)
    }
}

async fn decode_json<T: DeserializeOwned>(path: &'static str, response: Response) -> ClientResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| ClientError::network(format!("unreadable response from {path}: {err}")))
}

async fn classify_problem(response: Response) -> ClientError {
    let status = response.status();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail().map(str::to_string));
    if status == 401 {
        ClientError::Authentication { message }
    } else {
        ClientError::Request { status, message }
    }
}
