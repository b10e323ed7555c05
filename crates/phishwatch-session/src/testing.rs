//! In-crate test doubles: a recording shell and a scriptable backend.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use phishwatch_api_models::{
    CheckResponse, LinkRecord, LoginRequest, LoginResponse, RegisterRequest,
};
use tokio::sync::oneshot;

use crate::api::LinkApi;
use crate::credentials::{CredentialStore, MemoryCredentialStore};
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::shell::{Notice, NoticeKind, Shell};

/// A session wired to in-memory doubles.
pub(crate) struct Harness {
    pub(crate) session: Session,
    pub(crate) store: Arc<MemoryCredentialStore>,
    pub(crate) shell: Arc<RecordingShell>,
    pub(crate) backend: Arc<FakeBackend>,
}

impl Harness {
    pub(crate) fn new(token: Option<&str>, backend: FakeBackend) -> Self {
        let store = Arc::new(
            token.map_or_else(MemoryCredentialStore::new, MemoryCredentialStore::with_token),
        );
        let shell = Arc::new(RecordingShell::default());
        Self {
            session: Session::new(store.clone(), shell.clone()),
            store,
            shell,
            backend: Arc::new(backend),
        }
    }

    pub(crate) fn api(&self) -> Arc<dyn LinkApi> {
        self.backend.clone()
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.store.read()
    }

    /// Yield until `endpoint` has been called `calls` times.
    pub(crate) async fn wait_for(&self, endpoint: Endpoint, calls: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.backend.count(endpoint) < calls {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("backend call did not arrive");
    }
}

/// Shell that records everything it is asked to do.
#[derive(Default)]
pub(crate) struct RecordingShell {
    notices: Mutex<Vec<Notice>>,
    login_redirects: Mutex<usize>,
    dashboard_redirects: Mutex<usize>,
}

impl RecordingShell {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn messages(&self, kind: NoticeKind) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|notice| notice.kind == kind)
            .map(|notice| notice.message)
            .collect()
    }

    pub(crate) fn login_redirects(&self) -> usize {
        *self
            .login_redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn dashboard_redirects(&self) -> usize {
        *self
            .dashboard_redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Shell for RecordingShell {
    fn redirect_to_login(&self) {
        *self
            .login_redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn redirect_to_dashboard(&self) {
        *self
            .dashboard_redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

/// Backend endpoints, used to script failures and inspect traffic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Endpoint {
    Login,
    Register,
    ListLinks,
    ToggleBlock,
    DeleteLink,
    Check,
    DeleteAccount,
}

/// One recorded call: the endpoint, the token sent and the URL argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Call {
    pub(crate) endpoint: Endpoint,
    pub(crate) token: Option<String>,
    pub(crate) url: Option<String>,
}

type ListReply = ClientResult<Vec<LinkRecord>>;

/// In-memory backend with the same request semantics as the real service.
///
/// Failures are scripted per endpoint and persist until cleared. Listing and
/// mutation calls can be gated so tests decide when (and in which order) they
/// resolve.
#[derive(Default)]
pub(crate) struct FakeBackend {
    links: Mutex<Vec<LinkRecord>>,
    failures: Mutex<HashMap<Endpoint, ClientError>>,
    calls: Mutex<Vec<Call>>,
    accounts: Mutex<HashMap<String, (String, String)>>,
    list_gates: Mutex<VecDeque<oneshot::Receiver<ListReply>>>,
    mutation_gate: Mutex<Option<oneshot::Receiver<()>>>,
    check_gates: Mutex<VecDeque<oneshot::Receiver<ClientResult<CheckResponse>>>>,
}

impl FakeBackend {
    pub(crate) fn with_links(links: Vec<LinkRecord>) -> Self {
        let backend = Self::default();
        *backend.links.lock().unwrap_or_else(PoisonError::into_inner) = links;
        backend
    }

    pub(crate) fn with_account(self, username: &str, password: &str, token: &str) -> Self {
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(username.to_string(), (password.to_string(), token.to_string()));
        self
    }

    pub(crate) fn links(&self) -> Vec<LinkRecord> {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_links(&self, links: Vec<LinkRecord>) {
        *self.links.lock().unwrap_or_else(PoisonError::into_inner) = links;
    }

    pub(crate) fn fail(&self, endpoint: Endpoint, error: ClientError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(endpoint, error);
    }

    pub(crate) fn recover(&self, endpoint: Endpoint) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&endpoint);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn count(&self, endpoint: Endpoint) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }

    /// Hold the next listing call until the returned sender fires.
    pub(crate) fn gate_next_list(&self) -> oneshot::Sender<ListReply> {
        let (sender, receiver) = oneshot::channel();
        self.list_gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(receiver);
        sender
    }

    /// Hold the next toggle/delete call until the returned sender fires.
    pub(crate) fn gate_next_mutation(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        *self
            .mutation_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(receiver);
        sender
    }

    /// Hold the next check call until the returned sender fires.
    pub(crate) fn gate_next_check(&self) -> oneshot::Sender<ClientResult<CheckResponse>> {
        let (sender, receiver) = oneshot::channel();
        self.check_gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(receiver);
        sender
    }

    fn record(&self, endpoint: Endpoint, token: Option<&str>, url: Option<&str>) -> ClientResult<()> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Call {
                endpoint,
                token: token.map(str::to_string),
                url: url.map(str::to_string),
            });
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&endpoint)
            .cloned()
            .map_or(Ok(()), Err)
    }

    async fn wait_for_mutation_gate(&self) {
        let gate = self
            .mutation_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }

    fn create_account(&self, request: &RegisterRequest) -> bool {
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        let vacant = !accounts.contains_key(&request.username);
        if vacant {
            accounts.insert(
                request.username.clone(),
                (request.password.clone(), format!("token-{}", request.username)),
            );
        }
        drop(accounts);
        vacant
    }

    fn missing(url: &str) -> ClientError {
        ClientError::Request {
            status: 404,
            message: Some(format!("{url} is not tracked")),
        }
    }
}

#[async_trait]
impl LinkApi for FakeBackend {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        self.record(Endpoint::Login, None, None)?;
        let account = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&request.username)
            .cloned();
        match account {
            Some((password, token)) if password == request.password => Ok(LoginResponse { token }),
            _ => Err(ClientError::Authentication {
                message: Some("Invalid credentials".into()),
            }),
        }
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<()> {
        self.record(Endpoint::Register, None, None)?;
        if self.create_account(request) {
            Ok(())
        } else {
            Err(ClientError::Request {
                status: 409,
                message: Some("Username already exists".into()),
            })
        }
    }

    async fn list_links(&self, token: &str) -> ClientResult<Vec<LinkRecord>> {
        self.record(Endpoint::ListLinks, Some(token), None)?;
        let gate = self
            .list_gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(ClientError::network("gate dropped"))),
            None => Ok(self.links()),
        }
    }

    async fn toggle_block(&self, token: &str, url: &str) -> ClientResult<()> {
        let scripted = self.record(Endpoint::ToggleBlock, Some(token), Some(url));
        self.wait_for_mutation_gate().await;
        scripted?;
        let toggled = {
            let mut links = self.links.lock().unwrap_or_else(PoisonError::into_inner);
            let mut matched = false;
            for record in links.iter_mut().filter(|record| record.url == url) {
                record.is_blocked = !record.is_blocked;
                matched = true;
            }
            drop(links);
            matched
        };
        if toggled {
            Ok(())
        } else {
            Err(Self::missing(url))
        }
    }

    async fn delete_link(&self, token: &str, url: &str) -> ClientResult<()> {
        let scripted = self.record(Endpoint::DeleteLink, Some(token), Some(url));
        self.wait_for_mutation_gate().await;
        scripted?;
        let removed = {
            let mut links = self.links.lock().unwrap_or_else(PoisonError::into_inner);
            let before = links.len();
            links.retain(|record| record.url != url);
            links.len() != before
        };
        if removed {
            Ok(())
        } else {
            Err(Self::missing(url))
        }
    }

    async fn check_url(&self, token: &str, url: &str) -> ClientResult<CheckResponse> {
        self.record(Endpoint::Check, Some(token), Some(url))?;
        let gate = self
            .check_gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(ClientError::network("gate dropped"))),
            None => Ok(CheckResponse {
                is_safe: !url.contains("phish"),
            }),
        }
    }

    async fn delete_account(&self, token: &str) -> ClientResult<()> {
        let scripted = self.record(Endpoint::DeleteAccount, Some(token), None);
        self.wait_for_mutation_gate().await;
        scripted?;
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}
