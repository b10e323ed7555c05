//! Browser adapters: `localStorage` credential store, `fetch` transport and a
//! `setInterval` poller.

mod fetch;
mod poller;
mod storage;

pub use fetch::FetchLinkApi;
pub use poller::IntervalPoller;
pub use storage::LocalStorageCredentialStore;
