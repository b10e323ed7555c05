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
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::redundant_pub_crate)]
//! Client core for `phishwatch`: session handling and link-state synchronisation.
//!
//! Everything here is DOM-free. Front ends inject a [`credentials::CredentialStore`]
//! and a [`shell::Shell`] and then drive the components:
//! - [`sync::LinkSynchronizer`] owns the local link collection (full snapshot replace).
//! - [`mutations::MutationDispatcher`] issues toggle/delete requests and resyncs.
//! - [`check::CheckWorkflow`] runs the modal-scoped URL safety check.
//! - [`account::AccountFlows`] covers login and registration.
//!
//! Native builds ship a `reqwest` transport and a `tokio` poller; wasm32 builds
//! ship `localStorage`, `fetch` and `setInterval` adapters in `browser`.

pub mod account;
pub mod api;
pub mod check;
pub mod config;
pub mod credentials;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod mutations;
pub mod platform;
pub mod profile;
pub mod session;
pub mod shell;
pub mod sync;

#[cfg(not(target_arch = "wasm32"))]
pub mod http;
#[cfg(not(target_arch = "wasm32"))]
pub mod poller;

#[cfg(target_arch = "wasm32")]
pub mod browser;

#[cfg(all(test, not(target_arch = "wasm32")))]
pub(crate) mod testing;

pub use phishwatch_api_models::LinkRecord;
