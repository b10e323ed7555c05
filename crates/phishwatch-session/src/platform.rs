//! Thread-safety bounds that differ between native and wasm32 builds.
//!
//! Native front ends run the core on a multi-threaded runtime, so injected
//! collaborators must be `Send + Sync`. The browser is single-threaded and its
//! `fetch` futures are not `Send`, so the bound disappears there.

/// `Send + Sync` on native targets, no bound on wasm32.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

/// `Send + Sync` on native targets, no bound on wasm32.
#[cfg(target_arch = "wasm32")]
pub trait MaybeSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSendSync for T {}
