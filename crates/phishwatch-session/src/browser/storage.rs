use gloo::storage::{LocalStorage, Storage};
use tracing::warn;

use crate::config::CREDENTIAL_KEY;
use crate::credentials::{CredentialStore, normalise};
use crate::error::StoreError;

/// Credential kept as a plain string under `authToken` in `localStorage`.
///
/// The value is stored raw (not JSON-encoded) so other pages on the same
/// origin read the same token.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorageCredentialStore;

impl CredentialStore for LocalStorageCredentialStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        LocalStorage::raw()
            .set_item(CREDENTIAL_KEY, token)
            .map_err(|err| StoreError::Unavailable {
                operation: "local_storage.set",
                detail: format!("{err:?}"),
            })
    }

    fn read(&self) -> Option<String> {
        match LocalStorage::raw().get_item(CREDENTIAL_KEY) {
            Ok(value) => normalise(value),
            Err(err) => {
                warn!(detail = ?err, "localStorage read failed");
                None
            }
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        LocalStorage::raw()
            .remove_item(CREDENTIAL_KEY)
            .map_err(|err| StoreError::Unavailable {
                operation: "local_storage.remove",
                detail: format!("{err:?}"),
            })
    }
}
