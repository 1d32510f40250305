//! Browser `localStorage` adapter for [`SnapshotStore`].

use super::snapshot::{SnapshotEnvelope, SnapshotStore, SnapshotStoreFuture};

const KEY_PREFIX: &str = "berry-os.";

#[derive(Debug, Clone, Copy, Default)]
/// Snapshot store persisting JSON envelopes in `window.localStorage`.
pub struct LocalStorageSnapshotStore;

impl LocalStorageSnapshotStore {
    fn storage() -> Result<web_sys::Storage, String> {
        web_sys::window()
            .ok_or_else(|| "no window".to_string())?
            .local_storage()
            .map_err(|_| "localStorage access denied".to_string())?
            .ok_or_else(|| "localStorage unavailable".to_string())
    }

    fn key(namespace: &str) -> String {
        format!("{KEY_PREFIX}{namespace}")
    }
}

impl SnapshotStore for LocalStorageSnapshotStore {
    fn load_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> SnapshotStoreFuture<'a, Result<Option<SnapshotEnvelope>, String>> {
        Box::pin(async move {
            let raw = Self::storage()?
                .get_item(&Self::key(namespace))
                .map_err(|_| format!("read {namespace} failed"))?;
            match raw {
                Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| e.to_string()),
                None => Ok(None),
            }
        })
    }

    fn save_envelope<'a>(
        &'a self,
        envelope: &'a SnapshotEnvelope,
    ) -> SnapshotStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let raw = serde_json::to_string(envelope).map_err(|e| e.to_string())?;
            Self::storage()?
                .set_item(&Self::key(&envelope.namespace), &raw)
                .map_err(|_| format!("write {} failed (quota?)", envelope.namespace))
        })
    }

    fn delete_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> SnapshotStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            Self::storage()?
                .remove_item(&Self::key(namespace))
                .map_err(|_| format!("delete {namespace} failed"))
        })
    }
}
