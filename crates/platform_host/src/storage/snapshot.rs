//! Versioned snapshot envelopes and the storage contract behind them.

use std::{cell::RefCell, collections::BTreeMap, future::Future, pin::Pin, rc::Rc};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Version for [`SnapshotEnvelope`] metadata serialization.
pub const SNAPSHOT_ENVELOPE_VERSION: u32 = 1;
/// Namespace holding the persisted window layout.
pub const DESKTOP_LAYOUT_NAMESPACE: &str = "system.desktop.layout";
/// Namespace holding the pinned dock order.
pub const DOCK_NAMESPACE: &str = "system.desktop.dock";
/// Namespace holding desktop preferences.
pub const PREFERENCES_NAMESPACE: &str = "system.desktop.preferences";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Versioned envelope wrapped around every persisted payload.
pub struct SnapshotEnvelope {
    /// Envelope schema version.
    pub envelope_version: u32,
    /// Namespace the payload belongs to.
    pub namespace: String,
    /// Payload schema version, owned by the writer.
    pub schema_version: u32,
    /// Last update time in unix milliseconds.
    pub updated_at_unix_ms: u64,
    /// Serialized payload.
    pub payload: Value,
}

impl SnapshotEnvelope {
    /// Creates an envelope stamped with a monotonic timestamp.
    pub fn new(namespace: impl Into<String>, schema_version: u32, payload: Value) -> Self {
        Self {
            envelope_version: SNAPSHOT_ENVELOPE_VERSION,
            namespace: namespace.into(),
            schema_version,
            updated_at_unix_ms: crate::time::next_snapshot_stamp_ms(),
            payload,
        }
    }
}

/// Object-safe boxed future used by [`SnapshotStore`] methods.
pub type SnapshotStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Durable key/value storage for snapshot envelopes, keyed by namespace.
pub trait SnapshotStore {
    /// Loads the envelope stored under `namespace`.
    fn load_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> SnapshotStoreFuture<'a, Result<Option<SnapshotEnvelope>, String>>;

    /// Stores `envelope` under its own namespace, replacing any previous value.
    fn save_envelope<'a>(
        &'a self,
        envelope: &'a SnapshotEnvelope,
    ) -> SnapshotStoreFuture<'a, Result<(), String>>;

    /// Removes whatever is stored under `namespace`.
    fn delete_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> SnapshotStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Store that never persists anything; used when storage is unavailable.
pub struct NoopSnapshotStore;

impl SnapshotStore for NoopSnapshotStore {
    fn load_envelope<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> SnapshotStoreFuture<'a, Result<Option<SnapshotEnvelope>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_envelope<'a>(
        &'a self,
        _envelope: &'a SnapshotEnvelope,
    ) -> SnapshotStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_envelope<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> SnapshotStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory store; clones share the same backing map.
pub struct MemorySnapshotStore {
    inner: Rc<RefCell<BTreeMap<String, SnapshotEnvelope>>>,
}

impl MemorySnapshotStore {
    /// Namespaces currently holding a value, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        self.inner.borrow().keys().cloned().collect()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> SnapshotStoreFuture<'a, Result<Option<SnapshotEnvelope>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().get(namespace).cloned()) })
    }

    fn save_envelope<'a>(
        &'a self,
        envelope: &'a SnapshotEnvelope,
    ) -> SnapshotStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .insert(envelope.namespace.clone(), envelope.clone());
            Ok(())
        })
    }

    fn delete_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> SnapshotStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(namespace);
            Ok(())
        })
    }
}

/// Serializes `payload` into a fresh envelope.
///
/// # Errors
///
/// Returns an error when `payload` cannot be converted to JSON.
pub fn build_envelope<T: Serialize>(
    namespace: &str,
    schema_version: u32,
    payload: &T,
) -> Result<SnapshotEnvelope, String> {
    let payload = serde_json::to_value(payload).map_err(|e| e.to_string())?;
    Ok(SnapshotEnvelope::new(namespace, schema_version, payload))
}

/// Serializes and saves a typed payload through any [`SnapshotStore`].
///
/// # Errors
///
/// Returns an error when serialization or the store save fails.
pub async fn save_typed_with<S: SnapshotStore + ?Sized, T: Serialize>(
    store: &S,
    namespace: &str,
    schema_version: u32,
    payload: &T,
) -> Result<(), String> {
    let envelope = build_envelope(namespace, schema_version, payload)?;
    store.save_envelope(&envelope).await
}

/// Loads a typed payload, treating envelopes written by a newer schema as absent.
///
/// # Errors
///
/// Returns an error when the store fails or the payload does not decode.
pub async fn load_typed_with<S: SnapshotStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    namespace: &str,
    max_schema_version: u32,
) -> Result<Option<T>, String> {
    let Some(envelope) = store.load_envelope(namespace).await? else {
        return Ok(None);
    };
    if envelope.envelope_version != SNAPSHOT_ENVELOPE_VERSION
        || envelope.schema_version > max_schema_version
    {
        return Ok(None);
    }
    serde_json::from_value(envelope.payload)
        .map(Some)
        .map_err(|e| e.to_string())
}
