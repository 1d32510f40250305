//! Typed host contracts for Berry OS durable state.
//!
//! The window manager never talks to browser storage directly. It persists versioned
//! [`SnapshotEnvelope`] values through the object-safe [`SnapshotStore`] trait, which has an
//! in-memory implementation for tests, a no-op implementation for hosts without storage, and a
//! `localStorage` adapter on `wasm32`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod storage;
pub mod time;

#[cfg(target_arch = "wasm32")]
pub use storage::local::LocalStorageSnapshotStore;
pub use storage::snapshot::{
    build_envelope, load_typed_with, save_typed_with, MemorySnapshotStore, NoopSnapshotStore,
    SnapshotEnvelope, SnapshotStore, SnapshotStoreFuture, DESKTOP_LAYOUT_NAMESPACE,
    DOCK_NAMESPACE, PREFERENCES_NAMESPACE, SNAPSHOT_ENVELOPE_VERSION,
};
pub use time::{next_snapshot_stamp_ms, unix_time_ms_now};
