//! Snapshot storage contracts and adapters.

#[cfg(target_arch = "wasm32")]
pub mod local;
pub mod snapshot;
