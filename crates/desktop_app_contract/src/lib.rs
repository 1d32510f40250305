//! Shared contract types between the Berry OS window manager runtime and installed apps.
//!
//! Apps are described by immutable [`AppDefinition`] values collected into an [`AppRegistry`]
//! at boot. Instance and lifetime behavior is carried as tagged [`AppPolicy`] values rather
//! than per-app types, so singleton, multi-instance and headless apps all flow through the
//! same manager code paths.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum allowed managed window width.
pub const MIN_WINDOW_WIDTH: i32 = 220;
/// Minimum allowed managed window height.
pub const MIN_WINDOW_HEIGHT: i32 = 140;

/// Stable identifier for an installed application (for example `finder`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Returns an app identifier when `raw` is a lowercase kebab-case slug.
    pub fn new(raw: impl Into<String>) -> Result<Self, RegistryError> {
        let raw = raw.into();
        if is_valid_application_id(&raw) {
            Ok(Self(raw))
        } else {
            Err(RegistryError::InvalidId(raw))
        }
    }

    /// Returns the string form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creates an id without validation for compile-time trusted constants.
    pub fn trusted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ApplicationId {
    type Error = RegistryError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ApplicationId> for String {
    fn from(id: ApplicationId) -> Self {
        id.0
    }
}

fn is_valid_application_id(raw: &str) -> bool {
    if raw.is_empty() || raw.len() > 64 {
        return false;
    }
    let bytes = raw.as_bytes();
    if !bytes[0].is_ascii_lowercase() || raw.ends_with('-') || raw.contains("--") {
        return false;
    }
    bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

/// Window bounds in desktop pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub w: i32,
    /// Height.
    pub h: i32,
}

impl WindowRect {
    /// Creates a rectangle from its origin and size.
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Returns the rectangle translated by `dx`/`dy`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Returns the rectangle grown to at least `min_w` x `min_h`.
    pub fn clamped_min(self, min_w: i32, min_h: i32) -> Self {
        Self {
            w: self.w.max(min_w),
            h: self.h.max(min_h),
            ..self
        }
    }
}

impl Default for WindowRect {
    fn default() -> Self {
        Self {
            x: 48,
            y: 48,
            w: 420,
            h: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
/// How many processes of an app may run at once.
pub enum InstancePolicy {
    /// Only one process system-wide; launching again focuses it.
    Singleton,
    /// Each launch creates a new process.
    #[default]
    MultiInstance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
/// What happens to a process when its last window closes.
pub enum LifetimePolicy {
    /// The process quits with its last window.
    #[default]
    QuitWithLastWindow,
    /// The process keeps running headless with no windows.
    AllowsZeroWindows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
/// Per-app manager policy.
pub struct AppPolicy {
    /// Instance policy.
    pub instance: InstancePolicy,
    /// Lifetime policy.
    pub lifetime: LifetimePolicy,
}

impl AppPolicy {
    /// Builds a policy from the boolean manifest flags.
    pub const fn from_flags(singleton: bool, allows_zero_windows: bool) -> Self {
        Self {
            instance: if singleton {
                InstancePolicy::Singleton
            } else {
                InstancePolicy::MultiInstance
            },
            lifetime: if allows_zero_windows {
                LifetimePolicy::AllowsZeroWindows
            } else {
                LifetimePolicy::QuitWithLastWindow
            },
        }
    }

    /// Whether only one process of the app may run.
    pub const fn singleton(self) -> bool {
        matches!(self.instance, InstancePolicy::Singleton)
    }

    /// Whether the app survives with no open windows.
    pub const fn allows_zero_windows(self) -> bool {
        matches!(self.lifetime, LifetimePolicy::AllowsZeroWindows)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Immutable description of an installed application.
pub struct AppDefinition {
    /// Stable app id.
    pub id: ApplicationId,
    /// Human-readable name.
    pub display_name: String,
    /// Icon reference resolved by the UI layer.
    pub icon_ref: String,
    /// Bounds used for windows opened without explicit geometry.
    pub default_bounds: WindowRect,
    /// Instance and lifetime policy.
    pub policy: AppPolicy,
    /// Whether the app may appear in the dock at all.
    pub show_in_dock: bool,
    /// Whether the app is pinned in a fresh dock.
    pub pinned_by_default: bool,
    /// Sort hint for the default pinned order.
    pub dock_order: u32,
}

impl AppDefinition {
    /// Creates a multi-instance, quit-with-last-window definition with default bounds.
    pub fn new(id: ApplicationId, display_name: impl Into<String>) -> Self {
        let icon_ref = id.as_str().to_string();
        Self {
            id,
            display_name: display_name.into(),
            icon_ref,
            default_bounds: WindowRect::default(),
            policy: AppPolicy::default(),
            show_in_dock: true,
            pinned_by_default: false,
            dock_order: u32::MAX,
        }
    }

    /// Replaces the app policy.
    pub fn with_policy(mut self, policy: AppPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the default window bounds.
    pub fn with_default_bounds(mut self, bounds: WindowRect) -> Self {
        self.default_bounds = bounds;
        self
    }

    /// Pins the app by default at `dock_order`.
    pub fn pinned_at(mut self, dock_order: u32) -> Self {
        self.pinned_by_default = true;
        self.dock_order = dock_order;
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors raised while building an [`AppRegistry`].
pub enum RegistryError {
    /// An app id did not match the slug policy.
    #[error("invalid application id `{0}`; expected a lowercase kebab-case slug")]
    InvalidId(String),
    /// Two definitions shared the same id.
    #[error("duplicate application id `{0}`")]
    DuplicateId(ApplicationId),
    /// The serialized catalog could not be parsed.
    #[error("app catalog parse failed: {0}")]
    Catalog(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Static catalog of installed applications, immutable once built.
pub struct AppRegistry {
    definitions: Vec<AppDefinition>,
    by_id: HashMap<ApplicationId, usize>,
}

impl AppRegistry {
    /// Builds a registry, rejecting duplicate ids.
    pub fn from_definitions(definitions: Vec<AppDefinition>) -> Result<Self, RegistryError> {
        let mut by_id = HashMap::with_capacity(definitions.len());
        for (index, definition) in definitions.iter().enumerate() {
            if by_id.insert(definition.id.clone(), index).is_some() {
                return Err(RegistryError::DuplicateId(definition.id.clone()));
            }
        }
        Ok(Self { definitions, by_id })
    }

    /// Parses a JSON array of definitions into a registry.
    pub fn from_json(raw: &str) -> Result<Self, RegistryError> {
        let definitions = serde_json::from_str::<Vec<AppDefinition>>(raw)
            .map_err(|err| RegistryError::Catalog(err.to_string()))?;
        Self::from_definitions(definitions)
    }

    /// Looks up a definition by id.
    pub fn get(&self, id: &ApplicationId) -> Option<&AppDefinition> {
        self.by_id
            .get(id)
            .and_then(|index| self.definitions.get(*index))
    }

    /// Whether `id` is installed.
    pub fn contains(&self, id: &ApplicationId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Iterates definitions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &AppDefinition> {
        self.definitions.iter()
    }

    /// Number of installed apps.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Default pinned dock order: pinned apps sorted by `dock_order`, then id.
    pub fn default_pinned(&self) -> Vec<ApplicationId> {
        let mut pinned = self
            .definitions
            .iter()
            .filter(|def| def.show_in_dock && def.pinned_by_default)
            .collect::<Vec<_>>();
        pinned.sort_by(|a, b| a.dock_order.cmp(&b.dock_order).then(a.id.cmp(&b.id)));
        pinned.into_iter().map(|def| def.id.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Lifecycle events emitted by the window manager for a managed window.
pub enum AppLifecycleEvent {
    /// Window was created.
    Opened,
    /// Window became focused.
    Focused,
    /// Window lost focus.
    Blurred,
    /// Window was minimized.
    Minimized,
    /// Window was restored from minimized or maximized state.
    Restored,
    /// Window was maximized.
    Maximized,
    /// Window was closed.
    Closed,
}

impl AppLifecycleEvent {
    /// Returns a stable string token for debugging hooks.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Focused => "focused",
            Self::Blurred => "blurred",
            Self::Minimized => "minimized",
            Self::Restored => "restored",
            Self::Maximized => "maximized",
            Self::Closed => "closed",
        }
    }
}
