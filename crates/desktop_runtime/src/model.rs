use std::{collections::BTreeMap, fmt};

use berry_app_contract::{AppRegistry, ApplicationId, WindowRect};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RESTORE_WINDOWS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
    /// Only ever reported for ids that were issued and have since been removed.
    Closed,
}

impl WindowState {
    /// Whether a window in this state is part of the visible z-stack.
    pub fn is_visible(self) -> bool {
        matches!(self, Self::Normal | Self::Maximized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFlags {
    pub resizable: bool,
    pub minimizable: bool,
    pub maximizable: bool,
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self {
            resizable: true,
            minimizable: true,
            maximizable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub process_id: ProcessId,
    pub app_id: ApplicationId,
    pub title: String,
    pub rect: WindowRect,
    /// Bounds to return to when a maximized window is restored.
    pub restore_rect: Option<WindowRect>,
    pub z_index: u64,
    pub state: WindowState,
    pub focused: bool,
    pub flags: WindowFlags,
}

impl WindowRecord {
    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: ProcessId,
    pub app_id: ApplicationId,
    /// Owned windows in creation order.
    pub windows: Vec<WindowId>,
    pub created_at_unix_ms: u64,
    /// Focus clock value the last time one of this process's windows gained focus.
    pub last_focused: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopPreferences {
    pub restore_on_boot: bool,
    pub max_restore_windows: usize,
}

impl Default for DesktopPreferences {
    fn default() -> Self {
        Self {
            restore_on_boot: true,
            max_restore_windows: DEFAULT_MAX_RESTORE_WINDOWS,
        }
    }
}

/// Focused window plus the visible stack, back to front.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FocusState {
    pub focused: Option<WindowId>,
    pub visible_stack: Vec<WindowId>,
}

/// Owned process/window tables and focus pointer.
///
/// Fields are crate-private: readers use the accessors, writers go through
/// [`crate::reducer::reduce_desktop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopState {
    pub(crate) next_window_id: u64,
    pub(crate) next_process_id: u64,
    pub(crate) focus_clock: u64,
    pub(crate) processes: BTreeMap<ProcessId, ProcessRecord>,
    pub(crate) windows: BTreeMap<WindowId, WindowRecord>,
    pub(crate) focused: Option<WindowId>,
    pub(crate) pinned: Vec<ApplicationId>,
    pub(crate) preferences: DesktopPreferences,
}

impl Default for DesktopState {
    fn default() -> Self {
        Self {
            next_window_id: 1,
            next_process_id: 1,
            focus_clock: 0,
            processes: BTreeMap::new(),
            windows: BTreeMap::new(),
            focused: None,
            pinned: Vec::new(),
            preferences: DesktopPreferences::default(),
        }
    }
}

impl DesktopState {
    /// Empty desktop whose dock starts with the registry's default pins.
    pub fn with_registry(registry: &AppRegistry) -> Self {
        Self {
            pinned: registry.default_pinned(),
            ..Self::default()
        }
    }

    pub fn window(&self, window_id: WindowId) -> Option<&WindowRecord> {
        self.windows.get(&window_id)
    }

    pub fn process(&self, process_id: ProcessId) -> Option<&ProcessRecord> {
        self.processes.get(&process_id)
    }

    /// Windows in id order.
    pub fn windows(&self) -> impl Iterator<Item = &WindowRecord> {
        self.windows.values()
    }

    /// Processes in launch order.
    pub fn processes(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.processes.values()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn focused_process_id(&self) -> Option<ProcessId> {
        self.focused
            .and_then(|id| self.windows.get(&id))
            .map(|w| w.process_id)
    }

    pub fn processes_for_app<'a>(
        &'a self,
        app_id: &'a ApplicationId,
    ) -> impl Iterator<Item = &'a ProcessRecord> + 'a {
        self.processes.values().filter(move |p| &p.app_id == app_id)
    }

    pub fn windows_for_app<'a>(
        &'a self,
        app_id: &'a ApplicationId,
    ) -> impl Iterator<Item = &'a WindowRecord> + 'a {
        self.windows.values().filter(move |w| &w.app_id == app_id)
    }

    /// The earliest-launched process for `app_id`, if any.
    pub fn process_for_app<'a>(
        &'a self,
        app_id: &'a ApplicationId,
    ) -> Option<&'a ProcessRecord> {
        self.processes_for_app(app_id).next()
    }

    pub fn is_running(&self, app_id: &ApplicationId) -> bool {
        self.process_for_app(app_id).is_some()
    }

    /// Highest z-index currently assigned, or 0 for an empty desktop.
    pub fn max_z_index(&self) -> u64 {
        self.windows.values().map(|w| w.z_index).max().unwrap_or(0)
    }

    /// Visible windows ordered back to front.
    pub fn visible_stack(&self) -> Vec<WindowId> {
        let mut visible = self
            .windows
            .values()
            .filter(|w| w.is_visible())
            .map(|w| (w.z_index, w.id))
            .collect::<Vec<_>>();
        visible.sort_unstable();
        visible.into_iter().map(|(_, id)| id).collect()
    }

    pub fn focus_state(&self) -> FocusState {
        FocusState {
            focused: self.focused,
            visible_stack: self.visible_stack(),
        }
    }

    pub fn pinned_apps(&self) -> &[ApplicationId] {
        &self.pinned
    }

    pub fn preferences(&self) -> &DesktopPreferences {
        &self.preferences
    }

    /// Whether `window_id` was handed out at some point, even if it is gone now.
    pub fn was_issued(&self, window_id: WindowId) -> bool {
        window_id.0 >= 1 && window_id.0 < self.next_window_id
    }

    /// Reported state for any id: `Closed` for issued-then-removed windows.
    pub fn window_state(&self, window_id: WindowId) -> Option<WindowState> {
        match self.windows.get(&window_id) {
            Some(window) => Some(window.state),
            None if self.was_issued(window_id) => Some(WindowState::Closed),
            None => None,
        }
    }

    pub(crate) fn allocate_window_id(&mut self) -> WindowId {
        let id = WindowId(self.next_window_id);
        self.next_window_id = self.next_window_id.saturating_add(1);
        id
    }

    pub(crate) fn allocate_process_id(&mut self) -> ProcessId {
        let id = ProcessId(self.next_process_id);
        self.next_process_id = self.next_process_id.saturating_add(1);
        id
    }

    pub(crate) fn tick_focus_clock(&mut self) -> u64 {
        self.focus_clock = self.focus_clock.saturating_add(1);
        self.focus_clock
    }
}

/// Parameters for opening a window; unset fields fall back to the app's defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpenWindowRequest {
    pub title: Option<String>,
    pub rect: Option<WindowRect>,
    pub flags: WindowFlags,
}

impl OpenWindowRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rect(mut self, rect: WindowRect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_flags(mut self, flags: WindowFlags) -> Self {
        self.flags = flags;
        self
    }
}
