//! Berry OS window and application lifecycle manager.
//!
//! [`DesktopState`] owns the process and window tables plus the focus pointer. All mutation goes
//! through [`reduce_desktop`], which returns [`RuntimeEffect`] intents for the host to execute.
//! The dock, keyboard switcher and touch switcher translate user input into [`DesktopAction`]
//! values; [`DesktopProvider`] wires everything into a Leptos reactive context.

pub mod apps;
pub mod dock;
pub mod effect_executor;
pub mod focus;
pub mod keyboard;
pub mod model;
pub mod persistence;
pub mod reducer;
pub mod runtime_context;
pub mod switcher;
pub mod touch_switcher;
pub mod window_manager;

pub use apps::builtin_registry;
pub use dock::{dock_items, route_dock_click, DockItem, DockRoute};
pub use model::*;
pub use persistence::{
    capture_layout, load_boot_actions, replay_layout, LayoutEntry, PersistenceBridge,
    RestoreReport, StorePersistenceBridge, WindowLayout,
};
pub use reducer::{reduce_desktop, DesktopAction, RuntimeEffect};
pub use runtime_context::{use_desktop_runtime, DesktopProvider, DesktopRuntimeContext};
pub use switcher::{AppSwitcher, SwitcherEvent};
pub use touch_switcher::{SwitcherCard, TouchSwitcher};
pub use window_manager::{DesktopError, ErrorKind};
