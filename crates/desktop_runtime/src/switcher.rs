//! Keyboard app switcher (Cmd+Tab) state machine.

use crate::{
    model::{DesktopState, ProcessId},
    reducer::DesktopAction,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Switcher overlay state.
pub enum AppSwitcher {
    /// Overlay hidden.
    #[default]
    Idle,
    /// Overlay visible while the modifier is held.
    Cycling {
        /// MRU process order captured when cycling started.
        order: Vec<ProcessId>,
        /// Index into `order` of the highlighted process.
        selected: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Input events understood by [`AppSwitcher::handle`].
pub enum SwitcherEvent {
    /// Tab pressed; `modifier` is whether Cmd/Alt is held, `reverse` whether Shift is.
    Tab {
        /// Switcher modifier held.
        modifier: bool,
        /// Shift held.
        reverse: bool,
    },
    /// The switcher modifier was released.
    ModifierUp,
    /// Escape pressed.
    Escape,
}

/// Running processes ordered most recently focused first.
pub fn mru_process_order(state: &DesktopState) -> Vec<ProcessId> {
    let mut processes = state
        .processes()
        .map(|p| (p.last_focused, p.id))
        .collect::<Vec<_>>();
    processes.sort_unstable_by(|a, b| b.cmp(a));
    processes.into_iter().map(|(_, id)| id).collect()
}

impl AppSwitcher {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Cycling { .. })
    }

    /// Highlighted process while cycling.
    pub fn selected_process(&self) -> Option<ProcessId> {
        match self {
            Self::Idle => None,
            Self::Cycling { order, selected } => order.get(*selected).copied(),
        }
    }

    /// Advances the machine. Returns the action to dispatch when the cycle commits.
    pub fn handle(&mut self, state: &DesktopState, event: SwitcherEvent) -> Option<DesktopAction> {
        match event {
            SwitcherEvent::Tab { modifier, reverse } => match self {
                Self::Idle if modifier => {
                    let order = mru_process_order(state);
                    if !order.is_empty() {
                        let selected = usize::from(order.len() > 1);
                        *self = Self::Cycling { order, selected };
                    }
                    None
                }
                Self::Idle => None,
                Self::Cycling { order, selected } => {
                    let len = order.len();
                    *selected = if reverse {
                        (*selected + len - 1) % len
                    } else {
                        (*selected + 1) % len
                    };
                    None
                }
            },
            SwitcherEvent::ModifierUp => {
                let Self::Cycling { order, selected } = std::mem::take(self) else {
                    return None;
                };
                commit_target(state, &order, selected)
                    .map(|process_id| DesktopAction::ActivateProcess { process_id })
            }
            SwitcherEvent::Escape => {
                *self = Self::Idle;
                None
            }
        }
    }
}

/// The selected process, or the next live one after it when it was killed mid-cycle.
fn commit_target(state: &DesktopState, order: &[ProcessId], selected: usize) -> Option<ProcessId> {
    (0..order.len())
        .map(|step| order[(selected + step) % order.len()])
        .find(|id| state.process(*id).is_some())
}

/// Maps a raw key transition onto a [`SwitcherEvent`].
///
/// `key` is a DOM `KeyboardEvent.key` value. Returns `None` for keys the switcher ignores.
pub fn switcher_event_for_key(
    key: &str,
    modifier: bool,
    shift: bool,
    pressed: bool,
) -> Option<SwitcherEvent> {
    match (key, pressed) {
        ("Tab", true) => Some(SwitcherEvent::Tab {
            modifier,
            reverse: shift,
        }),
        ("Meta" | "Alt", false) => Some(SwitcherEvent::ModifierUp),
        ("Escape", true) => Some(SwitcherEvent::Escape),
        _ => None,
    }
}
