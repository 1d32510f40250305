//! Global keyboard wiring for the Cmd+Tab app switcher.

use leptos::*;

use crate::{
    runtime_context::DesktopRuntimeContext,
    switcher::{switcher_event_for_key, SwitcherEvent},
};

fn switcher_event(ev: &web_sys::KeyboardEvent, pressed: bool) -> Option<SwitcherEvent> {
    switcher_event_for_key(
        &ev.key(),
        ev.meta_key() || ev.alt_key(),
        ev.shift_key(),
        pressed,
    )
}

fn handle_key(runtime: DesktopRuntimeContext, ev: &web_sys::KeyboardEvent, pressed: bool) {
    if ev.default_prevented() {
        return;
    }
    let Some(event) = switcher_event(ev, pressed) else {
        return;
    };
    let starts_cycle = matches!(event, SwitcherEvent::Tab { modifier: true, .. });
    if starts_cycle || runtime.app_switcher.with_untracked(|s| s.is_active()) {
        ev.prevent_default();
    }
    runtime.handle_switcher_event(event);
}

/// Installs window-level keydown/keyup listeners that drive [`crate::switcher::AppSwitcher`].
pub fn install_switcher_keys(runtime: DesktopRuntimeContext) {
    let keydown = window_event_listener(ev::keydown, move |ev| handle_key(runtime, &ev, true));
    on_cleanup(move || keydown.remove());

    let keyup = window_event_listener(ev::keyup, move |ev| handle_key(runtime, &ev, false));
    on_cleanup(move || keyup.remove());

    // Losing window focus mid-cycle never delivers the modifier keyup.
    let blur = window_event_listener(ev::blur, move |_| {
        if runtime.app_switcher.with_untracked(|s| s.is_active()) {
            runtime.handle_switcher_event(SwitcherEvent::Escape);
        }
    });
    on_cleanup(move || blur.remove());
}
