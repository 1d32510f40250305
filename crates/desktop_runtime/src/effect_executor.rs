//! Explicit runtime effect-queue executor for reducer-emitted side effects.

use berry_app_contract::AppLifecycleEvent;
use leptos::*;

use crate::{
    model::WindowId, persistence::capture_layout, reducer::RuntimeEffect,
    runtime_context::DesktopRuntimeContext,
};

/// DOM id of the element that receives input focus for a managed window.
pub fn window_input_dom_id(window_id: WindowId) -> String {
    format!("berry-window-{}-input", window_id.0)
}

/// Installs the effect executor that drains reducer-emitted runtime effects in order.
pub fn install(runtime: DesktopRuntimeContext) {
    // Clear the queue before draining so nested dispatches enqueue a fresh batch.
    create_effect(move |_| {
        let queued = runtime.effects.get();
        if queued.is_empty() {
            return;
        }

        runtime.effects.set(Vec::new());

        for effect in queued {
            run_runtime_effect(runtime, effect);
        }
    });
}

fn run_runtime_effect(runtime: DesktopRuntimeContext, effect: RuntimeEffect) {
    match effect {
        RuntimeEffect::PersistLayout => {
            // Capture now; an in-flight save only ever writes this value.
            let layout = capture_layout(&runtime.state.get_untracked());
            let bridge = runtime.persistence.get_value();
            spawn_local(async move { bridge.save_snapshot(&layout).await });
        }
        RuntimeEffect::PersistDock => {
            let pinned = runtime
                .state
                .with_untracked(|state| state.pinned_apps().to_vec());
            let bridge = runtime.persistence.get_value();
            spawn_local(async move { bridge.save_pinned(&pinned).await });
        }
        RuntimeEffect::PersistPreferences => {
            let preferences = runtime
                .state
                .with_untracked(|state| state.preferences().clone());
            let bridge = runtime.persistence.get_value();
            spawn_local(async move { bridge.save_preferences(&preferences).await });
        }
        RuntimeEffect::FocusWindowInput(window_id) => focus_window_input(window_id),
        RuntimeEffect::DispatchLifecycle { window_id, event } => {
            runtime.window_lifecycle.update(|events| {
                if event == AppLifecycleEvent::Closed {
                    events.remove(&window_id);
                } else {
                    events.insert(window_id, event);
                }
            });
        }
    }
}

fn focus_window_input(window_id: WindowId) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::JsCast;

        let Some(document) = web_sys::window().and_then(|window| window.document()) else {
            return;
        };
        let Some(element) = document.get_element_by_id(&window_input_dom_id(window_id)) else {
            return;
        };
        if let Ok(element) = element.dyn_into::<web_sys::HtmlElement>() {
            if element.focus().is_err() {
                logging::warn!("focus input for window {window_id} failed");
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = window_id;
    }
}
