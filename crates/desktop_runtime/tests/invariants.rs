use berry_app_contract::{AppRegistry, WindowRect};
use berry_desktop_runtime::{
    builtin_registry, focus, reduce_desktop, DesktopAction, DesktopState, WindowId,
};
use pretty_assertions::assert_eq;

/// Small deterministic generator so failures replay exactly.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            None
        } else {
            Some(items[(self.next() as usize) % items.len()])
        }
    }
}

fn random_action(rng: &mut Lcg, state: &DesktopState, registry: &AppRegistry) -> DesktopAction {
    let apps = registry.iter().map(|d| d.id.clone()).collect::<Vec<_>>();
    let windows = state.windows().map(|w| w.id).collect::<Vec<_>>();
    let processes = state.processes().map(|p| p.id).collect::<Vec<_>>();
    // Occasionally target ids that no longer exist.
    let window = rng
        .pick(&windows)
        .filter(|_| rng.next() % 8 != 0)
        .unwrap_or(WindowId(rng.next() % 40 + 1));
    let app_id = apps[(rng.next() as usize) % apps.len()].clone();

    match rng.next() % 11 {
        0 | 1 => DesktopAction::LaunchApp { app_id },
        2 => DesktopAction::NewInstance { app_id },
        3 => DesktopAction::CloseWindow { window_id: window },
        4 => DesktopAction::FocusWindow { window_id: window },
        5 => DesktopAction::MinimizeWindow { window_id: window },
        6 => DesktopAction::RestoreWindow { window_id: window },
        7 => DesktopAction::MaximizeWindow {
            window_id: window,
            viewport: WindowRect::new(0, 0, 1280, 760),
        },
        8 => DesktopAction::DockClick { app_id },
        9 => match rng.pick(&processes) {
            Some(process_id) => DesktopAction::KillProcess { process_id },
            None => DesktopAction::LaunchApp { app_id },
        },
        _ => match rng.pick(&processes) {
            Some(process_id) => DesktopAction::ActivateProcess { process_id },
            None => DesktopAction::ResizeWindow {
                window_id: window,
                rect: WindowRect::new(10, 10, 50, 50),
            },
        },
    }
}

fn assert_invariants(state: &DesktopState, registry: &AppRegistry) {
    let flagged = state.windows().filter(|w| w.focused).collect::<Vec<_>>();
    assert!(flagged.len() <= 1, "more than one focused window");

    let top_visible = state.visible_stack().last().copied();
    assert_eq!(state.focused_window_id(), top_visible);
    assert_eq!(flagged.first().map(|w| w.id), top_visible);

    for window in state.windows() {
        let process = state
            .process(window.process_id)
            .expect("window owner exists");
        assert!(process.windows.contains(&window.id));
        assert_eq!(process.app_id, window.app_id);
        assert!(window.rect.w >= 220 && window.rect.h >= 140);
    }
    for process in state.processes() {
        for window_id in &process.windows {
            assert!(state.window(*window_id).is_some(), "dangling window ref");
        }
        let definition = registry.get(&process.app_id).expect("installed app");
        if process.windows.is_empty() {
            assert!(definition.policy.allows_zero_windows());
        }
        if definition.policy.singleton() {
            assert_eq!(state.processes_for_app(&process.app_id).count(), 1);
        }
    }
}

#[test]
fn random_action_sequences_preserve_invariants() {
    let registry = builtin_registry().expect("catalog");
    for seed in 1..=24 {
        let mut rng = Lcg(seed);
        let mut state = DesktopState::with_registry(&registry);
        for _ in 0..200 {
            let action = random_action(&mut rng, &state, &registry);
            let before = state.clone();
            if reduce_desktop(&mut state, &registry, action).is_err() {
                assert_eq!(state, before, "failed action mutated state");
            }
            assert_invariants(&state, &registry);
            assert!(!focus::heal_focus(&mut state), "reducer left focus broken");
        }
    }
}

#[test]
fn focusing_twice_matches_focusing_once() {
    let registry = builtin_registry().expect("catalog");
    let mut rng = Lcg(99);
    let mut state = DesktopState::with_registry(&registry);
    for _ in 0..60 {
        let action = random_action(&mut rng, &state, &registry);
        let _ = reduce_desktop(&mut state, &registry, action);
    }

    let ids = state.windows().map(|w| w.id).collect::<Vec<_>>();
    for window_id in ids {
        let mut once = state.clone();
        reduce_desktop(&mut once, &registry, DesktopAction::FocusWindow { window_id }).unwrap();
        let mut twice = once.clone();
        reduce_desktop(&mut twice, &registry, DesktopAction::FocusWindow { window_id }).unwrap();
        assert_eq!(twice.focus_state(), once.focus_state());
        assert_eq!(twice, once);
    }
}
