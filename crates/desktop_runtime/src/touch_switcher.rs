//! Touch app switcher: one swipeable card per running process.

use berry_app_contract::ApplicationId;

use crate::{
    model::{DesktopState, ProcessId},
    reducer::DesktopAction,
};

/// Horizontal travel past which releasing a card kills its process.
pub const DISMISS_THRESHOLD_PX: f64 = 100.0;
/// Maximum travel for a touch to count as a tap.
pub const TAP_SLOP_PX: f64 = 10.0;
/// Downward background travel that closes the overlay.
pub const CLOSE_SWIPE_PX: f64 = 120.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SwitcherCard {
    pub process_id: ProcessId,
    pub app_id: ApplicationId,
    pub offset_x: f64,
    /// Largest absolute travel seen during the current touch.
    pub travel: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Overlay state for the touch switcher.
pub struct TouchSwitcher {
    pub open: bool,
    pub cards: Vec<SwitcherCard>,
    pub background_drag: f64,
}

impl TouchSwitcher {
    pub fn open(&mut self, state: &DesktopState) {
        self.open = true;
        self.background_drag = 0.0;
        self.sync_cards(state);
    }

    pub fn close(&mut self) {
        self.open = false;
        self.background_drag = 0.0;
        for card in &mut self.cards {
            card.offset_x = 0.0;
            card.travel = 0.0;
        }
    }

    /// Rebuilds the card list from the process table in launch order, keeping in-flight
    /// offsets for processes that are still alive.
    pub fn sync_cards(&mut self, state: &DesktopState) {
        let previous = std::mem::take(&mut self.cards);
        self.cards = state
            .processes()
            .map(|process| {
                previous
                    .iter()
                    .find(|card| card.process_id == process.id)
                    .cloned()
                    .unwrap_or_else(|| SwitcherCard {
                        process_id: process.id,
                        app_id: process.app_id.clone(),
                        offset_x: 0.0,
                        travel: 0.0,
                    })
            })
            .collect();
    }

    pub fn card(&self, process_id: ProcessId) -> Option<&SwitcherCard> {
        self.cards.iter().find(|card| card.process_id == process_id)
    }

    /// Begins a new touch on a card, forgetting the travel of the previous one.
    pub fn start_card_touch(&mut self, process_id: ProcessId) {
        if let Some(card) = self.card_mut(process_id) {
            card.offset_x = 0.0;
            card.travel = 0.0;
        }
    }

    /// Tracks horizontal drag on a card.
    pub fn drag_card(&mut self, process_id: ProcessId, offset_x: f64) {
        if let Some(card) = self.card_mut(process_id) {
            card.offset_x = offset_x;
            card.travel = card.travel.max(offset_x.abs());
        }
    }

    /// Ends a touch on a card: far enough dismisses the process, otherwise the card snaps back.
    /// The touch's travel is kept so a tap delivered after release can still be rejected.
    pub fn end_card_touch(&mut self, process_id: ProcessId) -> Option<DesktopAction> {
        let card = self.card_mut(process_id)?;
        let offset = card.offset_x;
        card.offset_x = 0.0;
        if offset.abs() > DISMISS_THRESHOLD_PX {
            self.cards.retain(|card| card.process_id != process_id);
            return Some(DesktopAction::KillProcess { process_id });
        }
        None
    }

    /// A tap on a card activates its process and closes the overlay. Touches that moved
    /// beyond the tap slop are ignored.
    pub fn tap_card(&mut self, process_id: ProcessId) -> Option<DesktopAction> {
        let card = self.card(process_id)?;
        if card.travel > TAP_SLOP_PX {
            return None;
        }
        self.close();
        Some(DesktopAction::ActivateProcess { process_id })
    }

    pub fn drag_background(&mut self, offset_y: f64) {
        self.background_drag = offset_y.max(0.0);
    }

    /// Returns `true` when the swipe closed the overlay.
    pub fn end_background_drag(&mut self) -> bool {
        let closes = self.background_drag > CLOSE_SWIPE_PX;
        self.background_drag = 0.0;
        if closes {
            self.close();
        }
        closes
    }

    fn card_mut(&mut self, process_id: ProcessId) -> Option<&mut SwitcherCard> {
        self.cards
            .iter_mut()
            .find(|card| card.process_id == process_id)
    }
}

#[cfg(test)]
mod tests {
    use berry_app_contract::{AppDefinition, AppRegistry};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::window_manager::{kill_process, launch_app};

    fn running(apps: &[&str]) -> (DesktopState, Vec<ProcessId>) {
        let registry = AppRegistry::from_definitions(
            apps.iter()
                .map(|raw| AppDefinition::new(ApplicationId::trusted(*raw), *raw))
                .collect(),
        )
        .expect("registry");
        let mut state = DesktopState::default();
        let pids = apps
            .iter()
            .map(|raw| launch_app(&mut state, &registry, &ApplicationId::trusted(*raw)).unwrap())
            .collect();
        (state, pids)
    }

    #[test]
    fn cards_follow_launch_order() {
        let (state, pids) = running(&["finder", "terminal"]);
        let mut switcher = TouchSwitcher::default();
        switcher.open(&state);
        let ids = switcher.cards.iter().map(|c| c.process_id).collect::<Vec<_>>();
        assert_eq!(ids, pids);
    }

    #[test]
    fn short_swipe_snaps_back() {
        let (state, pids) = running(&["finder"]);
        let mut switcher = TouchSwitcher::default();
        switcher.open(&state);

        switcher.drag_card(pids[0], -100.0);
        assert_eq!(switcher.end_card_touch(pids[0]), None);
        assert_eq!(switcher.card(pids[0]).unwrap().offset_x, 0.0);
    }

    #[test]
    fn long_swipe_kills_and_resync_drops_the_card() {
        let (mut state, pids) = running(&["finder", "terminal"]);
        let mut switcher = TouchSwitcher::default();
        switcher.open(&state);

        switcher.drag_card(pids[1], 140.0);
        let action = switcher.end_card_touch(pids[1]);
        assert_eq!(
            action,
            Some(DesktopAction::KillProcess {
                process_id: pids[1]
            })
        );
        kill_process(&mut state, pids[1]).unwrap();
        switcher.sync_cards(&state);
        assert_eq!(switcher.cards.len(), 1);
        assert!(switcher.card(pids[1]).is_none());
    }

    #[test]
    fn tap_activates_only_within_slop() {
        let (state, pids) = running(&["finder"]);
        let mut switcher = TouchSwitcher::default();
        switcher.open(&state);

        switcher.start_card_touch(pids[0]);
        switcher.drag_card(pids[0], 30.0);
        switcher.drag_card(pids[0], 2.0);
        assert_eq!(switcher.tap_card(pids[0]), None);
        switcher.end_card_touch(pids[0]);

        switcher.start_card_touch(pids[0]);
        switcher.drag_card(pids[0], 4.0);
        assert_eq!(
            switcher.tap_card(pids[0]),
            Some(DesktopAction::ActivateProcess {
                process_id: pids[0]
            })
        );
        assert!(!switcher.open);
    }

    #[test]
    fn released_snap_back_swipe_is_not_a_tap() {
        let (state, pids) = running(&["finder"]);
        let mut switcher = TouchSwitcher::default();
        switcher.open(&state);

        switcher.start_card_touch(pids[0]);
        switcher.drag_card(pids[0], 60.0);
        assert_eq!(switcher.end_card_touch(pids[0]), None);
        assert_eq!(switcher.tap_card(pids[0]), None);
        assert!(switcher.open);

        switcher.start_card_touch(pids[0]);
        switcher.end_card_touch(pids[0]);
        assert_eq!(
            switcher.tap_card(pids[0]),
            Some(DesktopAction::ActivateProcess {
                process_id: pids[0]
            })
        );
    }

    #[test]
    fn background_swipe_down_closes_overlay() {
        let (state, _) = running(&["finder"]);
        let mut switcher = TouchSwitcher::default();
        switcher.open(&state);

        switcher.drag_background(80.0);
        assert!(!switcher.end_background_drag());
        assert!(switcher.open);

        switcher.drag_background(150.0);
        assert!(switcher.end_background_drag());
        assert!(!switcher.open);
    }
}
