//! `From` implementations bridging `wall_config` types to `wall_core` types.
//!
//! These keep the CLI free of field-by-field mapping.

use crate::buttons::{ButtonAction, ButtonId, ButtonMap, MatchMode};
use crate::{ControlCfg, InclineCfg, TimingCfg, TorqueTrigger};

// ── ControlCfg ───────────────────────────────────────────────────────────────

impl From<&wall_config::ControlCfg> for ControlCfg {
    fn from(c: &wall_config::ControlCfg) -> Self {
        let trigger = match c.trigger {
            wall_config::TriggerKind::StopAbove => TorqueTrigger::StopAbove(c.torque_threshold),
            wall_config::TriggerKind::RunBelow => TorqueTrigger::RunBelow(c.torque_threshold),
        };
        Self {
            trigger,
            setpoint_rpm: c.setpoint_rpm,
            increment_rpm: c.increment_rpm,
            min_rpm: c.min_rpm,
            max_rpm: c.max_rpm,
        }
    }
}

// ── TimingCfg ────────────────────────────────────────────────────────────────

impl From<&wall_config::TimingCfg> for TimingCfg {
    fn from(c: &wall_config::TimingCfg) -> Self {
        Self {
            poll_ms: c.poll_ms,
            button_debounce_ms: c.button_debounce_ms,
            speed_debounce_ms: c.speed_debounce_ms,
        }
    }
}

// ── InclineCfg ───────────────────────────────────────────────────────────────

impl From<&wall_config::InclineCfg> for InclineCfg {
    fn from(c: &wall_config::InclineCfg) -> Self {
        Self {
            step_deg: c.step_deg,
            min_deg: c.min_deg,
            max_deg: c.max_deg,
        }
    }
}

// ── ButtonMap ────────────────────────────────────────────────────────────────

fn action_of(kind: wall_config::ActionKind) -> Option<ButtonAction> {
    match kind {
        wall_config::ActionKind::SpeedUp => Some(ButtonAction::SpeedUp),
        wall_config::ActionKind::SpeedDown => Some(ButtonAction::SpeedDown),
        wall_config::ActionKind::InclineUp => Some(ButtonAction::InclineUp),
        wall_config::ActionKind::InclineDown => Some(ButtonAction::InclineDown),
        wall_config::ActionKind::ToggleAuto => Some(ButtonAction::ToggleAuto),
        wall_config::ActionKind::None => None,
    }
}

impl From<&wall_config::ButtonsCfg> for ButtonMap {
    fn from(c: &wall_config::ButtonsCfg) -> Self {
        let levels = vec![
            (ButtonId::Button1, c.levels.button_1),
            (ButtonId::Button2, c.levels.button_2),
            (ButtonId::Button3, c.levels.button_3),
            (ButtonId::Button4, c.levels.button_4),
            (ButtonId::Button5, c.levels.button_5),
            (ButtonId::NoPress, c.levels.no_press),
        ];
        let mode = match c.mode {
            wall_config::MatchMode::Nearest => MatchMode::Nearest,
            wall_config::MatchMode::Tolerance => MatchMode::Tolerance {
                tolerance: c.tolerance,
            },
        };
        let wired = [
            (ButtonId::Button1, c.actions.button_1),
            (ButtonId::Button2, c.actions.button_2),
            (ButtonId::Button3, c.actions.button_3),
            (ButtonId::Button4, c.actions.button_4),
            (ButtonId::Button5, c.actions.button_5),
        ];
        let actions = wired
            .into_iter()
            .filter_map(|(id, kind)| action_of(kind).map(|a| (id, a)))
            .collect();
        ButtonMap::new(levels, mode).with_actions(actions)
    }
}
