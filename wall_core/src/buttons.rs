//! Resistor-ladder button classification.
//!
//! The panel multiplexes five buttons onto one ADC channel; each button pulls
//! the ladder to a distinct calibrated level. Two classification strategies
//! exist because the scripts driving this rig needed different trade-offs:
//! nearest-match always names a button (good for calibration UIs), while the
//! tolerance window only reports high-confidence hits (good for the control
//! loop, where a false press adjusts the setpoint).

/// Identity of a panel button, or the idle ladder level.
///
/// Declaration order is the classifier's table order: ties in nearest-match
/// and overlaps in tolerance-match resolve to the earlier variant. This
/// tie-break is deliberate, not incidental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Button1,
    Button2,
    Button3,
    Button4,
    Button5,
    NoPress,
}

impl ButtonId {
    pub const ALL: [Self; 6] = [
        Self::Button1,
        Self::Button2,
        Self::Button3,
        Self::Button4,
        Self::Button5,
        Self::NoPress,
    ];

    /// Stable text name, matching the calibration CSV vocabulary.
    pub fn label(self) -> &'static str {
        match self {
            Self::Button1 => "button_1",
            Self::Button2 => "button_2",
            Self::Button3 => "button_3",
            Self::Button4 => "button_4",
            Self::Button5 => "button_5",
            Self::NoPress => "no_press",
        }
    }
}

/// What a qualifying press does to the control state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    SpeedUp,
    SpeedDown,
    InclineUp,
    InclineDown,
    ToggleAuto,
}

/// Classification strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Closest calibrated level wins regardless of distance. Ties go to the
    /// first table entry.
    Nearest,
    /// First level strictly within `tolerance` of the sample wins; `NoPress`
    /// when nothing is close enough. A sample exactly on a level is distance
    /// zero and always matches.
    Tolerance { tolerance: i32 },
}

impl Default for MatchMode {
    fn default() -> Self {
        Self::Tolerance { tolerance: 100 }
    }
}

/// Ordered calibrated levels plus the per-button action wiring. Immutable
/// after construction.
#[derive(Debug, Clone)]
pub struct ButtonMap {
    entries: Vec<(ButtonId, i32)>,
    actions: Vec<(ButtonId, ButtonAction)>,
    mode: MatchMode,
}

impl ButtonMap {
    pub fn new(entries: Vec<(ButtonId, i32)>, mode: MatchMode) -> Self {
        Self {
            entries,
            actions: Vec::new(),
            mode,
        }
    }

    pub fn with_actions(mut self, actions: Vec<(ButtonId, ButtonAction)>) -> Self {
        self.actions = actions;
        self
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn levels(&self) -> &[(ButtonId, i32)] {
        &self.entries
    }

    /// Map a raw ADC sample to a button identity.
    pub fn classify(&self, sample: i32) -> ButtonId {
        match self.mode {
            MatchMode::Nearest => {
                let mut best = ButtonId::NoPress;
                let mut best_diff = i64::MAX;
                for &(id, level) in &self.entries {
                    let diff = (i64::from(sample) - i64::from(level)).abs();
                    // strict < keeps the first entry on ties
                    if diff < best_diff {
                        best = id;
                        best_diff = diff;
                    }
                }
                best
            }
            MatchMode::Tolerance { tolerance } => {
                for &(id, level) in &self.entries {
                    if (i64::from(sample) - i64::from(level)).abs() < i64::from(tolerance) {
                        return id;
                    }
                }
                ButtonId::NoPress
            }
        }
    }

    /// Action wired to a button, if any.
    pub fn action(&self, id: ButtonId) -> Option<ButtonAction> {
        self.actions
            .iter()
            .find(|(b, _)| *b == id)
            .map(|&(_, a)| a)
    }
}
