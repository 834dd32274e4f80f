//! # Translation Table
//!
//! Static mapping from 7-bit control codes to Linux input identifiers.
//!
//! ## Layout
//!
//! | Codes | Target | Notes |
//! |-------|--------|-------|
//! | 0-62 | `BTN_0`..=`BTN_THUMBR` | Misc, joystick and gamepad buttons |
//! | 63-102 | `BTN_TRIGGER_HAPPY1`..=`BTN_TRIGGER_HAPPY40` | Extra buttons |
//! | 103 / 104 | `ABS_X` / `ABS_Y` | Positive extreme of axis A / B |
//! | 105 / 106 | `ABS_X` / `ABS_Y` | Negative extreme of axis A / B |
//! | 107-127 | - | Reserved, no-op |
//!
//! All platform identifier knowledge lives here; the wire protocol only ever
//! carries control codes.

use evdev::{AbsoluteAxisType, EventType, InputEvent, Key};

/// Size of the control code space (7 bits)
pub const CONTROL_CODE_COUNT: usize = 128;

/// Number of discrete button codes (0..=102)
pub const BUTTON_CODE_COUNT: usize = 103;

/// Positive extreme of axis A
pub const AXIS_A_POSITIVE: u8 = 103;
/// Positive extreme of axis B
pub const AXIS_B_POSITIVE: u8 = 104;
/// Negative extreme of axis A
pub const AXIS_A_NEGATIVE: u8 = 105;
/// Negative extreme of axis B
pub const AXIS_B_NEGATIVE: u8 = 106;

/// Largest axis magnitude reported by the emulated device
pub const AXIS_MAX: i32 = 32767;
/// Smallest axis value; the range is symmetric around zero
pub const AXIS_MIN: i32 = -AXIS_MAX;

/// Contiguous button identifier ranges, assigned to codes in order
const BUTTON_RANGES: [(Key, Key); 2] = [
    (Key::BTN_0, Key::BTN_THUMBR),
    (Key::BTN_TRIGGER_HAPPY1, Key::BTN_TRIGGER_HAPPY40),
];

/// Axis A and axis B
pub const AXES: [AbsoluteAxisType; 2] = [AbsoluteAxisType::ABS_X, AbsoluteAxisType::ABS_Y];

/// What kind of input a control code drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Button,
    Axis,
}

/// Sign of the axis extreme a code selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Buttons carry no polarity
    Neutral,
    Positive,
    Negative,
}

/// One mapped control code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationEntry {
    /// Linux key or absolute axis code
    pub code: u16,
    pub kind: ControlKind,
    pub polarity: Polarity,
}

impl TranslationEntry {
    fn button(key: Key) -> Self {
        Self { code: key.code(), kind: ControlKind::Button, polarity: Polarity::Neutral }
    }

    fn axis(axis: AbsoluteAxisType, polarity: Polarity) -> Self {
        Self { code: axis.0, kind: ControlKind::Axis, polarity }
    }

    /// Value the device reports for a press or release of this control
    ///
    /// Axes snap to their signed extreme on press and to exactly zero on
    /// release, whichever direction is released.
    pub fn value(&self, pressed: bool) -> i32 {
        match (self.kind, pressed) {
            (ControlKind::Button, pressed) => pressed as i32,
            (ControlKind::Axis, false) => 0,
            (ControlKind::Axis, true) => match self.polarity {
                Polarity::Negative => AXIS_MIN,
                Polarity::Positive | Polarity::Neutral => AXIS_MAX,
            },
        }
    }

    /// Build the evdev event for a press or release of this control
    pub fn input_event(&self, pressed: bool) -> InputEvent {
        let event_type = match self.kind {
            ControlKind::Button => EventType::KEY,
            ControlKind::Axis => EventType::ABSOLUTE,
        };
        InputEvent::new(event_type, self.code, self.value(pressed))
    }
}

/// Immutable control code lookup, built once at startup
#[derive(Debug, Clone)]
pub struct TranslationTable {
    entries: [Option<TranslationEntry>; CONTROL_CODE_COUNT],
}

impl TranslationTable {
    /// Build the table for the Linux input subsystem
    pub fn new() -> Self {
        let mut entries = [None; CONTROL_CODE_COUNT];

        let buttons = BUTTON_RANGES
            .iter()
            .flat_map(|(first, last)| first.code()..=last.code())
            .map(Key::new);
        for (slot, key) in entries.iter_mut().zip(buttons) {
            *slot = Some(TranslationEntry::button(key));
        }

        let [axis_a, axis_b] = AXES;
        entries[AXIS_A_POSITIVE as usize] = Some(TranslationEntry::axis(axis_a, Polarity::Positive));
        entries[AXIS_B_POSITIVE as usize] = Some(TranslationEntry::axis(axis_b, Polarity::Positive));
        entries[AXIS_A_NEGATIVE as usize] = Some(TranslationEntry::axis(axis_a, Polarity::Negative));
        entries[AXIS_B_NEGATIVE as usize] = Some(TranslationEntry::axis(axis_b, Polarity::Negative));

        Self { entries }
    }

    /// Look up a control code; `None` means unmapped (a no-op)
    pub fn lookup(&self, code: u8) -> Option<TranslationEntry> {
        self.entries.get(code as usize).copied().flatten()
    }

    /// Every button the table can produce, in code order
    pub fn buttons(&self) -> impl Iterator<Item = Key> + '_ {
        self.entries
            .iter()
            .flatten()
            .filter(|entry| entry.kind == ControlKind::Button)
            .map(|entry| Key::new(entry.code))
    }
}

impl Default for TranslationTable {
    fn default() -> Self {
        Self::new()
    }
}
