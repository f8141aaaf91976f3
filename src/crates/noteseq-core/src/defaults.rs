/// Tempo assumed by MIDI when a file carries no tempo event
pub const DEFAULT_QPM: f64 = 120.0;
pub const DEFAULT_NUMERATOR: i32 = 4;
pub const DEFAULT_DENOMINATOR: i32 = 4;
pub const DEFAULT_PITCH: i32 = 60;
pub const DEFAULT_VELOCITY: i32 = 80;
/// Length given to a note whose end time is missing, in seconds
pub const DEFAULT_NOTE_LENGTH: f64 = 0.5;

/// Values used to repair a partially specified score
///
/// Missing note fields are filled from the `DEFAULT_*` constants while the
/// JSON is read; these cover the score-level maps. Passed explicitly to [`Score::fill_defaults`](crate::Score::fill_defaults) so the
/// conversion stays a pure function of its inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defaults {
    pub qpm: f64,
    pub numerator: i32,
    pub denominator: i32,
}

impl Defaults {
    /// 120 qpm in 4/4
    pub const STANDARD: Defaults = Defaults {
        qpm: DEFAULT_QPM,
        numerator: DEFAULT_NUMERATOR,
        denominator: DEFAULT_DENOMINATOR,
    };
}

impl Default for Defaults {
    fn default() -> Self {
        Self::STANDARD
    }
}
