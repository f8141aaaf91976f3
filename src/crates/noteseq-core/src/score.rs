use serde::{Deserialize, Serialize};

use crate::defaults::{
    Defaults, DEFAULT_DENOMINATOR, DEFAULT_NOTE_LENGTH, DEFAULT_NUMERATOR, DEFAULT_PITCH,
    DEFAULT_QPM, DEFAULT_VELOCITY,
};

/// A note with absolute bounds in seconds
///
/// Integer fields are kept signed and unbounded so values read from JSON reach
/// the encoder unchanged and can be rejected there with a precise error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "NoteRecord")]
pub struct Note {
    pub pitch: i32,
    pub start_time: f64,
    pub end_time: f64,
    pub velocity: i32,
    /// Logical part index; notes sharing it are written to the same track
    pub instrument: i32,
    pub program: i32,
    #[serde(skip_serializing_if = "is_false")]
    pub is_drum: bool,
}

impl Note {
    /// Create a note on instrument 0, program 0, at the default velocity
    pub fn new(pitch: i32, start_time: f64, end_time: f64) -> Self {
        Note {
            pitch,
            start_time,
            end_time,
            velocity: DEFAULT_VELOCITY,
            instrument: 0,
            program: 0,
            is_drum: false,
        }
    }

    pub fn with_velocity(mut self, velocity: i32) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_instrument(mut self, instrument: i32, program: i32) -> Self {
        self.instrument = instrument;
        self.program = program;
        self
    }

    pub fn drum(mut self) -> Self {
        self.is_drum = true;
        self
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Wire form of a note, every field optional
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteRecord {
    #[serde(default = "default_pitch")]
    pitch: i32,
    #[serde(default)]
    start_time: f64,
    #[serde(default)]
    end_time: Option<f64>,
    #[serde(default = "default_velocity")]
    velocity: i32,
    #[serde(default)]
    instrument: i32,
    #[serde(default)]
    program: i32,
    #[serde(default)]
    is_drum: bool,
}

impl From<NoteRecord> for Note {
    fn from(record: NoteRecord) -> Self {
        Note {
            pitch: record.pitch,
            start_time: record.start_time,
            end_time: record
                .end_time
                .unwrap_or(record.start_time + DEFAULT_NOTE_LENGTH),
            velocity: record.velocity,
            instrument: record.instrument,
            program: record.program,
            is_drum: record.is_drum,
        }
    }
}

/// A tempo change taking effect at `time` seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    #[serde(default)]
    pub time: f64,
    #[serde(default = "default_qpm")]
    pub qpm: f64,
}

impl Tempo {
    pub fn new(time: f64, qpm: f64) -> Self {
        Tempo { time, qpm }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSignature {
    #[serde(default)]
    pub time: f64,
    #[serde(default = "default_numerator")]
    pub numerator: i32,
    #[serde(default = "default_denominator")]
    pub denominator: i32,
}

impl TimeSignature {
    pub fn new(time: f64, numerator: i32, denominator: i32) -> Self {
        TimeSignature {
            time,
            numerator,
            denominator,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

/// A key change; `key` is the tonic pitch class with C = 0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeySignature {
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub key: i32,
    #[serde(default)]
    pub mode: Mode,
}

impl KeySignature {
    pub fn new(time: f64, key: i32, mode: Mode) -> Self {
        KeySignature { time, key, mode }
    }
}

/// A complete piece: notes plus the maps that place them in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub tempos: Vec<Tempo>,
    #[serde(default)]
    pub time_signatures: Vec<TimeSignature>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_signatures: Vec<KeySignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest note end, or 0 for a score without notes
    pub fn notes_end(&self) -> f64 {
        self.notes.iter().map(|n| n.end_time).fold(0.0, f64::max)
    }

    /// Repair missing maps and the total time.
    ///
    /// Inserts a time-0 tempo when `tempos` is empty, a time-0 signature when
    /// `time_signatures` is empty, and derives `total_time` from the notes when
    /// it is absent. Existing entries are never touched, so applying this
    /// twice gives the same score as applying it once.
    pub fn fill_defaults(&mut self, defaults: &Defaults) {
        if self.tempos.is_empty() {
            log::trace!("no tempo given, assuming {} qpm", defaults.qpm);
            self.tempos.push(Tempo::new(0.0, defaults.qpm));
        }
        if self.time_signatures.is_empty() {
            self.time_signatures.push(TimeSignature::new(
                0.0,
                defaults.numerator,
                defaults.denominator,
            ));
        }
        if self.total_time.is_none() {
            self.total_time = Some(self.notes_end());
        }
    }

    pub fn with_defaults(mut self, defaults: &Defaults) -> Self {
        self.fill_defaults(defaults);
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_pitch() -> i32 {
    DEFAULT_PITCH
}

fn default_velocity() -> i32 {
    DEFAULT_VELOCITY
}

fn default_qpm() -> f64 {
    DEFAULT_QPM
}

fn default_numerator() -> i32 {
    DEFAULT_NUMERATOR
}

fn default_denominator() -> i32 {
    DEFAULT_DENOMINATOR
}
