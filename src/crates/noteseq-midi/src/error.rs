use noteseq_core::ScoreError;
use thiserror::Error;

/// Why a byte buffer could not be decoded as a Standard MIDI File
#[derive(Debug, Error)]
pub enum MalformedMidi {
    #[error("input is {len} bytes, over the {limit} byte limit")]
    TooLarge { len: usize, limit: usize },

    #[error("failed to parse MIDI file: {0}")]
    Parse(#[from] midly::Error),

    #[error("unsupported MIDI file format {0} (only formats 0 and 1 are supported)")]
    UnsupportedFormat(u8),

    #[error("SMPTE timecode timing is not supported, only ticks per quarter note")]
    UnsupportedTiming,

    #[error("header declares a resolution of 0 ticks per quarter note")]
    ZeroResolution,

    #[error("track {track}, tick {tick}: tempo of 0 microseconds per quarter note")]
    ZeroTempo { track: usize, tick: u64 },

    #[error("track {track}, tick {tick}: time signature denominator exponent {exponent} is too large")]
    TimeSignatureOverflow { track: usize, tick: u64, exponent: u8 },
}

/// Why a score cannot be written as a Standard MIDI File
#[derive(Debug, Error)]
pub enum UnencodableScore {
    #[error("{0} ticks per quarter note cannot be stored in a MIDI header")]
    InvalidResolution(u16),

    #[error("invalid score: {0}")]
    Invalid(#[from] ScoreError),

    #[error("note {index}: pitch {pitch} is outside 0-127")]
    PitchOutOfRange { index: usize, pitch: i32 },

    #[error("note {index}: velocity {velocity} is outside 1-127")]
    VelocityOutOfRange { index: usize, velocity: i32 },

    #[error("note {index}: program {program} is outside 0-127")]
    ProgramOutOfRange { index: usize, program: i32 },

    #[error("{kind} {index}: time {value} is not a finite number of seconds")]
    NonFiniteTime {
        kind: &'static str,
        index: usize,
        value: f64,
    },

    #[error("{kind} {index}: time {value}s lies beyond the last tick a MIDI file can address")]
    TimeOutOfRange {
        kind: &'static str,
        index: usize,
        value: f64,
    },

    #[error("{count} melodic instruments sound at once but only {available} MIDI channels are available")]
    TooManyChannels { count: usize, available: usize },

    #[error("tempo {index}: {qpm} qpm cannot be stored as microseconds per quarter note")]
    TempoOutOfRange { index: usize, qpm: f64 },

    #[error("time signature {index}: {numerator}/{denominator} cannot be stored in MIDI")]
    UnencodableTimeSignature {
        index: usize,
        numerator: i32,
        denominator: i32,
    },

    #[error("key signature {index}: key {key} is not a pitch class (0-11)")]
    KeyOutOfRange { index: usize, key: i32 },

    #[error("{kind} {index} at {time}s comes before the entry preceding it")]
    OutOfOrder {
        kind: &'static str,
        index: usize,
        time: f64,
    },

    #[error("track {track}: gap of {ticks} ticks exceeds the largest MIDI delta time")]
    DeltaOverflow { track: usize, ticks: u64 },

    #[error("failed to write MIDI: {0}")]
    Write(String),
}
