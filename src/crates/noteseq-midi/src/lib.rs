//! Standard MIDI File codec for NoteSequence scores
//!
//! [`decode`] turns SMF bytes into a [`Score`](noteseq_core::Score) with note
//! times in seconds, resolving ticks through the file's tempo map. [`encode`]
//! does the inverse, converting seconds back to ticks with the same
//! piecewise-linear tempo relation and writing a format 1 file.
//!
//! Both directions are pure functions of their input: no I/O, no shared
//! state, safe to call from any number of threads at once.
//!
//! # Examples
//!
//! ```
//! use noteseq_core::{Note, Score, Tempo};
//!
//! let score = Score {
//!     notes: vec![Note::new(60, 0.0, 1.0)],
//!     tempos: vec![Tempo::new(0.0, 120.0)],
//!     ..Score::default()
//! };
//!
//! let bytes = noteseq_midi::encode(&score).unwrap();
//! let decoded = noteseq_midi::decode(&bytes).unwrap();
//!
//! assert_eq!(decoded.notes[0].pitch, 60);
//! assert!((decoded.notes[0].end_time - 1.0).abs() < 1e-6);
//! ```

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod key;
pub mod tempo;


/// Channel 10 in 1-indexed MIDI terms
pub const PERCUSSION_CHANNEL: u8 = 9;

pub use config::{DecodeOptions, EncodeOptions, STANDARD_PPQ};
pub use decode::{decode, decode_with};
pub use encode::{encode, encode_with};
pub use error::{MalformedMidi, UnencodableScore};
pub use tempo::{Breakpoint, TempoCursor, TempoMap};
