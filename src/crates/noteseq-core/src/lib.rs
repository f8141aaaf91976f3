//! Score model shared by the NoteSequence MIDI codec
//!
//! A [`Score`] holds notes with absolute bounds in seconds together with the
//! tempo, time signature and key signature maps that place them in musical
//! time. The types serialize to the NoteSequence JSON shape (`startTime`,
//! `timeSignatures`, `totalTime`, ...) and fill in missing fields the same way
//! the JSON bridge always has.
//!
//! # Examples
//!
//! ```
//! use noteseq_core::{Defaults, Note, Score};
//!
//! let mut score = Score::new();
//! score.notes.push(Note::new(60, 0.0, 1.0));
//! score.fill_defaults(&Defaults::STANDARD);
//!
//! assert_eq!(score.tempos[0].qpm, 120.0);
//! assert_eq!(score.total_time, Some(1.0));
//! assert!(score.validate().is_ok());
//! ```

pub mod defaults;
pub mod error;
pub mod score;
pub mod validate;

pub use defaults::Defaults;
pub use error::{Result, ScoreError};
pub use score::{KeySignature, Mode, Note, Score, Tempo, TimeSignature};
pub use validate::first_out_of_order;
