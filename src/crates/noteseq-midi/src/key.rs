//! Key signature meta events store a count of sharps (negative for flats)
//! plus a minor flag; the score keeps the tonic pitch class instead.

use noteseq_core::{KeySignature, Mode};

/// Key signature for an SMF `sharps`/`minor` pair
pub fn from_sharps(time: f64, sharps: i8, minor: bool) -> KeySignature {
    // each sharp moves the major tonic up a fifth
    let major_tonic = (i32::from(sharps) * 7).rem_euclid(12);
    if minor {
        KeySignature::new(time, (major_tonic + 9) % 12, Mode::Minor)
    } else {
        KeySignature::new(time, major_tonic, Mode::Major)
    }
}

/// Sharps (positive) or flats (negative) for a tonic in 0-11.
///
/// Six accidentals are written as sharps (F# major, D# minor).
pub fn to_sharps(key: i32, mode: Mode) -> i8 {
    let major_tonic = match mode {
        Mode::Major => key.rem_euclid(12),
        Mode::Minor => (key + 3).rem_euclid(12),
    };
    // a fifth is its own inverse mod 12
    let sharps = (major_tonic * 7) % 12;
    if sharps > 6 {
        (sharps - 12) as i8
    } else {
        sharps as i8
    }
}
