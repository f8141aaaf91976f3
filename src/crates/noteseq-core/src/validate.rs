use crate::error::{Result, ScoreError};
use crate::score::Score;

/// Index of the first element whose time is earlier than its predecessor's
pub fn first_out_of_order<T>(items: &[T], time: impl Fn(&T) -> f64) -> Option<usize> {
    items
        .windows(2)
        .position(|pair| time(&pair[1]) < time(&pair[0]))
        .map(|i| i + 1)
}

fn check_time(kind: &'static str, index: usize, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScoreError::InvalidTime { kind, index, value })
    }
}

impl Score {
    /// Strict structural check.
    ///
    /// Rejects notes ending before they start, non-finite or negative times,
    /// non-positive tempos, malformed time signatures, keys outside 0-11 and
    /// tempo or signature lists that go back in time. Ranges that only matter
    /// for MIDI (pitch, velocity, program) are left to the encoder.
    pub fn validate(&self) -> Result<()> {
        for (index, note) in self.notes.iter().enumerate() {
            check_time("note", index, note.start_time)?;
            check_time("note", index, note.end_time)?;
            if note.end_time < note.start_time {
                return Err(ScoreError::NoteEndsBeforeStart {
                    index,
                    start_time: note.start_time,
                    end_time: note.end_time,
                });
            }
        }

        for (index, tempo) in self.tempos.iter().enumerate() {
            check_time("tempo", index, tempo.time)?;
            if !(tempo.qpm.is_finite() && tempo.qpm > 0.0) {
                return Err(ScoreError::NonPositiveTempo {
                    index,
                    qpm: tempo.qpm,
                });
            }
        }

        for (index, ts) in self.time_signatures.iter().enumerate() {
            check_time("time signature", index, ts.time)?;
            if ts.numerator < 1 {
                return Err(ScoreError::InvalidNumerator {
                    index,
                    numerator: ts.numerator,
                });
            }
            if ts.denominator < 1 {
                return Err(ScoreError::InvalidDenominator {
                    index,
                    denominator: ts.denominator,
                });
            }
        }

        for (index, ks) in self.key_signatures.iter().enumerate() {
            check_time("key signature", index, ks.time)?;
            if !(0..12).contains(&ks.key) {
                return Err(ScoreError::InvalidKey { index, key: ks.key });
            }
        }

        if let Some(index) = first_out_of_order(&self.tempos, |t| t.time) {
            return Err(ScoreError::OutOfOrder {
                kind: "tempo",
                index,
                time: self.tempos[index].time,
            });
        }
        if let Some(index) = first_out_of_order(&self.time_signatures, |t| t.time) {
            return Err(ScoreError::OutOfOrder {
                kind: "time signature",
                index,
                time: self.time_signatures[index].time,
            });
        }
        if let Some(index) = first_out_of_order(&self.key_signatures, |k| k.time) {
            return Err(ScoreError::OutOfOrder {
                kind: "key signature",
                index,
                time: self.key_signatures[index].time,
            });
        }

        Ok(())
    }
}
