use noteseq_core::Tempo;

const MICROS_PER_MINUTE: f64 = 60_000_000.0;
/// Largest value a 24-bit SMF tempo event can hold
const MAX_MICROS_PER_QUARTER: u32 = 0x00FF_FFFF;

/// SMF tempo value for `qpm`, if it fits in 24 bits
pub fn qpm_to_micros(qpm: f64) -> Option<u32> {
    if !(qpm.is_finite() && qpm > 0.0) {
        return None;
    }
    let micros = (MICROS_PER_MINUTE / qpm).round();
    if micros < 1.0 || micros > MAX_MICROS_PER_QUARTER as f64 {
        None
    } else {
        Some(micros as u32)
    }
}

pub fn micros_to_qpm(micros: u32) -> f64 {
    MICROS_PER_MINUTE / micros as f64
}

/// Start of a constant-tempo segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub tick: u64,
    pub seconds: f64,
    pub qpm: f64,
}

impl Breakpoint {
    fn ticks_per_second(&self, ticks_per_quarter: u32) -> f64 {
        self.qpm * ticks_per_quarter as f64 / 60.0
    }

    fn seconds_at(&self, tick: u64, ticks_per_quarter: u32) -> f64 {
        let ticks = tick.saturating_sub(self.tick) as f64;
        self.seconds + ticks / self.ticks_per_second(ticks_per_quarter)
    }

    /// `None` when the tick would not fit in a `u64`
    fn ticks_at(&self, seconds: f64, ticks_per_quarter: u32) -> Option<u64> {
        let offset = (seconds - self.seconds).max(0.0);
        let ticks = (offset * self.ticks_per_second(ticks_per_quarter)).round();
        // u64::MAX as f64 rounds up to 2^64
        if !(ticks.is_finite() && ticks < u64::MAX as f64) {
            return None;
        }
        self.tick.checked_add(ticks as u64)
    }
}

/// Piecewise-linear mapping between ticks and seconds.
///
/// Breakpoints are sorted and the first one always sits at tick 0 / second 0,
/// so every position falls inside exactly one segment. Seconds for a tick are
/// the seconds at the segment start plus `Δtick / tpq × 60 / qpm`.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    ticks_per_quarter: u32,
    points: Vec<Breakpoint>,
}

impl TempoMap {
    /// Build from `(tick, qpm)` changes sorted by tick.
    ///
    /// `initial_qpm` governs everything before the first change. When several
    /// changes share a tick the last one wins.
    pub fn from_ticks(
        ticks_per_quarter: u32,
        initial_qpm: f64,
        changes: impl IntoIterator<Item = (u64, f64)>,
    ) -> Self {
        let mut points = vec![Breakpoint {
            tick: 0,
            seconds: 0.0,
            qpm: initial_qpm,
        }];

        for (tick, qpm) in changes {
            let last = points[points.len() - 1];
            if tick <= last.tick {
                let index = points.len() - 1;
                points[index].qpm = qpm;
                continue;
            }
            points.push(Breakpoint {
                tick,
                seconds: last.seconds_at(tick, ticks_per_quarter),
                qpm,
            });
        }

        TempoMap {
            ticks_per_quarter,
            points,
        }
    }

    /// Build from `(seconds, qpm)` changes sorted by time.
    ///
    /// Change positions are rounded to the nearest tick; the exact seconds are
    /// kept so conversions inside a segment stay anchored to the given time.
    /// Fails with the index of the first change too late to land on a tick.
    pub fn from_seconds(
        ticks_per_quarter: u32,
        initial_qpm: f64,
        changes: impl IntoIterator<Item = (f64, f64)>,
    ) -> Result<Self, usize> {
        let mut points = vec![Breakpoint {
            tick: 0,
            seconds: 0.0,
            qpm: initial_qpm,
        }];

        for (index, (seconds, qpm)) in changes.into_iter().enumerate() {
            let last = points[points.len() - 1];
            if seconds <= last.seconds {
                let last_index = points.len() - 1;
                points[last_index].qpm = qpm;
                continue;
            }
            points.push(Breakpoint {
                tick: last.ticks_at(seconds, ticks_per_quarter).ok_or(index)?,
                seconds,
                qpm,
            });
        }

        Ok(TempoMap {
            ticks_per_quarter,
            points,
        })
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.points
    }

    /// The map as score tempos, one per breakpoint
    pub fn tempos(&self) -> Vec<Tempo> {
        self.points
            .iter()
            .map(|p| Tempo::new(p.seconds, p.qpm))
            .collect()
    }

    pub fn tick_to_seconds(&self, tick: u64) -> f64 {
        let index = self.points.partition_point(|p| p.tick <= tick);
        self.points[index.saturating_sub(1)].seconds_at(tick, self.ticks_per_quarter)
    }

    /// Nearest tick for `seconds`; negative and NaN inputs map to tick 0.
    ///
    /// `None` when the time lies beyond the last tick a `u64` can count.
    pub fn seconds_to_ticks(&self, seconds: f64) -> Option<u64> {
        if !(seconds > 0.0) {
            return Some(0);
        }
        let index = self.points.partition_point(|p| p.seconds <= seconds);
        self.points[index.saturating_sub(1)].ticks_at(seconds, self.ticks_per_quarter)
    }

    /// Forward-scanning converter for monotonically increasing ticks
    pub fn cursor(&self) -> TempoCursor<'_> {
        TempoCursor { map: self, index: 0 }
    }
}

/// Running tick-to-seconds accumulator over a [`TempoMap`].
///
/// Each query only walks past the breakpoints crossed since the previous one,
/// so a whole track converts in a single pass over the map.
#[derive(Debug, Clone)]
pub struct TempoCursor<'a> {
    map: &'a TempoMap,
    index: usize,
}

impl TempoCursor<'_> {
    pub fn seconds_at(&mut self, tick: u64) -> f64 {
        let points = &self.map.points;
        if tick < points[self.index].tick {
            self.index = 0;
        }
        while self.index + 1 < points.len() && points[self.index + 1].tick <= tick {
            self.index += 1;
        }
        points[self.index].seconds_at(tick, self.map.ticks_per_quarter)
    }
}
