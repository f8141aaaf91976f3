use log::{debug, trace, warn};
use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use std::collections::BTreeMap;

use noteseq_core::{
    first_out_of_order, Defaults, KeySignature, Mode, Note, Score, Tempo, TimeSignature,
};

use crate::config::EncodeOptions;
use crate::error::UnencodableScore;
use crate::key;
use crate::tempo::{micros_to_qpm, qpm_to_micros, TempoMap};
use crate::PERCUSSION_CHANNEL;

/// Every channel except percussion, in allocation order
const MELODIC_CHANNELS: [u8; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 14, 15];

/// Largest delta time a variable-length quantity can carry
const MAX_DELTA: u64 = 0x0FFF_FFFF;

const MAX_TICKS_PER_QUARTER: u16 = 0x7FFF;

// Ordering of events sharing a tick. Program changes come first, then
// note-offs so a note ending where the next one starts releases first.
// A zero-length note keeps its off right after its on.
const ORDER_SETUP: u8 = 0;
const ORDER_NOTE_OFF: u8 = 1;
const ORDER_NOTE_ON: u8 = 2;

/// An event at an absolute tick, before delta encoding
struct Timed {
    tick: u64,
    order: u8,
    kind: TrackEventKind<'static>,
}

impl Timed {
    fn meta(tick: u64, message: MetaMessage<'static>) -> Self {
        Timed {
            tick,
            order: ORDER_SETUP,
            kind: TrackEventKind::Meta(message),
        }
    }

    fn midi(tick: u64, order: u8, channel: u8, message: MidiMessage) -> Self {
        Timed {
            tick,
            order,
            kind: TrackEventKind::Midi {
                channel: u4::new(channel),
                message,
            },
        }
    }
}

/// Encode a score with default options
pub fn encode(score: &Score) -> Result<Vec<u8>, UnencodableScore> {
    encode_with(score, &EncodeOptions::default())
}

/// Write a score as a format 1 Standard MIDI File.
///
/// Track 0 carries the tempo, time signature and key signature maps; every
/// instrument gets its own track after it, in ascending instrument order.
/// The score is checked completely before any bytes are produced.
pub fn encode_with(score: &Score, options: &EncodeOptions) -> Result<Vec<u8>, UnencodableScore> {
    let ticks_per_quarter = options.ticks_per_quarter;
    if ticks_per_quarter == 0 || ticks_per_quarter > MAX_TICKS_PER_QUARTER {
        return Err(UnencodableScore::InvalidResolution(ticks_per_quarter));
    }

    let mut score = score.clone();
    score.fill_defaults(&options.defaults);
    if options.strict {
        score.validate()?;
    }

    let tempos = ordered(&score.tempos, |t| t.time, "tempo", options.strict)?;
    let time_signatures = ordered(
        &score.time_signatures,
        |t| t.time,
        "time signature",
        options.strict,
    )?;
    let key_signatures = ordered(
        &score.key_signatures,
        |k| k.time,
        "key signature",
        options.strict,
    )?;

    let tempo_map = build_tempo_map(ticks_per_quarter, &tempos, &options.defaults)?;

    let mut tracks = vec![conductor_track(&tempo_map, &time_signatures, &key_signatures)?];
    tracks.extend(note_tracks(&score.notes, &tempo_map)?);

    let smf = Smf {
        header: Header::new(
            Format::Parallel,
            Timing::Metrical(u15::new(ticks_per_quarter)),
        ),
        tracks,
    };

    let mut out = Vec::new();
    smf.write(&mut out)
        .map_err(|e| UnencodableScore::Write(e.to_string()))?;

    debug!(
        "encoded {} notes into {} tracks, {} bytes",
        score.notes.len(),
        smf.tracks.len(),
        out.len()
    );
    Ok(out)
}

/// Time-ordered copy of a map; lenient mode sorts, strict mode refuses
fn ordered<T: Copy>(
    items: &[T],
    time: impl Fn(&T) -> f64,
    kind: &'static str,
    strict: bool,
) -> Result<Vec<T>, UnencodableScore> {
    for (index, item) in items.iter().enumerate() {
        let value = time(item);
        if !value.is_finite() {
            return Err(UnencodableScore::NonFiniteTime { kind, index, value });
        }
    }

    let mut items = items.to_vec();
    if let Some(index) = first_out_of_order(&items, &time) {
        if strict {
            return Err(UnencodableScore::OutOfOrder {
                kind,
                index,
                time: time(&items[index]),
            });
        }
        warn!("{} list goes back in time at entry {}, sorting it", kind, index);
        items.sort_by(|a, b| time(a).total_cmp(&time(b)));
    }
    Ok(items)
}

/// Tempo map over the tempos as MIDI will store them
fn build_tempo_map(
    ticks_per_quarter: u16,
    tempos: &[Tempo],
    defaults: &Defaults,
) -> Result<TempoMap, UnencodableScore> {
    let mut changes = Vec::with_capacity(tempos.len());
    for (index, tempo) in tempos.iter().enumerate() {
        let micros = qpm_to_micros(tempo.qpm).ok_or(UnencodableScore::TempoOutOfRange {
            index,
            qpm: tempo.qpm,
        })?;
        changes.push((tempo.time, micros_to_qpm(micros)));
    }

    let initial = qpm_to_micros(defaults.qpm).ok_or(UnencodableScore::TempoOutOfRange {
        index: 0,
        qpm: defaults.qpm,
    })?;
    TempoMap::from_seconds(u32::from(ticks_per_quarter), micros_to_qpm(initial), changes).map_err(
        |index| UnencodableScore::TimeOutOfRange {
            kind: "tempo",
            index,
            value: tempos[index].time,
        },
    )
}

/// Tick for a time, or the error naming the entry it belongs to
fn tick_for(
    tempo_map: &TempoMap,
    kind: &'static str,
    index: usize,
    value: f64,
) -> Result<u64, UnencodableScore> {
    tempo_map
        .seconds_to_ticks(value)
        .ok_or(UnencodableScore::TimeOutOfRange { kind, index, value })
}

fn conductor_track(
    tempo_map: &TempoMap,
    time_signatures: &[TimeSignature],
    key_signatures: &[KeySignature],
) -> Result<Track<'static>, UnencodableScore> {
    let mut events = Vec::new();

    for (index, point) in tempo_map.breakpoints().iter().enumerate() {
        let micros = qpm_to_micros(point.qpm).ok_or(UnencodableScore::TempoOutOfRange {
            index,
            qpm: point.qpm,
        })?;
        events.push(Timed::meta(point.tick, MetaMessage::Tempo(micros.into())));
    }

    for (index, ts) in time_signatures.iter().enumerate() {
        let unencodable = || UnencodableScore::UnencodableTimeSignature {
            index,
            numerator: ts.numerator,
            denominator: ts.denominator,
        };
        let numerator = u8::try_from(ts.numerator)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(unencodable)?;
        let denominator = u32::try_from(ts.denominator)
            .ok()
            .filter(|d| d.is_power_of_two())
            .ok_or_else(unencodable)?;
        events.push(Timed::meta(
            tick_for(tempo_map, "time signature", index, ts.time)?,
            // 24 MIDI clocks per metronome click, 8 32nd notes per quarter
            MetaMessage::TimeSignature(numerator, denominator.trailing_zeros() as u8, 24, 8),
        ));
    }

    for (index, ks) in key_signatures.iter().enumerate() {
        if !(0..12).contains(&ks.key) {
            return Err(UnencodableScore::KeyOutOfRange { index, key: ks.key });
        }
        events.push(Timed::meta(
            tick_for(tempo_map, "key signature", index, ks.time)?,
            MetaMessage::KeySignature(
                key::to_sharps(ks.key, ks.mode),
                ks.mode == Mode::Minor,
            ),
        ));
    }

    to_track(0, events)
}

fn check_note(index: usize, note: &Note) -> Result<(), UnencodableScore> {
    if !(0..=127).contains(&note.pitch) {
        return Err(UnencodableScore::PitchOutOfRange {
            index,
            pitch: note.pitch,
        });
    }
    if !(1..=127).contains(&note.velocity) {
        return Err(UnencodableScore::VelocityOutOfRange {
            index,
            velocity: note.velocity,
        });
    }
    if !(0..=127).contains(&note.program) {
        return Err(UnencodableScore::ProgramOutOfRange {
            index,
            program: note.program,
        });
    }
    for value in [note.start_time, note.end_time] {
        if !value.is_finite() {
            return Err(UnencodableScore::NonFiniteTime {
                kind: "note",
                index,
                value,
            });
        }
    }
    Ok(())
}

/// One instrument's notes placed on ticks, sorted by (start, end)
struct Part<'a> {
    instrument: i32,
    notes: Vec<(u64, u64, &'a Note)>,
    /// Programs of the first melodic and first drum note in score order
    melodic_program: Option<u8>,
    drum_program: Option<u8>,
}

impl Part<'_> {
    /// First and last tick of the melodic notes, if any
    fn melodic_span(&self) -> Option<(u64, u64)> {
        let mut melodic = self.notes.iter().filter(|(_, _, note)| !note.is_drum);
        let &(first, mut last, _) = melodic.next()?;
        for &(_, end, _) in melodic {
            last = last.max(end);
        }
        Some((first, last))
    }
}

fn note_tracks(
    notes: &[Note],
    tempo_map: &TempoMap,
) -> Result<Vec<Track<'static>>, UnencodableScore> {
    let mut groups: BTreeMap<i32, Vec<(usize, &Note)>> = BTreeMap::new();
    for (index, note) in notes.iter().enumerate() {
        check_note(index, note)?;
        groups.entry(note.instrument).or_default().push((index, note));
    }

    let mut parts = Vec::with_capacity(groups.len());
    for (instrument, group) in groups {
        let mut placed = Vec::with_capacity(group.len());
        let mut melodic_program = None;
        let mut drum_program = None;
        for (index, note) in group {
            let program = if note.is_drum {
                &mut drum_program
            } else {
                &mut melodic_program
            };
            if program.is_none() {
                *program = Some(note.program as u8);
            }

            let start = tick_for(tempo_map, "note", index, note.start_time)?;
            let end = tick_for(tempo_map, "note", index, note.end_time)?.max(start);
            placed.push((start, end, note));
        }
        // stable: notes with equal bounds keep insertion order
        placed.sort_by_key(|&(start, end, _)| (start, end));
        parts.push(Part {
            instrument,
            notes: placed,
            melodic_program,
            drum_program,
        });
    }

    let spans: Vec<_> = parts.iter().map(Part::melodic_span).collect();
    let channels = allocate_channels(&spans)?;

    let mut tracks = Vec::with_capacity(parts.len());
    for (track_idx, (part, melodic_channel)) in parts.iter().zip(channels).enumerate() {
        let channel_for = |note: &Note| -> (u8, Option<u8>) {
            match (note.is_drum, melodic_channel) {
                (false, Some(channel)) => (channel, part.melodic_program),
                _ => (PERCUSSION_CHANNEL, part.drum_program),
            }
        };

        let mut events = Vec::with_capacity(part.notes.len() * 2 + 2);
        let mut programmed = [false; 16];
        for &(start, end, note) in &part.notes {
            let (channel, program) = channel_for(note);
            // sent with the channel's earliest note so a shared channel
            // switches program between parts
            if !programmed[usize::from(channel)] {
                programmed[usize::from(channel)] = true;
                if let Some(program) = program {
                    events.push(Timed::midi(
                        start,
                        ORDER_SETUP,
                        channel,
                        MidiMessage::ProgramChange {
                            program: u7::new(program),
                        },
                    ));
                }
            }

            let key = u7::new(note.pitch as u8);
            events.push(Timed::midi(
                start,
                ORDER_NOTE_ON,
                channel,
                MidiMessage::NoteOn {
                    key,
                    vel: u7::new(note.velocity as u8),
                },
            ));
            let off_order = if end == start {
                ORDER_NOTE_ON
            } else {
                ORDER_NOTE_OFF
            };
            events.push(Timed::midi(
                end,
                off_order,
                channel,
                MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            ));
        }

        trace!(
            "instrument {} -> track {} on channel {:?}",
            part.instrument,
            track_idx + 1,
            melodic_channel
        );
        tracks.push(to_track(track_idx + 1, events)?);
    }

    Ok(tracks)
}

/// Melodic channel for each part, in the order of `spans`.
///
/// Parts are taken by start tick and each gets the lowest channel that has
/// fallen silent by then, so parts that never overlap share a channel.
fn allocate_channels(
    spans: &[Option<(u64, u64)>],
) -> Result<Vec<Option<u8>>, UnencodableScore> {
    let mut order: Vec<(u64, u64, usize)> = spans
        .iter()
        .enumerate()
        .filter_map(|(part, span)| span.map(|(start, end)| (start, end, part)))
        .collect();
    order.sort_unstable();

    let mut busy_until: [Option<u64>; MELODIC_CHANNELS.len()] = [None; MELODIC_CHANNELS.len()];
    let mut channels = vec![None; spans.len()];
    for (start, end, part) in order {
        let free = busy_until
            .iter()
            .position(|until| until.map_or(true, |until| until <= start))
            .ok_or(UnencodableScore::TooManyChannels {
                count: MELODIC_CHANNELS.len() + 1,
                available: MELODIC_CHANNELS.len(),
            })?;
        busy_until[free] = Some(end);
        channels[part] = Some(MELODIC_CHANNELS[free]);
    }
    Ok(channels)
}

/// Sort by tick and rewrite absolute ticks as deltas, closing the track
fn to_track(track_idx: usize, mut events: Vec<Timed>) -> Result<Track<'static>, UnencodableScore> {
    // stable: equal keys keep their push order
    events.sort_by_key(|e| (e.tick, e.order));

    let mut track = Vec::with_capacity(events.len() + 1);
    let mut prev_tick = 0u64;
    for event in events {
        let delta = event.tick - prev_tick;
        if delta > MAX_DELTA {
            return Err(UnencodableScore::DeltaOverflow {
                track: track_idx,
                ticks: delta,
            });
        }
        track.push(TrackEvent {
            delta: u28::new(delta as u32),
            kind: event.kind,
        });
        prev_tick = event.tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    Ok(track)
}
