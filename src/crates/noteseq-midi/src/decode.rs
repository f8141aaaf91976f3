use log::{debug, trace, warn};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::collections::HashMap;

use noteseq_core::{Defaults, KeySignature, Note, Score, TimeSignature};

use crate::config::DecodeOptions;
use crate::error::MalformedMidi;
use crate::key;
use crate::tempo::{micros_to_qpm, TempoCursor, TempoMap};
use crate::PERCUSSION_CHANNEL;

/// Track, channel, pitch
type NoteKey = (usize, u8, u8);

/// Track, channel, program
type InstrumentKey = (usize, u8, u8);

#[derive(Debug, Clone, Copy)]
struct OpenNote {
    start_time: f64,
    velocity: u8,
    program: u8,
    instrument: i32,
}

/// Decode a Standard MIDI File with default options
pub fn decode(bytes: &[u8]) -> Result<Score, MalformedMidi> {
    decode_with(bytes, &DecodeOptions::default())
}

/// Decode a Standard MIDI File into a score.
///
/// Tempo events from every track form one global tempo map; each track is
/// then scanned once with a running tick clock. Nothing is returned unless
/// the whole file decodes.
pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> Result<Score, MalformedMidi> {
    if let Some(limit) = options.max_bytes {
        if bytes.len() > limit {
            return Err(MalformedMidi::TooLarge {
                len: bytes.len(),
                limit,
            });
        }
    }

    let smf = Smf::parse(bytes)?;
    let ticks_per_quarter = resolution(&smf.header)?;
    let tempo_map = collect_tempo_map(&smf, ticks_per_quarter, options.defaults.qpm)?;

    let mut scan = Scan::default();
    for (track_idx, track) in smf.tracks.iter().enumerate() {
        scan.track(track_idx, track, tempo_map.cursor())?;
    }
    let score = scan.finish(&tempo_map, &options.defaults);

    debug!(
        "decoded {} bytes: {} tracks at {} ticks/quarter, {} notes, {} tempo changes",
        bytes.len(),
        smf.tracks.len(),
        ticks_per_quarter,
        score.notes.len(),
        score.tempos.len()
    );
    Ok(score)
}

fn resolution(header: &Header) -> Result<u32, MalformedMidi> {
    if matches!(header.format, Format::Sequential) {
        return Err(MalformedMidi::UnsupportedFormat(2));
    }
    match header.timing {
        Timing::Metrical(tpq) if tpq.as_int() == 0 => Err(MalformedMidi::ZeroResolution),
        Timing::Metrical(tpq) => Ok(u32::from(tpq.as_int())),
        Timing::Timecode(..) => Err(MalformedMidi::UnsupportedTiming),
    }
}

/// First pass: tempo events from all tracks, ordered by absolute tick
fn collect_tempo_map(
    smf: &Smf,
    ticks_per_quarter: u32,
    initial_qpm: f64,
) -> Result<TempoMap, MalformedMidi> {
    let mut changes = Vec::new();

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut tick = 0u64;
        for event in track {
            tick += u64::from(event.delta.as_int());
            if let TrackEventKind::Meta(MetaMessage::Tempo(micros)) = event.kind {
                let micros = micros.as_int();
                if micros == 0 {
                    return Err(MalformedMidi::ZeroTempo {
                        track: track_idx,
                        tick,
                    });
                }
                changes.push((tick, micros_to_qpm(micros)));
            }
        }
    }

    // stable, so a later track's change at the same tick overrides
    changes.sort_by_key(|&(tick, _)| tick);
    Ok(TempoMap::from_ticks(ticks_per_quarter, initial_qpm, changes))
}

#[derive(Default)]
struct Scan {
    notes: Vec<Note>,
    time_signatures: Vec<TimeSignature>,
    key_signatures: Vec<KeySignature>,
    pending: HashMap<NoteKey, OpenNote>,
    instruments: HashMap<InstrumentKey, i32>,
}

impl Scan {
    fn track(
        &mut self,
        track_idx: usize,
        track: &[TrackEvent],
        mut clock: TempoCursor<'_>,
    ) -> Result<(), MalformedMidi> {
        let mut tick = 0u64;
        let mut programs = [0u8; 16];

        for event in track {
            tick += u64::from(event.delta.as_int());

            match event.kind {
                TrackEventKind::Midi { channel, message } => {
                    let channel = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            let note_key = (track_idx, channel, key.as_int());
                            let time = clock.seconds_at(tick);
                            if let Some(open) = self.pending.remove(&note_key) {
                                warn!(
                                    "track {}: pitch {} struck again at tick {} before its note-off, closing the earlier note",
                                    track_idx,
                                    key.as_int(),
                                    tick
                                );
                                self.close(note_key, open, time);
                            }
                            let program = programs[usize::from(channel)];
                            let instrument = self.instrument((track_idx, channel, program));
                            self.pending.insert(
                                note_key,
                                OpenNote {
                                    start_time: time,
                                    velocity: vel.as_int(),
                                    program,
                                    instrument,
                                },
                            );
                        }
                        // a note-on with velocity 0 is a note-off
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let note_key = (track_idx, channel, key.as_int());
                            match self.pending.remove(&note_key) {
                                Some(open) => {
                                    let time = clock.seconds_at(tick);
                                    self.close(note_key, open, time);
                                }
                                None => trace!(
                                    "track {}: ignoring note-off for pitch {} at tick {} with no open note",
                                    track_idx,
                                    key.as_int(),
                                    tick
                                ),
                            }
                        }
                        MidiMessage::ProgramChange { program } => {
                            programs[usize::from(channel)] = program.as_int();
                        }
                        _ => {}
                    }
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, exponent, _, _)) => {
                    if exponent > 30 {
                        return Err(MalformedMidi::TimeSignatureOverflow {
                            track: track_idx,
                            tick,
                            exponent,
                        });
                    }
                    self.time_signatures.push(TimeSignature::new(
                        clock.seconds_at(tick),
                        i32::from(numerator),
                        1 << exponent,
                    ));
                }
                TrackEventKind::Meta(MetaMessage::KeySignature(sharps, minor)) => {
                    self.key_signatures
                        .push(key::from_sharps(clock.seconds_at(tick), sharps, minor));
                }
                _ => {}
            }
        }

        // notes still sounding end with their track
        if !self.pending.is_empty() {
            let end = clock.seconds_at(tick);
            let mut dangling: Vec<_> = std::mem::take(&mut self.pending).into_iter().collect();
            dangling.sort_by_key(|&(note_key, _)| note_key);
            debug!(
                "track {}: closing {} notes without note-off at tick {}",
                track_idx,
                dangling.len(),
                tick
            );
            for (note_key, open) in dangling {
                self.close(note_key, open, end);
            }
        }

        Ok(())
    }

    /// Instrument index for a group, allocated in order of first use
    fn instrument(&mut self, key: InstrumentKey) -> i32 {
        let next = self.instruments.len() as i32;
        *self.instruments.entry(key).or_insert(next)
    }

    fn close(&mut self, (_, channel, pitch): NoteKey, open: OpenNote, end_time: f64) {
        self.notes.push(Note {
            pitch: i32::from(pitch),
            start_time: open.start_time,
            end_time,
            velocity: i32::from(open.velocity),
            instrument: open.instrument,
            program: i32::from(open.program),
            is_drum: channel == PERCUSSION_CHANNEL,
        });
    }

    fn finish(mut self, tempo_map: &TempoMap, defaults: &Defaults) -> Score {
        self.notes
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        self.time_signatures
            .sort_by(|a, b| a.time.total_cmp(&b.time));
        self.key_signatures
            .sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut score = Score {
            notes: self.notes,
            tempos: tempo_map.tempos(),
            time_signatures: self.time_signatures,
            key_signatures: self.key_signatures,
            total_time: None,
        };
        score.fill_defaults(defaults);
        score
    }
}
