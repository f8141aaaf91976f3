use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use noteseq_core::Score;
use noteseq_midi::{DecodeOptions, EncodeOptions, STANDARD_PPQ};

#[derive(Parser, Debug)]
#[command(name = "noteseq-bridge")]
#[command(about = "Convert between NoteSequence JSON and Standard MIDI Files", long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a MIDI file into NoteSequence JSON
    MidiToJson {
        /// Path to the .mid file
        midi_file: PathBuf,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Refuse files larger than this many bytes
        #[arg(long)]
        max_bytes: Option<usize>,
    },
    /// Encode NoteSequence JSON as a format 1 MIDI file
    JsonToMidi {
        /// Path to the score JSON
        json_file: PathBuf,

        /// Output .mid path
        #[arg(short, long)]
        output: PathBuf,

        /// Ticks per quarter note
        #[arg(long, default_value_t = STANDARD_PPQ)]
        ppq: u16,

        /// Reject scores with unordered or out-of-range values instead of repairing them
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::MidiToJson {
            midi_file,
            output,
            max_bytes,
        } => midi_to_json(midi_file, output, max_bytes),
        Commands::JsonToMidi {
            json_file,
            output,
            ppq,
            strict,
        } => json_to_midi(json_file, output, ppq, strict),
    }
}

/// Logs go to stderr so stdout stays clean JSON
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn midi_to_json(midi_file: PathBuf, output: Option<PathBuf>, max_bytes: Option<usize>) -> Result<()> {
    let bytes = fs::read(&midi_file)
        .with_context(|| format!("Failed to read MIDI file: {}", midi_file.display()))?;

    let options = DecodeOptions {
        max_bytes,
        ..DecodeOptions::default()
    };
    let score = noteseq_midi::decode_with(&bytes, &options)
        .with_context(|| format!("Failed to decode {}", midi_file.display()))?;
    info!(
        "Decoded {} notes, {:.2}s",
        score.notes.len(),
        score.total_time.unwrap_or_default()
    );

    let json = serde_json::to_string_pretty(&score).context("Failed to serialize score")?;
    match output {
        Some(path) => {
            fs::write(&path, json + "\n")
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn json_to_midi(json_file: PathBuf, output: PathBuf, ppq: u16, strict: bool) -> Result<()> {
    let text = fs::read_to_string(&json_file)
        .with_context(|| format!("Failed to read JSON file: {}", json_file.display()))?;
    let score: Score = serde_json::from_str(&text)
        .with_context(|| format!("Invalid score JSON in {}", json_file.display()))?;

    let options = EncodeOptions {
        ticks_per_quarter: ppq,
        strict,
        ..EncodeOptions::default()
    };
    let bytes = noteseq_midi::encode_with(&score, &options)
        .with_context(|| format!("Failed to encode {}", json_file.display()))?;

    fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;
    info!(
        "Wrote {} notes to {} ({} bytes)",
        score.notes.len(),
        output.display(),
        bytes.len()
    );
    Ok(())
}
