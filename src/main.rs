use clap::Parser;
use flate2::write::GzEncoder;
use flate2::Compression;
use midi2vgm::{AllocationMode, ConvertOptions, Summary};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "midi2vgm")]
#[command(version = "0.1.0")]
#[command(about = "MIDI to dual AY-3-8910 VGM converter", long_about = None)]
struct Args {
    /// Input MIDI file (reads from stdin if not specified)
    input: Option<PathBuf>,

    /// Output VGM file (streams to stdout if not specified, .vgz is gzipped)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Voice allocation policy
    #[arg(short, long, value_enum)]
    mode: Option<AllocationMode>,

    /// Output samples per MIDI tick
    #[arg(long)]
    samples_per_tick: Option<u32>,

    /// JSON file with conversion options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not append the end of sound data command
    #[arg(long)]
    no_end_marker: bool,

    /// Show every note event
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        true => log::LevelFilter::Debug,
        false => log::LevelFilter::Info,
    };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .target(pretty_env_logger::env_logger::Target::Stderr)
        .init();

    match run(args) {
        Ok(summary) => {
            log::info!(
                "{} event(s), {} sample(s), {} byte(s), {} warning(s)",
                summary.events,
                summary.samples,
                summary.bytes,
                summary.warnings.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn options(args: &Args) -> midi2vgm::error::Result<ConvertOptions> {
    let mut options = match &args.config {
        Some(path) => ConvertOptions::from_json_file(path)?,
        None => ConvertOptions::default(),
    };
    if let Some(mode) = args.mode {
        options.mode = mode;
    }
    if let Some(samples) = args.samples_per_tick {
        options.samples_per_tick = samples;
    }
    if args.no_end_marker {
        options.end_marker = false;
    }
    options.validate()?;
    Ok(options)
}

fn run(args: Args) -> midi2vgm::error::Result<Summary> {
    let options = options(&args)?;

    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin().lock())),
    };

    match &args.output {
        Some(path) => {
            let mut data = Vec::new();
            let mut input = input;
            input.read_to_end(&mut data)?;
            let (vgm, summary) = midi2vgm::convert_to_vec(&data, options)?;
            write_vgm_file(path, &vgm)?;
            Ok(summary)
        }
        None => {
            let output = BufWriter::new(io::stdout().lock());
            midi2vgm::convert(input, output, options)
        }
    }
}

/// Write a VGM file, gzipping it when the extension is .vgz
fn write_vgm_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let file = BufWriter::new(File::create(path)?);
    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("vgz"))
        .unwrap_or(false);

    if is_gzip {
        let mut encoder = GzEncoder::new(file, Compression::best());
        encoder.write_all(data)?;
        encoder.finish()?.flush()
    } else {
        let mut file = file;
        file.write_all(data)?;
        file.flush()
    }
}
