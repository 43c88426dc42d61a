//! Dump converter output as JSON
//!
//! The default view lists every command; `--voices` folds the AY writes back
//! into the six voices the converter allocates.

use clap::Parser;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use midi2vgm::vgm::{group_by_voice, VgmJson, VgmReader};

#[derive(Parser, Debug)]
#[command(name = "vgm2json")]
#[command(version = "0.1.0")]
#[command(about = "Convert VGM/VGZ files to JSON", long_about = None)]
struct Args {
    /// Input VGM or VGZ file
    input: PathBuf,

    /// Output JSON file (writes to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output compact JSON (default is pretty-printed)
    #[arg(short, long)]
    compact: bool,

    /// Group AY writes into per-voice period and volume changes
    #[arg(long)]
    voices: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let data = read_vgm_file(&args.input)?;

    let mut reader = VgmReader::new(&data);
    let header = reader.parse_header()?;
    let commands = reader.parse_commands(&header)?;
    let value = if args.voices {
        serde_json::to_value(group_by_voice(&commands))?
    } else {
        serde_json::to_value(VgmJson::new(&header, commands))?
    };

    let json_string = if args.compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };

    match args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(json_string.as_bytes())?;
            file.write_all(b"\n")?;
        }
        None => {
            println!("{}", json_string);
        }
    }

    Ok(())
}

/// Read a VGM or VGZ file, decompressing when the gzip magic is present
fn read_vgm_file(path: &PathBuf) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    File::open(path)?.read_to_end(&mut data)?;

    if data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b {
        let mut decoder = GzDecoder::new(&data[..]);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;
        Ok(decompressed)
    } else {
        Ok(data)
    }
}
