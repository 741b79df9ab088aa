use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use inlink::{Alphabet, CodecConfig, RadixCodec, DEFAULT_ALPHABET};

/// Pack bytes into a locator-safe string and back.
#[derive(Parser)]
#[command(name = "inlink", version)]
struct Cli {
    /// Alphabet to encode with; every output character comes from it.
    #[arg(long, default_value = DEFAULT_ALPHABET)]
    alphabet: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a file into a locator string.
    Encode {
        input: PathBuf,
        /// Write the string here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode a locator string (read from a file) back into bytes.
    Decode {
        input: PathBuf,
        /// Write the bytes here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fall back to the best-effort salvage decoder on damaged input.
        #[arg(long)]
        lenient: bool,
    },
    /// Print the projected symbol count for a payload size.
    Estimate { bytes: usize },
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let alphabet = Alphabet::new(&cli.alphabet)?;
    let mut codec = RadixCodec::new(alphabet, CodecConfig::default())?;

    match cli.command {
        Command::Encode { input, output } => {
            let bytes = fs::read(&input)?;
            let spinner = if bytes.len() > 1 << 20 {
                let pb = ProgressBar::new_spinner();
                pb.set_message(format!("encoding {} bytes", bytes.len()));
                pb.enable_steady_tick(Duration::from_millis(100));
                Some(pb)
            } else {
                None
            };
            let encoded = codec.encode(&bytes);
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            match output {
                Some(path) => fs::write(path, encoded)?,
                None => println!("{encoded}"),
            }
        }
        Command::Decode {
            input,
            output,
            lenient,
        } => {
            let text = fs::read_to_string(&input)?;
            let text = text.trim();
            let decoded = if lenient {
                codec.decode_lenient(text)?
            } else {
                codec.decode(text)?
            };
            if !decoded.checksum_ok {
                log::warn!("checksum did not verify; output is best-effort");
            }
            match output {
                Some(path) => fs::write(path, &decoded.bytes)?,
                None => std::io::stdout().write_all(&decoded.bytes)?,
            }
        }
        Command::Estimate { bytes } => {
            println!("{}", codec.estimate_encoded_length(bytes));
        }
    }
    Ok(())
}
