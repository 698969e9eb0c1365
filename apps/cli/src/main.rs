use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hexlog_core::{TranscodeConfig, Transcoder};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Check and convert OpenSeaMap logger files containing binary data",
    long_about = None
)]
struct Args {
    /// Capture file to read (stdin when omitted)
    input: Option<PathBuf>,

    /// Treat channel A as ASCII instead of binary
    #[arg(short = 'a', long)]
    ascii: bool,

    /// Append a state trace line after every input byte
    #[arg(short = 'd', long = "debug", value_name = "LEVEL")]
    debug_level: Option<u8>,

    /// Separator placed before every hex byte of a binary segment
    #[arg(short = 's', long, value_name = "SEP")]
    separator: Option<String>,

    /// TOML file with default settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn transcode_config(&self) -> Result<TranscodeConfig> {
        let mut config = match &self.config {
            Some(path) => TranscodeConfig::load_from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => TranscodeConfig::default(),
        };
        if self.ascii {
            config.ascii_channel_a = true;
        }
        if let Some(level) = self.debug_level {
            config.debug_level = level;
        }
        if self.separator.is_some() {
            config.separator = self.separator.clone();
        }
        Ok(config)
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.transcode_config()?;
    let transcoder = Transcoder::new(config);
    let stdout = io::stdout();

    let summary = match &args.input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            transcoder.run(file, stdout.lock())?
        }
        None => transcoder.run(io::stdin().lock(), stdout.lock())?,
    };

    info!(
        bytes_in = summary.bytes_in,
        bytes_out = summary.bytes_out,
        verified = summary.sentences_verified,
        checksum_errors = summary.checksum_errors,
        segments = summary.segments,
        annotations = summary.annotations(),
        "Done"
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(&args) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
