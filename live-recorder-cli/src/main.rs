mod commands;
mod delegate;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use live_recorder_core::{RecorderConfiguration, SessionController};
use live_recorder_platform::{CpalCaptureProvider, CpalDeviceCatalog};

use commands::Output;

/// Live input level meter and WAV recorder.
#[derive(Parser)]
#[command(name = "live-recorder", version, about)]
struct Cli {
    /// Print events as JSON lines instead of a live meter
    #[arg(long, global = true)]
    json: bool,

    /// Capture and output sample rate in Hz
    #[arg(long, global = true, default_value_t = 44100)]
    sample_rate: u32,

    /// Output PCM bit depth (16, 24 or 32)
    #[arg(long, global = true, default_value_t = 16)]
    bit_depth: u16,

    /// Maximum channels to capture
    #[arg(long, global = true, default_value_t = 2)]
    max_channels: u16,

    /// Requested driver block size in frames
    #[arg(long, global = true, default_value_t = 4096)]
    block_frames: u32,

    /// Let the driver pick the block size
    #[arg(long, global = true, conflicts_with = "block_frames")]
    driver_blocks: bool,

    /// Directory for generated recording names
    #[arg(long, global = true, default_value = "audio_data")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List input devices (* marks the default selection)
    Devices,

    /// Show the live input level
    Monitor {
        /// Device index from `devices`
        #[arg(short, long)]
        device: Option<usize>,

        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(short, long)]
        seconds: Option<u64>,
    },

    /// Record the input to a WAV file
    Record {
        /// Device index from `devices`
        #[arg(short, long)]
        device: Option<usize>,

        /// Output file (default: <output-dir>/recorded_audio_<timestamp>.wav)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(short, long)]
        seconds: Option<u64>,

        /// Open the recording with the default player when done
        #[arg(long)]
        play: bool,
    },
}

impl Cli {
    fn configuration(&self) -> RecorderConfiguration {
        RecorderConfiguration {
            sample_rate: self.sample_rate,
            bit_depth: self.bit_depth,
            max_channels: self.max_channels,
            block_frames: (!self.driver_blocks).then_some(self.block_frames),
            output_directory: self.output_dir.clone(),
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    let mut controller = SessionController::new(
        CpalDeviceCatalog::new(),
        CpalCaptureProvider::new(),
        cli.configuration(),
    )?;
    controller.refresh_devices()?;
    let output = Output::new(cli.json);

    match cli.command {
        Command::Devices => commands::list_devices(&controller, &output)?,
        Command::Monitor { device, seconds } => {
            commands::monitor(&mut controller, &output, device, seconds, &running)?
        }
        Command::Record {
            device,
            output: path,
            seconds,
            play,
        } => {
            let result = commands::record(
                &mut controller,
                &output,
                device,
                path,
                seconds,
                play,
                &running,
            )?;
            log::info!("Recorded {} frames to {}", result.frame_count, result.path.display());
        }
    }
    Ok(())
}
