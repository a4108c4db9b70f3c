//! Command line interface.

use crate::{app::GuiMode, config::Config};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, time::Duration};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Mode,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Mode {
    /// Track head orientation from recorded landmark frames
    Track(TrackArgs),

    /// Split the ECG/IMU serial stream into CSV logs
    Serial(SerialArgs),

    /// Print an example configuration file
    ExampleConfig,
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct TrackArgs {
    /// Landmark replay file, one `x0,y0,...,x67,y67` frame per line
    pub landmarks: PathBuf,

    /// Playback rate in frames per second (0 for no pacing)
    #[arg(long, default_value = "30", value_parser = parse_fps)]
    pub fps: f64,

    /// Smoothing filter (moving_average[:N], median[:N], exponential[:A], none)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Moving average window size
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Directory for the orientation log
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// GUI display mode (terminal, none)
    #[arg(short, long, default_value = "terminal")]
    pub gui: GuiMode,
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct SerialArgs {
    /// Serial device, e.g. /dev/ttyACM0, or a captured stream file
    pub device: PathBuf,

    /// Stop at end of input instead of waiting for more data
    #[arg(long)]
    pub once: bool,

    /// Directory for the ECG and IMU logs
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Wait after opening the device, in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Serial line speed
    #[arg(short, long)]
    pub baud_rate: Option<u32>,

    /// Serial read timeout, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

fn parse_fps(value: &str) -> Result<f64, String> {
    let fps: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if !fps.is_finite() || fps < 0.0 {
        return Err("must be a non-negative number".to_string());
    }
    if fps > 0.0 && Duration::try_from_secs_f64(1.0 / fps).is_err() {
        return Err("frame interval out of range".to_string());
    }
    Ok(fps)
}

impl TrackArgs {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(filter) = &self.filter {
            config.smoothing.filter.clone_from(filter);
        }
        if let Some(window) = self.window {
            config.smoothing.window = window;
        }
        if let Some(dir) = &self.output_dir {
            config.logging.output_dir.clone_from(dir);
        }
    }

    /// Pause between replayed frames
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        if self.fps.is_finite() && self.fps > 0.0 {
            Duration::try_from_secs_f64(1.0 / self.fps).unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }
}

impl SerialArgs {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if self.once {
            config.serial.follow = false;
        }
        if let Some(dir) = &self.output_dir {
            config.serial.output_dir.clone_from(dir);
        }
        if let Some(settle_ms) = self.settle_ms {
            config.serial.settle_ms = settle_ms;
        }
        if let Some(baud_rate) = self.baud_rate {
            config.serial.baud_rate = baud_rate;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.serial.timeout_ms = timeout_ms;
        }
    }
}
