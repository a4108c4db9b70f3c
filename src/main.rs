//! Head orientation tracking and sensor stream capture.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use head_orientation::{
    app::{create_display, GuiMode, TrackerApp},
    cli::{Args, Mode, SerialArgs, TrackArgs},
    config::{Config, EXAMPLE_CONFIG},
    constants::{ECG_LOG_PREFIX, IMU_LOG_PREFIX, ORIENTATION_LOG_PREFIX},
    records::{session_file_name, RecordLog},
    serial::{open_line_source, Demultiplexer},
    source::{spawn_stdin_events, ReplaySource},
};
use log::{info, warn};
use std::{path::Path, time::Duration};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let config = load_config(args.config.as_deref());

    match args.command {
        Mode::ExampleConfig => {
            print!("{EXAMPLE_CONFIG}");
            Ok(())
        }
        Mode::Track(track) => run_tracker(config, &track),
        Mode::Serial(serial) => run_serial(config, &serial),
    }
}

fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };

    info!("Loading configuration from: {}", path.display());
    match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config file: {e}. Using defaults.");
            Config::default()
        }
    }
}

fn run_tracker(mut config: Config, track: &TrackArgs) -> Result<()> {
    track.apply_to(&mut config);
    config.validate()?;

    info!("Head Orientation Tracker");
    let session = config.build_session()?;
    let frames = ReplaySource::open(&track.landmarks)?.with_frame_interval(track.frame_interval());
    let events = spawn_stdin_events()?;

    let output_dir = &config.logging.output_dir;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create output directory {}", output_dir.display()))?;
    let log_path = output_dir.join(session_file_name(ORIENTATION_LOG_PREFIX, &Local::now()));
    let orientation_log = RecordLog::create(&log_path)?;

    let mut app = TrackerApp::new(
        session,
        config.calibration_controller(),
        frames,
        events,
        create_display(track.gui),
        orientation_log,
    );
    let summary = app.run()?;

    if track.gui == GuiMode::Terminal {
        eprintln!();
    }
    info!(
        "Tracked {} of {} frames, {} calibrations ({} failed), final offset {:.4}",
        summary.tracked, summary.frames, summary.calibrations, summary.failed_calibrations, summary.final_offset
    );
    info!("Orientation data saved to {}", log_path.display());
    Ok(())
}

fn run_serial(mut config: Config, serial: &SerialArgs) -> Result<()> {
    serial.apply_to(&mut config);
    config.validate()?;

    info!("Sensor Stream Capture");
    let reader = open_line_source(&serial.device, &config.port_settings())?;

    let output_dir = &config.serial.output_dir;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create output directory {}", output_dir.display()))?;
    let started = Local::now();
    let ecg_path = output_dir.join(session_file_name(ECG_LOG_PREFIX, &started));
    let imu_path = output_dir.join(session_file_name(IMU_LOG_PREFIX, &started));

    let mut demux = Demultiplexer::new(reader, RecordLog::create(&ecg_path)?, RecordLog::create(&imu_path)?)
        .with_follow(config.serial.follow)
        .with_poll_delay(Duration::from_millis(config.serial.poll_delay_ms))
        .with_stats_interval(Duration::from_millis(config.serial.stats_interval_ms));

    let mut events = spawn_stdin_events()?;
    let stats = demux.run(&mut events)?;

    info!(
        "ECG records: {}, IMU records: {}, malformed lines: {}",
        stats.ecg, stats.imu, stats.malformed
    );
    info!("Data saved to {} and {}", ecg_path.display(), imu_path.display());
    Ok(())
}
