//! Head orientation library for landmark-based yaw tracking and sensor capture.
//!
//! The orientation pipeline turns 68-point facial landmarks into a normalized
//! left-right orientation in [-1, 1]:
//! 1. Estimate the raw orientation from the face edges and nose tip
//! 2. Subtract the offset found by the interactive calibration
//! 3. Smooth over a short moving-average window
//! 4. Log the value when it changed enough or the heartbeat elapsed
//!
//! A second pipeline splits a tagged ECG/IMU serial stream into two CSV logs.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use head_orientation::{landmarks::LandmarkSet, orientation::OrientationEstimator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Face edges at x=0 and x=100, nose tip centered
//! let mut points = vec![(50, 50); 68];
//! points[0] = (0, 50);
//! points[16] = (100, 50);
//! points[30] = (50, 50);
//! let landmarks = LandmarkSet::from(points);
//!
//! let orientation = OrientationEstimator::default().estimate(&landmarks)?;
//! assert_eq!(orientation, 0.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Session Pipeline
//!
//! ```
//! use head_orientation::{landmarks::LandmarkSet, session::Session};
//! use std::time::Instant;
//!
//! let mut points = vec![(50, 50); 68];
//! points[0] = (0, 50);
//! points[16] = (100, 50);
//! points[30] = (60, 50);
//! let landmarks = LandmarkSet::from(points);
//!
//! let mut session = Session::default();
//! session.apply_calibration(0.1);
//! if let Some(update) = session.process(&landmarks, Instant::now()) {
//!     println!("raw {:.2}, logged {:.2}", update.raw, update.smoothed);
//! }
//! ```
//!
//! ## Serial Stream
//!
//! ```
//! use head_orientation::{records::SensorRecord, serial::parse_line};
//!
//! let record = parse_line("ECG,512", "2024-01-31 15:45:02.125".to_string()).unwrap();
//! assert!(matches!(record, SensorRecord::Ecg(ref ecg) if ecg.ecg_value == 512));
//! assert!(parse_line("FOO,1,2", String::new()).is_err());
//! ```

/// Facial landmark points and frames
pub mod landmarks;

/// Yaw orientation estimation from landmark geometry
pub mod orientation;

/// Signal filtering algorithms for smoothing the orientation
pub mod filters;

/// Interactive zero-reference calibration
pub mod calibration;

/// Change/heartbeat policy for the orientation log
pub mod gate;

/// Per-run orientation state
pub mod session;

/// Timestamped records and CSV logs
pub mod records;

/// Frame and operator-event sources
pub mod source;

/// Operator feedback
pub mod display;

/// ECG/IMU serial stream demultiplexing
pub mod serial;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Command line interface
pub mod cli;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
