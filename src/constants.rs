//! Constants used throughout the application

/// Number of facial landmarks produced by the 68-point scheme
pub const NUM_FACIAL_LANDMARKS: usize = 68;

/// Left face edge (jaw line start)
pub const LEFT_FACE_INDEX: usize = 0;

/// Right face edge (jaw line end)
pub const RIGHT_FACE_INDEX: usize = 16;

/// Nose tip
pub const NOSE_TIP_INDEX: usize = 30;

/// Smallest landmark count that still contains the three key points
pub const MIN_LANDMARKS_FOR_ORIENTATION: usize = NOSE_TIP_INDEX + 1;

/// Face width below which a detection is treated as degenerate (pixels)
pub const DEFAULT_MIN_FACE_WIDTH: f64 = 10.0;

/// Half-width of the linear region around the frontal pose
pub const DEFAULT_DEAD_ZONE: f64 = 0.05;

/// Linear gain inside the dead zone
pub const DEFAULT_DEAD_ZONE_GAIN: f64 = 10.0;

/// Power-law exponent outside the dead zone
pub const DEFAULT_EDGE_EXPONENT: f64 = 0.8;

/// Orientation output bounds
pub const ORIENTATION_MIN: f64 = -1.0;
pub const ORIENTATION_MAX: f64 = 1.0;

/// Default window sizes for filters
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 5;
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;

/// Default exponential filter alpha
pub const DEFAULT_EXPONENTIAL_ALPHA: f64 = 0.5;

/// Readings averaged into the calibration offset
pub const DEFAULT_CALIBRATION_READINGS: usize = 10;

/// Pause between calibration samples (milliseconds)
pub const DEFAULT_CALIBRATION_SAMPLE_INTERVAL_MS: u64 = 100;

/// Minimum orientation change that forces a log write
pub const DEFAULT_CHANGE_THRESHOLD: f64 = 0.03;

/// Maximum time between log writes (milliseconds)
pub const DEFAULT_HEARTBEAT_MS: u64 = 500;

/// Serial idle poll delay (milliseconds)
pub const DEFAULT_SERIAL_POLL_DELAY_MS: u64 = 1;

/// Interval between serial record count reports (milliseconds)
pub const DEFAULT_SERIAL_STATS_INTERVAL_MS: u64 = 1000;

/// Serial line speed of the sensor board
pub const DEFAULT_SERIAL_BAUD_RATE: u32 = 115_200;

/// Serial read timeout before the port counts as idle (milliseconds)
pub const DEFAULT_SERIAL_TIMEOUT_MS: u64 = 1000;

/// Time allowed for the board to reset after the port opens (milliseconds)
pub const DEFAULT_SERIAL_SETTLE_MS: u64 = 2000;

/// Row timestamp format, millisecond precision
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Session stamp embedded in log file names, second precision
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Log file name prefixes
pub const ORIENTATION_LOG_PREFIX: &str = "face_orientation";
pub const ECG_LOG_PREFIX: &str = "ecg_data";
pub const IMU_LOG_PREFIX: &str = "imu_data";

/// Serial record tags
pub const ECG_TAG: &str = "ECG";
pub const IMU_TAG: &str = "IMU";

/// Field counts per tag, including the tag itself
pub const ECG_FIELD_COUNT: usize = 2;
pub const IMU_FIELD_COUNT: usize = 7;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
