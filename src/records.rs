//! Timestamped records and the append-only CSV logs they are written to.

use crate::{
    constants::{FILE_STAMP_FORMAT, TIMESTAMP_FORMAT},
    Error, Result,
};
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize, Serializer};
use std::{
    fmt::Display,
    fs::File,
    io::Write,
    marker::PhantomData,
    path::{Path, PathBuf},
};

/// Format a row timestamp with millisecond precision
pub fn format_timestamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time as a row timestamp
#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(&Local::now())
}

/// Log file name such as `face_orientation_20240131_154502.csv`
pub fn session_file_name<Tz: TimeZone>(prefix: &str, session_start: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!("{prefix}_{}.csv", session_start.format(FILE_STAMP_FORMAT))
}

/// A row type with a fixed CSV header
pub trait CsvRecord: Serialize {
    /// Column names, written once when the log is created
    const HEADER: &'static [&'static str];
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.2}"))
}

/// One row of the orientation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationRecord {
    pub timestamp: String,
    #[serde(serialize_with = "two_decimals")]
    pub orientation: f64,
}

impl OrientationRecord {
    #[must_use]
    pub fn new(timestamp: String, orientation: f64) -> Self {
        Self { timestamp, orientation }
    }

    /// Stamp `orientation` with the current local time
    #[must_use]
    pub fn now(orientation: f64) -> Self {
        Self::new(now_timestamp(), orientation)
    }

    /// Parse a single data row, without header
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not hold a timestamp and a number
    pub fn from_csv_row(row: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(row.as_bytes());
        reader
            .deserialize::<Self>()
            .next()
            .ok_or_else(|| Error::InvalidInput("Empty orientation row".to_string()))?
            .map_err(Error::from)
    }
}

impl CsvRecord for OrientationRecord {
    const HEADER: &'static [&'static str] = &["timestamp", "orientation"];
}

/// Biopotential sample from the serial stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcgRecord {
    pub timestamp: String,
    pub ecg_value: i64,
}

impl CsvRecord for EcgRecord {
    const HEADER: &'static [&'static str] = &["timestamp", "ecg_value"];
}

/// Inertial sample from the serial stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuRecord {
    pub timestamp: String,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl ImuRecord {
    /// Build from accelerometer and gyroscope triples
    #[must_use]
    pub fn new(timestamp: String, accel: [f64; 3], gyro: [f64; 3]) -> Self {
        Self {
            timestamp,
            accel_x: accel[0],
            accel_y: accel[1],
            accel_z: accel[2],
            gyro_x: gyro[0],
            gyro_y: gyro[1],
            gyro_z: gyro[2],
        }
    }

    #[must_use]
    pub fn accel(&self) -> [f64; 3] {
        [self.accel_x, self.accel_y, self.accel_z]
    }

    #[must_use]
    pub fn gyro(&self) -> [f64; 3] {
        [self.gyro_x, self.gyro_y, self.gyro_z]
    }
}

impl CsvRecord for ImuRecord {
    const HEADER: &'static [&'static str] =
        &["timestamp", "accel_x", "accel_y", "accel_z", "gyro_x", "gyro_y", "gyro_z"];
}

/// Record kinds carried by the multiplexed serial stream
#[derive(Debug, Clone, PartialEq)]
pub enum SensorRecord {
    Ecg(EcgRecord),
    Imu(ImuRecord),
}

impl SensorRecord {
    #[must_use]
    pub fn timestamp(&self) -> &str {
        match self {
            Self::Ecg(record) => &record.timestamp,
            Self::Imu(record) => &record.timestamp,
        }
    }
}

/// Append-only CSV log, flushed after every row
pub struct RecordLog<T, W: Write = File> {
    writer: csv::Writer<W>,
    path: Option<PathBuf>,
    written: u64,
    _record: PhantomData<fn(&T)>,
}

impl<T: CsvRecord> RecordLog<T, File> {
    /// Create (or truncate) a log file and write its header
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut record_log = Self::from_writer(file)?;
        record_log.path = Some(path.to_path_buf());
        log::info!("Logging to {}", path.display());
        Ok(record_log)
    }
}

impl<T: CsvRecord, W: Write> RecordLog<T, W> {
    /// Wrap any writer and write the header
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written
    pub fn from_writer(writer: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        writer.write_record(T::HEADER)?;
        writer.flush()?;
        Ok(Self {
            writer,
            path: None,
            written: 0,
            _record: PhantomData,
        })
    }

    /// Append one row and flush it to the underlying writer
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn append(&mut self, record: &T) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Rows appended since creation
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flush and hand back the writer
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| Error::Io(e.into_error()))
    }
}
