//! Demultiplexing of the tagged ECG/IMU serial stream into per-sensor logs.
//!
//! The wire format is newline-terminated ASCII, comma separated, with a type
//! tag in the first field:
//!
//! ```text
//! ECG,512
//! IMU,0.1,0.2,0.3,0.01,0.02,0.03
//! ```
//!
//! Each tag has a fixed field count. Lines that do not match are discarded
//! with a warning and never stop the stream.

use crate::{
    constants::{
        DEFAULT_SERIAL_BAUD_RATE, DEFAULT_SERIAL_POLL_DELAY_MS, DEFAULT_SERIAL_SETTLE_MS,
        DEFAULT_SERIAL_STATS_INTERVAL_MS, DEFAULT_SERIAL_TIMEOUT_MS, ECG_FIELD_COUNT, ECG_TAG, IMU_FIELD_COUNT, IMU_TAG,
    },
    records::{now_timestamp, EcgRecord, ImuRecord, RecordLog, SensorRecord},
    source::{Command, EventSource},
    Error, Result,
};
use log::{debug, info, warn};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, ErrorKind, Read, Write},
    path::Path,
    thread,
    time::{Duration, Instant},
};

fn malformed(line: &str, reason: impl Into<String>) -> Error {
    Error::MalformedStreamRecord {
        line: line.to_string(),
        reason: reason.into(),
    }
}

/// Parse one line (without terminator) into a record stamped with `timestamp`
///
/// # Errors
///
/// Returns `MalformedStreamRecord` for unknown tags, wrong field counts and
/// unparseable values
pub fn parse_line(line: &str, timestamp: String) -> Result<SensorRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let tag = fields[0];

    let expected = match tag {
        ECG_TAG => ECG_FIELD_COUNT,
        IMU_TAG => IMU_FIELD_COUNT,
        _ => return Err(malformed(line, format!("unknown tag {tag:?}"))),
    };
    if fields.len() != expected {
        return Err(malformed(
            line,
            format!("{tag} expects {expected} fields, got {}", fields.len()),
        ));
    }

    if tag == ECG_TAG {
        let ecg_value = fields[1]
            .parse::<i64>()
            .map_err(|e| malformed(line, format!("ECG value {:?}: {e}", fields[1])))?;
        return Ok(SensorRecord::Ecg(EcgRecord { timestamp, ecg_value }));
    }

    let mut values = [0.0; 6];
    for (value, field) in values.iter_mut().zip(&fields[1..]) {
        *value = field
            .parse::<f64>()
            .map_err(|e| malformed(line, format!("IMU value {field:?}: {e}")))?;
    }
    Ok(SensorRecord::Imu(ImuRecord::new(
        timestamp,
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
    )))
}

/// How a serial device is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSettings {
    pub baud_rate: u32,
    /// A read that waits this long without data counts as idle
    pub timeout: Duration,
    /// Wait after opening for the board to finish resetting
    pub settle: Duration,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_SERIAL_BAUD_RATE,
            timeout: Duration::from_millis(DEFAULT_SERIAL_TIMEOUT_MS),
            settle: Duration::from_millis(DEFAULT_SERIAL_SETTLE_MS),
        }
    }
}

/// Buffered line input from a serial port or a captured stream file
pub type LineSource = BufReader<Box<dyn Read + Send>>;

/// Open a serial device, or a captured stream file, for line reading
///
/// Regular files are read as they are. Anything else is opened as a serial
/// port at 8N1 with the configured speed and read timeout, then given
/// `settle` to finish resetting.
///
/// # Errors
///
/// Returns `SourceUnavailable` if the path cannot be opened
pub fn open_line_source<P: AsRef<Path>>(path: P, settings: &PortSettings) -> Result<LineSource> {
    let path = path.as_ref();

    if matches!(fs::metadata(path), Ok(metadata) if metadata.is_file()) {
        let file = File::open(path)
            .map_err(|e| Error::SourceUnavailable(format!("Cannot open stream file {}: {e}", path.display())))?;
        info!("Reading captured stream {}", path.display());
        let input: Box<dyn Read + Send> = Box::new(file);
        return Ok(BufReader::new(input));
    }

    let port = serialport::new(path.to_string_lossy(), settings.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(settings.timeout)
        .open()
        .map_err(|e| Error::SourceUnavailable(format!("Cannot open serial port {}: {e}", path.display())))?;
    info!("Connected to {} at {} baud", path.display(), settings.baud_rate);

    if !settings.settle.is_zero() {
        debug!("Waiting {:?} for the device to settle", settings.settle);
        thread::sleep(settings.settle);
    }
    let input: Box<dyn Read + Send> = Box::new(port);
    Ok(BufReader::new(input))
}

/// Record counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxStats {
    pub ecg: u64,
    pub imu: u64,
    pub malformed: u64,
}

impl DemuxStats {
    #[must_use]
    pub fn records(&self) -> u64 {
        self.ecg + self.imu
    }
}

/// What a single step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Ecg,
    Imu,
    Malformed,
    /// Empty line, skipped without counting
    Blank,
    /// No complete line available
    Idle,
}

/// Routes tagged lines to the ECG and IMU logs
pub struct Demultiplexer<R, We: Write = File, Wi: Write = File> {
    reader: R,
    ecg_log: RecordLog<EcgRecord, We>,
    imu_log: RecordLog<ImuRecord, Wi>,
    stats: DemuxStats,
    poll_delay: Duration,
    stats_interval: Duration,
    follow: bool,
    pending: Vec<u8>,
}

impl<R: BufRead, We: Write, Wi: Write> Demultiplexer<R, We, Wi> {
    /// Demultiplexer that stops at end of input
    #[must_use]
    pub fn new(reader: R, ecg_log: RecordLog<EcgRecord, We>, imu_log: RecordLog<ImuRecord, Wi>) -> Self {
        Self {
            reader,
            ecg_log,
            imu_log,
            stats: DemuxStats::default(),
            poll_delay: Duration::from_millis(DEFAULT_SERIAL_POLL_DELAY_MS),
            stats_interval: Duration::from_millis(DEFAULT_SERIAL_STATS_INTERVAL_MS),
            follow: false,
            pending: Vec::with_capacity(128),
        }
    }

    /// Keep polling at end of input, as for a live port
    #[must_use]
    pub fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    #[must_use]
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    #[must_use]
    pub fn with_stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    #[must_use]
    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    #[must_use]
    pub fn ecg_log(&self) -> &RecordLog<EcgRecord, We> {
        &self.ecg_log
    }

    #[must_use]
    pub fn imu_log(&self) -> &RecordLog<ImuRecord, Wi> {
        &self.imu_log
    }

    /// Hand back both logs
    #[must_use]
    pub fn into_logs(self) -> (RecordLog<EcgRecord, We>, RecordLog<ImuRecord, Wi>) {
        (self.ecg_log, self.imu_log)
    }

    /// Parse one line and append the record to its log
    ///
    /// # Errors
    ///
    /// Returns an error only if a log write fails
    pub fn handle_line(&mut self, line: &str) -> Result<LineOutcome> {
        if line.trim().is_empty() {
            return Ok(LineOutcome::Blank);
        }

        match parse_line(line, now_timestamp()) {
            Ok(SensorRecord::Ecg(record)) => {
                self.ecg_log.append(&record)?;
                self.stats.ecg += 1;
                Ok(LineOutcome::Ecg)
            }
            Ok(SensorRecord::Imu(record)) => {
                self.imu_log.append(&record)?;
                self.stats.imu += 1;
                Ok(LineOutcome::Imu)
            }
            Err(e) if e.is_recoverable() => Ok(self.discard(&e)),
            Err(e) => Err(e),
        }
    }

    /// Read and handle at most one line
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or a log write fails
    pub fn step(&mut self) -> Result<LineOutcome> {
        let read = match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(read) => read,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                return Ok(LineOutcome::Idle);
            }
            Err(e) => return Err(e.into()),
        };

        if read == 0 {
            return Ok(LineOutcome::Idle);
        }
        // A live source may deliver the rest of the line later
        if self.follow && self.pending.last() != Some(&b'\n') {
            return Ok(LineOutcome::Idle);
        }

        let bytes = std::mem::take(&mut self.pending);
        let trimmed = bytes
            .strip_suffix(b"\n")
            .map_or(bytes.as_slice(), |b| b.strip_suffix(b"\r").unwrap_or(b));

        match std::str::from_utf8(trimmed) {
            Ok(line) => self.handle_line(line),
            Err(e) => {
                let error = malformed(&String::from_utf8_lossy(trimmed), format!("invalid UTF-8: {e}"));
                Ok(self.discard(&error))
            }
        }
    }

    /// Demultiplex until the input ends (without follow) or `Quit` arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or a log write fails
    pub fn run<E: EventSource + ?Sized>(&mut self, events: &mut E) -> Result<DemuxStats> {
        info!("Reading sensor data (q + Enter or Ctrl-C to stop)");

        let mut last_report = Instant::now();
        let mut reported = self.stats;
        loop {
            if events.poll() == Command::Quit {
                info!("Stop requested");
                break;
            }

            if self.step()? == LineOutcome::Idle {
                if !self.follow {
                    info!("End of sensor stream");
                    break;
                }
                thread::sleep(self.poll_delay);
            }

            if last_report.elapsed() >= self.stats_interval {
                info!(
                    "ECG records: {}, IMU records: {} (total {}, malformed {})",
                    self.stats.ecg - reported.ecg,
                    self.stats.imu - reported.imu,
                    self.stats.records(),
                    self.stats.malformed
                );
                reported = self.stats;
                last_report = Instant::now();
            }
        }
        Ok(self.stats)
    }

    fn discard(&mut self, error: &Error) -> LineOutcome {
        warn!("Discarding line: {error}");
        self.stats.malformed += 1;
        LineOutcome::Malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::VecDeque, io::Cursor};

    type MemoryDemux<'a> = Demultiplexer<Cursor<&'a [u8]>, Vec<u8>, Vec<u8>>;

    fn demux(input: &[u8]) -> MemoryDemux<'_> {
        Demultiplexer::new(
            Cursor::new(input),
            RecordLog::from_writer(Vec::new()).unwrap(),
            RecordLog::from_writer(Vec::new()).unwrap(),
        )
    }

    #[test]
    fn test_parse_ecg() {
        let record = parse_line("ECG,512", "t".to_string()).unwrap();
        assert_eq!(
            record,
            SensorRecord::Ecg(EcgRecord {
                timestamp: "t".to_string(),
                ecg_value: 512
            })
        );
    }

    #[test]
    fn test_parse_imu_keeps_field_order() {
        let record = parse_line("IMU,0.1,0.2,0.3,0.01,0.02,0.03", "t".to_string()).unwrap();
        let SensorRecord::Imu(imu) = record else {
            panic!("Expected an IMU record");
        };
        assert_eq!(imu.accel(), [0.1, 0.2, 0.3]);
        assert_eq!(imu.gyro(), [0.01, 0.02, 0.03]);
    }

    #[test]
    fn test_parse_trims_fields() {
        let record = parse_line("ECG, 7 ", "t".to_string()).unwrap();
        assert!(matches!(record, SensorRecord::Ecg(EcgRecord { ecg_value: 7, .. })));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for line in ["ECG,abc", "FOO,1,2", "ECG", "ECG,1,2", "IMU,1,2,3", "IMU,1,2,3,4,5,x", "ecg,1", ""] {
            let result = parse_line(line, "t".to_string());
            assert!(
                matches!(result, Err(Error::MalformedStreamRecord { .. })),
                "{line:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_stream_continues_after_bad_lines() {
        let input = b"ECG,512\nECG,abc\nFOO,1,2\n\nIMU,0.1,0.2,0.3,0.01,0.02,0.03\r\nECG,-3\n";
        let mut demux = demux(input);
        let stats = demux.run(&mut VecDeque::<Command>::new()).unwrap();

        assert_eq!(
            stats,
            DemuxStats {
                ecg: 2,
                imu: 1,
                malformed: 2
            }
        );

        let (ecg, imu) = demux.into_logs();
        let ecg = String::from_utf8(ecg.into_inner().unwrap()).unwrap();
        let imu = String::from_utf8(imu.into_inner().unwrap()).unwrap();

        let ecg_values: Vec<&str> = ecg.lines().skip(1).map(|l| l.rsplit(',').next().unwrap()).collect();
        assert_eq!(ecg_values, ["512", "-3"]);
        assert!(imu.lines().nth(1).unwrap().ends_with(",0.1,0.2,0.3,0.01,0.02,0.03"));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let mut demux = demux(b"ECG,\xff\xfe\nECG,1\n");
        assert_eq!(demux.step().unwrap(), LineOutcome::Malformed);
        assert_eq!(demux.step().unwrap(), LineOutcome::Ecg);
        assert_eq!(demux.step().unwrap(), LineOutcome::Idle);
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut demux = demux(b"ECG,1\nECG,2");
        let stats = demux.run(&mut VecDeque::<Command>::new()).unwrap();
        assert_eq!(stats.ecg, 2);
    }

    #[test]
    fn test_follow_waits_for_complete_line() {
        let mut demux = demux(b"ECG,1").with_follow(true);
        assert_eq!(demux.step().unwrap(), LineOutcome::Idle);
        assert_eq!(demux.stats().ecg, 0);
    }

    #[test]
    fn test_quit_stops_follow_mode() {
        let mut demux = demux(b"ECG,1\n").with_follow(true).with_poll_delay(Duration::ZERO);
        let mut events = VecDeque::from([Command::None, Command::None, Command::Quit]);
        let stats = demux.run(&mut events).unwrap();
        assert_eq!(stats.ecg, 1);
    }

    /// Port that hands out scripted chunks, then reports no data
    struct ScriptedPort(VecDeque<std::io::Result<&'static [u8]>>);

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(chunk);
                    Ok(chunk.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn test_read_timeout_is_idle() {
        let port = ScriptedPort(VecDeque::from([
            Ok(&b"ECG,5"[..]),
            Err(ErrorKind::TimedOut.into()),
            Ok(&b"12\n"[..]),
        ]));
        let mut demux = Demultiplexer::new(
            BufReader::new(port),
            RecordLog::<EcgRecord, Vec<u8>>::from_writer(Vec::new()).unwrap(),
            RecordLog::<ImuRecord, Vec<u8>>::from_writer(Vec::new()).unwrap(),
        )
        .with_follow(true);

        assert_eq!(demux.step().unwrap(), LineOutcome::Idle);
        assert_eq!(demux.step().unwrap(), LineOutcome::Ecg);
        let (ecg_log, _) = demux.into_logs();
        let text = String::from_utf8(ecg_log.into_inner().unwrap()).unwrap();
        assert!(text.ends_with(",512\n"), "{text}");
    }

    #[test]
    fn test_read_timeout_ends_single_pass() {
        let port = ScriptedPort(VecDeque::from([Ok(&b"ECG,1\n"[..]), Err(ErrorKind::TimedOut.into())]));
        let mut demux = Demultiplexer::new(
            BufReader::new(port),
            RecordLog::<EcgRecord, Vec<u8>>::from_writer(Vec::new()).unwrap(),
            RecordLog::<ImuRecord, Vec<u8>>::from_writer(Vec::new()).unwrap(),
        );
        let stats = demux.run(&mut VecDeque::<Command>::new()).unwrap();
        assert_eq!(stats.ecg, 1);
    }

    #[test]
    fn test_open_stream_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ECG,7\n").unwrap();

        let settings = PortSettings {
            settle: Duration::from_secs(60),
            ..PortSettings::default()
        };
        let mut reader = open_line_source(file.path(), &settings).unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "ECG,7\n");
    }

    #[test]
    fn test_open_missing_port() {
        let result = open_line_source("/nonexistent/ttyACM0", &PortSettings::default());
        assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    }
}
