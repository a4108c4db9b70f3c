//! Tests for the orientation CSV log and the full tracking loop


use head_orientation::{
    app::TrackerApp,
    calibration::CalibrationController,
    config::Config,
    constants::ORIENTATION_LOG_PREFIX,
    display::NullDisplay,
    records::{session_file_name, OrientationRecord, RecordLog},
    session::Session,
    source::{Command, ReplaySource},
};
use chrono::Local;
use std::{collections::VecDeque, fs, io::Cursor, path::Path};
use tempfile::tempdir;
use test_helpers::{face_with_nose, replay_line};

fn read_log(path: &Path) -> Vec<OrientationRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    assert_eq!(reader.headers().unwrap(), vec!["timestamp", "orientation"]);
    reader.deserialize().collect::<Result<_, _>>().unwrap()
}

fn replay(nose_offsets: &[Option<i32>]) -> ReplaySource<Cursor<String>> {
    let text: String = nose_offsets
        .iter()
        .map(|offset| match offset {
            Some(offset) => replay_line(&face_with_nose(*offset)) + "\n",
            None => "-\n".to_string(),
        })
        .collect();
    ReplaySource::new(Cursor::new(text))
}

#[test]
fn test_record_round_trip_through_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(session_file_name(ORIENTATION_LOG_PREFIX, &Local::now()));

    let written = [
        OrientationRecord::now(0.0),
        OrientationRecord::now(-0.257),
        OrientationRecord::now(0.999),
    ];
    let mut log = RecordLog::create(&path).unwrap();
    for record in &written {
        log.append(record).unwrap();
    }
    assert_eq!(log.written(), 3);
    assert_eq!(log.path(), Some(path.as_path()));
    drop(log);

    let text = fs::read_to_string(&path).unwrap();
    let values: Vec<&str> = text.lines().skip(1).map(|l| l.split(',').nth(1).unwrap()).collect();
    assert_eq!(values, ["0.00", "-0.26", "1.00"]);

    let read = read_log(&path);
    for (original, parsed) in written.iter().zip(&read) {
        assert_eq!(parsed.timestamp, original.timestamp);
        assert_eq!(format!("{:.2}", parsed.orientation), format!("{:.2}", original.orientation));
    }
}

#[test]
fn test_file_name_embeds_session_start() {
    let name = session_file_name(ORIENTATION_LOG_PREFIX, &Local::now());
    assert!(name.starts_with("face_orientation_"));
    assert!(name.ends_with(".csv"));
    // face_orientation_YYYYMMDD_HHMMSS.csv
    assert_eq!(name.len(), "face_orientation_".len() + 15 + ".csv".len());
}

#[test]
fn test_tracking_run_writes_log() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("face_orientation.csv");

    // Frontal, lost, frontal again, then a sharp turn
    let frames = replay(&[Some(50), None, Some(50), Some(100)]);
    let mut app = TrackerApp::new(
        Session::default(),
        CalibrationController::new(1),
        frames,
        VecDeque::<Command>::new(),
        NullDisplay,
        RecordLog::create(&path).unwrap(),
    );
    let summary = app.run().unwrap();
    drop(app);

    assert_eq!(summary.frames, 4);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.rows_written, 2);

    let rows = read_log(&path);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].orientation, 0.0);
    // Window [0, 0, 1]
    assert_eq!(format!("{:.2}", rows[1].orientation), "0.33");
}

#[test]
fn test_calibration_mid_run_rezeroes_output() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("face_orientation.csv");

    let mut config = Config::default();
    config.calibration.readings = 2;
    config.calibration.sample_interval_ms = 0;
    config.calibration.reset_smoothing = true;
    config.smoothing.window = 1;

    // Head rests turned slightly right at 0.2 for the whole run
    let frames = replay(&[Some(52), Some(52), Some(52), Some(52), Some(52), Some(52)]);
    let events = VecDeque::from([Command::None, Command::BeginCalibration, Command::ConfirmPose]);

    let mut app = TrackerApp::new(
        config.build_session().unwrap(),
        config.calibration_controller(),
        frames,
        events,
        NullDisplay,
        RecordLog::create(&path).unwrap(),
    );
    let summary = app.run().unwrap();
    drop(app);

    assert_eq!(summary.calibrations, 1);
    assert!((summary.final_offset - 0.2).abs() < 1e-9);

    let rows = read_log(&path);
    assert_eq!(rows.len(), 2);
    assert_eq!(format!("{:.2}", rows[0].orientation), "0.20");
    assert_eq!(format!("{:.2}", rows[1].orientation), "0.00");
}
