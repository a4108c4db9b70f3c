//! Frame and operator-event sources for the orientation pipeline.
//!
//! Frame acquisition and landmark detection live outside this crate; they
//! reach the pipeline through [`FrameSource`]. [`ReplaySource`] plays back
//! landmark frames recorded as text, one frame per line.

use crate::{landmarks::LandmarkSet, Error, Result};
use log::{debug, info, warn};
use std::{
    collections::VecDeque,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
    time::Duration,
};

/// Outcome of one frame read
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    /// Landmarks for the first detected face
    Face(LandmarkSet),
    /// A frame arrived but no face was found
    NoFace,
    /// The source has no more frames
    Ended,
}

/// Blocking producer of per-frame landmarks
pub trait FrameSource {
    /// Read the next frame
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device fails
    fn capture(&mut self) -> Result<Capture>;
}

/// Landmark frames played back from text, `x0,y0,x1,y1,...` per line
///
/// Blank lines and `-` mean no face. Lines starting with `#` are skipped.
pub struct ReplaySource<R> {
    reader: R,
    frame_interval: Option<Duration>,
    frames_read: u64,
    line: String,
}

impl ReplaySource<BufReader<File>> {
    /// Open a recorded landmark file
    ///
    /// # Errors
    ///
    /// Returns `SourceUnavailable` if the file cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::SourceUnavailable(format!("Cannot open landmark replay {}: {e}", path.display())))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            frame_interval: None,
            frames_read: 0,
            line: String::new(),
        }
    }

    /// Pace playback like a live camera
    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    #[must_use]
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    fn capture(&mut self) -> Result<Capture> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(Capture::Ended);
            }

            let text = self.line.trim();
            if text.starts_with('#') {
                continue;
            }

            if let Some(interval) = self.frame_interval {
                thread::sleep(interval);
            }
            self.frames_read += 1;

            if text.is_empty() || text == "-" {
                return Ok(Capture::NoFace);
            }

            return match LandmarkSet::parse(text) {
                Ok(landmarks) => Ok(Capture::Face(landmarks)),
                Err(e) => {
                    warn!("Frame {}: unreadable landmarks ({e}), treating as no face", self.frames_read);
                    Ok(Capture::NoFace)
                }
            };
        }
    }
}

/// Pre-recorded captures, then `Ended`
impl FrameSource for VecDeque<Capture> {
    fn capture(&mut self) -> Result<Capture> {
        Ok(self.pop_front().unwrap_or(Capture::Ended))
    }
}

/// Operator commands polled once per loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    None,
    BeginCalibration,
    ConfirmPose,
    Quit,
}

/// Map a typed line to a command: `c` calibrates, an empty line or `space`
/// confirms the pose, `q` quits
#[must_use]
pub fn parse_command(input: &str) -> Command {
    match input.trim().to_lowercase().as_str() {
        "c" | "calibrate" => Command::BeginCalibration,
        "" | "space" | "confirm" => Command::ConfirmPose,
        "q" | "quit" | "exit" => Command::Quit,
        _ => Command::None,
    }
}

/// Non-blocking source of operator commands
pub trait EventSource {
    /// Return the next pending command, or `Command::None`
    fn poll(&mut self) -> Command;
}

/// Scripted commands, one per poll
impl EventSource for VecDeque<Command> {
    fn poll(&mut self) -> Command {
        self.pop_front().unwrap_or(Command::None)
    }
}

/// Commands delivered over a channel
pub struct ChannelEvents {
    receiver: Receiver<Command>,
}

impl ChannelEvents {
    #[must_use]
    pub fn new(receiver: Receiver<Command>) -> Self {
        Self { receiver }
    }
}

impl EventSource for ChannelEvents {
    fn poll(&mut self) -> Command {
        match self.receiver.try_recv() {
            Ok(command) => command,
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => Command::None,
        }
    }
}

fn quit_on_interrupt(sender: Sender<Command>) -> impl FnMut() + Send + 'static {
    move || {
        info!("Interrupted, stopping");
        if sender.send(Command::Quit).is_err() {
            debug!("Event receiver gone, interrupt ignored");
        }
    }
}

/// Deliver Ctrl-C as `Quit` instead of killing the process
///
/// # Errors
///
/// Returns an error if a handler is already installed
pub fn forward_interrupts(sender: Sender<Command>) -> Result<()> {
    ctrlc::set_handler(quit_on_interrupt(sender))?;
    Ok(())
}

/// Forward stdin lines and Ctrl-C as commands
///
/// # Errors
///
/// Returns an error if the reader thread or the interrupt handler cannot be set up
pub fn spawn_stdin_events() -> Result<ChannelEvents> {
    let (sender, receiver) = mpsc::channel();
    forward_interrupts(sender.clone())?;
    thread::Builder::new().name("stdin-events".to_string()).spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let command = parse_command(&line);
            debug!("Operator input {line:?} -> {command:?}");
            if command != Command::None && sender.send(command).is_err() {
                break;
            }
        }
    })?;
    Ok(ChannelEvents::new(receiver))
}
