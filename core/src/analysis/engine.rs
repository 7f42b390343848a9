//! External fibre-diameter engine
//!
//! The diameter measurement itself is performed by a third-party program.
//! [`SubprocessEngine`] starts that program once per batch and talks to it
//! over a line protocol on stdin/stdout:
//!
//! ```text
//! request:  measure\t<source>\t<pixel size>\t<unit>\t<0|1>\t<file name>\n
//!           source = file:<path> | raw:<width>x<height> (followed by width*height bytes)
//! response: ok\t<average>\t<sdev>\t<d1,d2,...>\n
//!           err\t<message>\n
//! shutdown: quit\n
//! ```
//!
//! Writing a request and awaiting its response share one bounded deadline.

use crate::analysis::PixelMeasurement;
use crate::error::{FibresemError, Result};
use crate::types::Calibration;
use image::GrayImage;
use log::{debug, info, warn};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Default time allowed for a single measurement
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(300);

/// Time allowed for the engine to exit after `quit`
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Image data handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementSource {
    /// The engine loads the file itself
    File(PathBuf),
    /// 8-bit grayscale pixels sent inline
    Pixels(GrayImage),
}

/// One diameter measurement request
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRequest {
    pub file_name: String,
    pub source: MeasurementSource,
    pub pixel_size_value: f64,
    pub pixel_size_unit: String,
    pub optimise_for_thin_fibres: bool,
}

impl MeasurementRequest {
    /// Builds a request; without calibration the engine works in pixels
    /// (pixel size `1`, unit `px`)
    pub fn new(
        file_name: impl Into<String>,
        source: MeasurementSource,
        calibration: &Calibration,
        optimise_for_thin_fibres: bool,
    ) -> Self {
        let (pixel_size_value, pixel_size_unit) = match &calibration.unit {
            Some(unit) if calibration.is_valid() => (calibration.value, unit.clone()),
            _ => (1.0, "px".to_string()),
        };

        Self {
            file_name: file_name.into(),
            source,
            pixel_size_value,
            pixel_size_unit,
            optimise_for_thin_fibres,
        }
    }
}

/// Handle to a fibre-diameter measurement engine
///
/// Engines are opened explicitly by their constructor, reused for a whole
/// batch, and closed explicitly with [`DiameterEngine::close`].
pub trait DiameterEngine {
    /// Engine name for logging
    fn name(&self) -> &str;

    /// Measures fibre diameters for one image
    fn measure(&mut self, request: &MeasurementRequest) -> Result<PixelMeasurement>;

    /// Shuts the engine down; further measurements fail
    fn close(&mut self) -> Result<()>;
}

/// Command line and limits of an external engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl EngineConfig {
    /// Creates a config running `command` with the default timeout
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            timeout: DEFAULT_ENGINE_TIMEOUT,
        }
    }

    /// Builder: Set the command arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: Set the per-measurement timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Running engine process
///
/// Stdin is owned by a writer thread and stdout by a reader thread, so every
/// step of an exchange can be awaited against a deadline.
struct Session {
    child: Child,
    requests: Option<Sender<Vec<u8>>>,
    acks: Receiver<io::Result<()>>,
    responses: Receiver<io::Result<String>>,
}

impl Session {
    fn spawn(config: &EngineConfig) -> Result<Self> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                FibresemError::Engine(format!("could not start '{}': {}", config.command, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FibresemError::Engine("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FibresemError::Engine("engine stdout unavailable".to_string()))?;

        let (request_tx, request_rx) = mpsc::channel::<Vec<u8>>();
        let (ack_tx, ack_rx) = mpsc::channel();
        thread::spawn(move || {
            let mut stdin = stdin;
            for payload in request_rx {
                let written = stdin.write_all(&payload).and_then(|_| stdin.flush());
                let failed = written.is_err();
                if ack_tx.send(written).is_err() || failed {
                    break;
                }
            }
        });

        let (response_tx, response_rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let failed = line.is_err();
                if response_tx.send(line).is_err() || failed {
                    break;
                }
            }
        });

        debug!("Engine process {} started", child.id());
        Ok(Self {
            child,
            requests: Some(request_tx),
            acks: ack_rx,
            responses: response_rx,
        })
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Hands `payload` to the engine's stdin
    ///
    /// [`FibresemError::EngineExited`] from here means the engine never saw
    /// the request.
    fn deliver(&mut self, payload: Vec<u8>, deadline: Instant, timeout: Duration) -> Result<()> {
        if !self.is_alive() {
            return Err(FibresemError::EngineExited(
                "process ended before the request".to_string(),
            ));
        }

        let closed = || FibresemError::EngineExited("engine input closed".to_string());
        let sender = self.requests.as_ref().ok_or_else(closed)?;
        sender.send(payload).map_err(|_| closed())?;

        match self.acks.recv_timeout(remaining(deadline)) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(FibresemError::EngineExited(format!(
                "writing request: {}",
                e
            ))),
            Err(RecvTimeoutError::Timeout) => Err(FibresemError::EngineTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(closed()),
        }
    }

    fn await_response(
        &mut self,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<PixelMeasurement> {
        match self.responses.recv_timeout(remaining(deadline)) {
            Ok(Ok(line)) => parse_response(&line),
            Ok(Err(e)) => Err(FibresemError::Engine(format!("reading response: {}", e))),
            Err(RecvTimeoutError::Timeout) => Err(FibresemError::EngineTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(FibresemError::EngineExited(
                "no response to the request".to_string(),
            )),
        }
    }

    fn kill(mut self) {
        if let Err(e) = self.child.kill() {
            debug!("Engine kill: {}", e);
        }
        let _ = self.child.wait();
    }

    fn shutdown(mut self) {
        // Closing the request channel ends the writer and with it stdin
        if let Some(requests) = self.requests.take() {
            let _ = requests.send(b"quit\n".to_vec());
        }

        let started = Instant::now();
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("Engine exited with {}", status);
                    return;
                }
                Ok(None) if started.elapsed() < SHUTDOWN_GRACE => {
                    thread::sleep(Duration::from_millis(20));
                }
                _ => break,
            }
        }

        warn!("Engine did not exit after quit, killing it");
        self.kill();
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

/// Engine running as a long-lived child process
///
/// A timed-out or exited engine is killed and respawned so the next image
/// starts on a fresh process. A request that never reached the engine is
/// sent once more to the respawned process.
pub struct SubprocessEngine {
    config: EngineConfig,
    session: Option<Session>,
}

impl SubprocessEngine {
    /// Starts the engine process
    ///
    /// # Errors
    ///
    /// Returns [`FibresemError::Engine`] if the command cannot be started.
    pub fn open(config: EngineConfig) -> Result<Self> {
        info!("Starting diameter engine: {}", config.command);
        let session = Session::spawn(&config)?;
        Ok(Self {
            config,
            session: Some(session),
        })
    }

    /// Whether the engine process is available
    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    fn restart(&mut self) {
        if let Some(session) = self.session.take() {
            session.kill();
        }
        match Session::spawn(&self.config) {
            Ok(session) => {
                info!("Diameter engine restarted");
                self.session = Some(session);
            }
            Err(e) => warn!("Could not restart diameter engine: {}", e),
        }
    }

    fn session(&mut self) -> Result<&mut Session> {
        self.session
            .as_mut()
            .ok_or_else(|| FibresemError::Engine("engine is not running".to_string()))
    }

    fn exchange(&mut self, request: &MeasurementRequest) -> Result<PixelMeasurement> {
        let mut payload = Vec::new();
        write_request(&mut payload, request)?;

        let timeout = self.config.timeout;
        let deadline = Instant::now() + timeout;

        match self.session()?.deliver(payload.clone(), deadline, timeout) {
            Err(FibresemError::EngineExited(reason)) => {
                warn!("{}: {}, restarting engine", request.file_name, reason);
                self.restart();
                self.session()?.deliver(payload, deadline, timeout)?;
            }
            delivered => delivered?,
        }

        self.session()?.await_response(deadline, timeout)
    }
}

impl DiameterEngine for SubprocessEngine {
    fn name(&self) -> &str {
        &self.config.command
    }

    fn measure(&mut self, request: &MeasurementRequest) -> Result<PixelMeasurement> {
        if self.session.is_none() {
            return Err(FibresemError::Engine("engine is not running".to_string()));
        }

        let result = self.exchange(request);
        match &result {
            Err(FibresemError::EngineTimeout(_)) => {
                warn!("{}: engine timed out, restarting it", request.file_name);
                self.restart();
            }
            Err(FibresemError::EngineExited(reason)) => {
                warn!("{}: {}, restarting engine", request.file_name, reason);
                self.restart();
            }
            _ => {}
        }
        result
    }

    fn close(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            info!("Stopping diameter engine");
            session.shutdown();
        }
        Ok(())
    }
}

impl Drop for SubprocessEngine {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.shutdown();
        }
    }
}

/// Writes one request in the engine line protocol
pub fn write_request<W: Write>(writer: &mut W, request: &MeasurementRequest) -> io::Result<()> {
    let optimise = u8::from(request.optimise_for_thin_fibres);
    match &request.source {
        MeasurementSource::File(path) => {
            writeln!(
                writer,
                "measure\tfile:{}\t{}\t{}\t{}\t{}",
                path.display(),
                request.pixel_size_value,
                request.pixel_size_unit,
                optimise,
                request.file_name
            )?;
        }
        MeasurementSource::Pixels(image) => {
            writeln!(
                writer,
                "measure\traw:{}x{}\t{}\t{}\t{}\t{}",
                image.width(),
                image.height(),
                request.pixel_size_value,
                request.pixel_size_unit,
                optimise,
                request.file_name
            )?;
            writer.write_all(image.as_raw())?;
        }
    }
    writer.flush()
}

/// Parses one response line of the engine line protocol
pub fn parse_response(line: &str) -> Result<PixelMeasurement> {
    let mut fields = line.trim_end_matches(['\r', '\n']).split('\t');

    match fields.next() {
        Some("ok") => {
            let pixel_average = parse_number(fields.next(), "average")?;
            let pixel_sdev = parse_number(fields.next(), "standard deviation")?;
            let pixel_diameters = fields
                .next()
                .unwrap_or("")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_number(Some(s), "diameter"))
                .collect::<Result<Vec<_>>>()?;

            Ok(PixelMeasurement {
                pixel_average,
                pixel_sdev,
                pixel_diameters,
            })
        }
        Some("err") => {
            let message: Vec<&str> = fields.collect();
            Err(FibresemError::Engine(message.join("\t")))
        }
        _ => Err(FibresemError::Engine(format!(
            "unexpected engine response '{}'",
            line
        ))),
    }
}

fn parse_number(field: Option<&str>, what: &str) -> Result<f64> {
    let field = field.ok_or_else(|| FibresemError::Engine(format!("response lacks {}", what)))?;
    field
        .trim()
        .parse()
        .map_err(|_| FibresemError::Engine(format!("invalid {} '{}'", what, field)))
}
