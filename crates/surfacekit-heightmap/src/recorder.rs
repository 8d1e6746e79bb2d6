//! Section recorder
//!
//! Records probe readings from a line-based source (usually a serial port)
//! into a section file. The probe sends one raw integer per line while it
//! travels along a section; a pause longer than the section gap ends the
//! section. Every reading and header is flushed as soon as it is written so
//! an interrupted session keeps everything received so far.

use std::fs::File;
use std::io::{BufRead, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use surfacekit_core::{Error, Result};

use crate::sections::section_header;

/// Recorder settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Raw sensor value that corresponds to zero height
    pub zero_point: f64,
    /// Height units per raw sensor unit
    pub scale: f64,
    /// Inactivity that closes the current section, in milliseconds
    pub section_gap_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            zero_point: 8150.0,
            scale: 0.01,
            section_gap_ms: 500,
        }
    }
}

impl RecorderConfig {
    /// Scale must be non-zero and the section gap at least 1 ms
    pub fn validate(&self) -> Result<()> {
        if self.scale == 0.0 || !self.scale.is_finite() {
            return Err(Error::invalid_parameter(
                "scale",
                format!("must be finite and non-zero, got {}", self.scale),
            ));
        }
        if self.section_gap_ms == 0 {
            return Err(Error::invalid_parameter("section_gap_ms", "must be at least 1"));
        }
        Ok(())
    }

    pub fn section_gap(&self) -> Duration {
        Duration::from_millis(self.section_gap_ms)
    }

    /// Height for a raw sensor line, `None` unless the line is all digits
    pub fn convert(&self, line: &str) -> Option<f64> {
        let line = line.trim();
        if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let raw: f64 = line.parse().ok()?;
        Some((raw - self.zero_point) * self.scale)
    }
}

/// Counters for a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecorderStats {
    /// Section headers written
    pub sections: usize,
    /// Readings written
    pub readings: usize,
}

/// Writes incoming probe readings to a section file
#[derive(Debug, Clone)]
pub struct SectionRecorder {
    output: PathBuf,
    config: RecorderConfig,
}

impl SectionRecorder {
    pub fn new(output: impl AsRef<Path>, config: RecorderConfig) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Start recording lines pushed through the handle's sender
    pub fn start(self) -> Result<RecorderHandle> {
        self.config.validate()?;
        let file = File::create(&self.output).map_err(|e| Error::io(&self.output, e))?;
        let mut writer = BufWriter::new(file);
        write_flushed(&mut writer, &format!("{}\n", section_header(1)))
            .map_err(|e| Error::io(&self.output, e))?;

        let (sender, receiver) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(Mutex::new(RecorderStats {
            sections: 1,
            readings: 0,
        }));

        tracing::info!("Recording sections to {}", self.output.display());

        let session = Session {
            writer,
            output: self.output,
            config: self.config,
            stats: Arc::clone(&stats),
            stop: Arc::clone(&stop),
        };
        let worker = thread::Builder::new()
            .name("section-recorder".to_string())
            .spawn(move || session.run(receiver))
            .map_err(|e| Error::other(format!("Failed to start recorder thread: {}", e)))?;

        Ok(RecorderHandle {
            sender: Some(sender),
            stop,
            stats,
            worker: Some(worker),
        })
    }

    /// Start recording lines read from `input` on a background thread.
    ///
    /// Read timeouts are retried, which lets a serial port with a short
    /// timeout be polled until the recorder is stopped.
    pub fn start_reading<R>(self, input: R) -> Result<RecorderHandle>
    where
        R: BufRead + Send + 'static,
    {
        let handle = self.start()?;
        let sender = handle
            .sender()
            .ok_or_else(|| Error::other("Recorder channel closed"))?;
        let stop = Arc::clone(&handle.stop);

        thread::Builder::new()
            .name("section-reader".to_string())
            .spawn(move || read_lines(input, sender, stop))
            .map_err(|e| Error::other(format!("Failed to start reader thread: {}", e)))?;

        Ok(handle)
    }
}

/// Read one line, replacing invalid UTF-8 with U+FFFD.
///
/// Bytes of a partial line stay in `buf` when the read fails, so a retry
/// after a timeout continues the same line. Returns `None` at end of input.
pub fn read_line_lossy<R: BufRead + ?Sized>(
    input: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    let read = input.read_until(b'\n', buf)?;
    if read == 0 && buf.is_empty() {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf).into_owned();
    buf.clear();
    Ok(Some(line))
}

fn read_lines<R: BufRead>(mut input: R, sender: Sender<String>, stop: Arc<AtomicBool>) {
    let mut buf = Vec::new();
    while !stop.load(Ordering::Relaxed) {
        match read_line_lossy(&mut input, &mut buf) {
            Ok(None) => {
                tracing::debug!("Recorder input closed");
                break;
            }
            Ok(Some(line)) => {
                if sender.send(line).is_err() {
                    break;
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {}
            Err(e) => {
                tracing::warn!("Recorder input failed: {}", e);
                break;
            }
        }
    }
}

fn write_flushed(writer: &mut impl Write, text: &str) -> std::io::Result<()> {
    writer.write_all(text.as_bytes())?;
    writer.flush()
}

struct Session {
    writer: BufWriter<File>,
    output: PathBuf,
    config: RecorderConfig,
    stats: Arc<Mutex<RecorderStats>>,
    stop: Arc<AtomicBool>,
}

impl Session {
    fn run(mut self, receiver: Receiver<String>) -> Result<RecorderStats> {
        let gap = self.config.section_gap();
        // Only readings count as activity; other lines never hold a section open.
        let mut last_reading: Option<Instant> = None;

        loop {
            if self.stop.load(Ordering::Relaxed) {
                while let Ok(line) = receiver.try_recv() {
                    self.record(&line)?;
                }
                break;
            }

            let timeout = last_reading.map_or(gap, |at| gap.saturating_sub(at.elapsed()));
            match receiver.recv_timeout(timeout) {
                Ok(line) => {
                    if last_reading.is_some_and(|at| at.elapsed() >= gap) {
                        last_reading = None;
                        self.next_section()?;
                    }
                    if self.record(&line)? {
                        last_reading = Some(Instant::now());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if last_reading.take().is_some() {
                        self.next_section()?;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let stats = *self.stats.lock();
        tracing::info!(
            "Recorder stopped: {} sections, {} readings",
            stats.sections,
            stats.readings
        );
        Ok(stats)
    }

    /// Write a reading; returns true if the line was one
    fn record(&mut self, line: &str) -> Result<bool> {
        let Some(height) = self.config.convert(line) else {
            tracing::debug!("Ignoring recorder line '{}'", line.trim());
            return Ok(false);
        };

        write_flushed(&mut self.writer, &format!("{:.2}\n", height))
            .map_err(|e| Error::io(&self.output, e))?;
        self.stats.lock().readings += 1;
        Ok(true)
    }

    fn next_section(&mut self) -> Result<()> {
        let number = {
            let mut stats = self.stats.lock();
            stats.sections += 1;
            stats.sections
        };
        write_flushed(&mut self.writer, &format!("\n{}\n", section_header(number)))
            .map_err(|e| Error::io(&self.output, e))?;
        tracing::info!("Started section {}", number);
        Ok(())
    }
}

/// Control handle for a running recorder
pub struct RecorderHandle {
    sender: Option<Sender<String>>,
    stop: Arc<AtomicBool>,
    stats: Arc<Mutex<RecorderStats>>,
    worker: Option<JoinHandle<Result<RecorderStats>>>,
}

impl RecorderHandle {
    /// Channel for pushing raw lines into the recorder
    pub fn sender(&self) -> Option<Sender<String>> {
        self.sender.clone()
    }

    /// Counters so far
    pub fn stats(&self) -> RecorderStats {
        *self.stats.lock()
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop recording and wait for pending lines to be written
    pub fn stop(mut self) -> Result<RecorderStats> {
        self.stop.store(true, Ordering::Relaxed);
        self.sender.take();
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| Error::other("Recorder thread panicked"))?,
            None => Ok(self.stats()),
        }
    }
}

impl Drop for RecorderHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{BufReader, Cursor, Read};

    /// Serves byte chunks, with `None` standing for a read timeout
    struct Stuttering(VecDeque<Option<&'static [u8]>>);

    impl Read for Stuttering {
        fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
            match self.0.pop_front() {
                None => Ok(0),
                Some(None) => Err(std::io::Error::from(ErrorKind::TimedOut)),
                Some(Some(bytes)) => {
                    out[..bytes.len()].copy_from_slice(bytes);
                    Ok(bytes.len())
                }
            }
        }
    }

    fn fast_config() -> RecorderConfig {
        RecorderConfig {
            section_gap_ms: 200,
            ..RecorderConfig::default()
        }
    }

    #[test]
    fn test_convert() {
        let config = RecorderConfig::default();
        assert_eq!(config.convert("8150\r\n"), Some(0.0));
        assert!((config.convert("8250").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(config.convert("-12"), None);
        assert_eq!(config.convert("ok"), None);
        assert_eq!(config.convert(""), None);
    }

    #[test]
    fn test_invalid_config_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecorderConfig {
            section_gap_ms: 0,
            ..RecorderConfig::default()
        };
        let err = SectionRecorder::new(dir.path().join("scan.txt"), config)
            .start()
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_records_sections_from_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.txt");
        let handle = SectionRecorder::new(&path, fast_config()).start().unwrap();
        let tx = handle.sender().unwrap();

        tx.send("8150".to_string()).unwrap();
        tx.send("8160".to_string()).unwrap();
        thread::sleep(Duration::from_millis(600));
        tx.send("noise".to_string()).unwrap();
        tx.send("8140".to_string()).unwrap();
        drop(tx);

        let stats = handle.stop().unwrap();
        assert_eq!(stats.readings, 3);
        assert_eq!(stats.sections, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "--- Section 1 ---\n0.00\n0.10\n\n--- Section 2 ---\n-0.10\n"
        );
    }

    #[test]
    fn test_records_from_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.txt");
        let input = Cursor::new(b"8150\n8151\n".to_vec());

        let handle = SectionRecorder::new(&path, fast_config())
            .start_reading(input)
            .unwrap();
        thread::sleep(Duration::from_millis(100));
        let stats = handle.stop().unwrap();
        assert_eq!(stats.readings, 2);

        let sections =
            crate::HeightSections::read(&path, crate::DEFAULT_SECTION_MARKER).unwrap();
        assert_eq!(sections.sections()[0], vec![0.0, 0.01]);
    }

    #[test]
    fn test_unwritable_output() {
        let result = SectionRecorder::new("/no/such/dir/scan.txt", fast_config()).start();
        assert!(matches!(result, Err(Error::IoFailure { .. })));
    }

    #[test]
    fn test_status_lines_do_not_hold_section_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.txt");
        let config = RecorderConfig {
            section_gap_ms: 300,
            ..RecorderConfig::default()
        };
        let handle = SectionRecorder::new(&path, config).start().unwrap();
        let tx = handle.sender().unwrap();

        tx.send("8150".to_string()).unwrap();
        for _ in 0..6 {
            thread::sleep(Duration::from_millis(150));
            tx.send("status ok".to_string()).unwrap();
        }
        tx.send("8250".to_string()).unwrap();
        drop(tx);

        let stats = handle.stop().unwrap();
        assert_eq!(stats.sections, 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "--- Section 1 ---\n0.00\n\n--- Section 2 ---\n1.00\n");
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.txt");
        let mut bytes = b"8150\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        bytes.extend_from_slice(b"8250\n8350\n");

        let handle = SectionRecorder::new(&path, RecorderConfig::default())
            .start_reading(Cursor::new(bytes))
            .unwrap();
        thread::sleep(Duration::from_millis(150));
        let stats = handle.stop().unwrap();

        assert_eq!(stats.readings, 3);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "--- Section 1 ---\n0.00\n1.00\n2.00\n");
    }

    #[test]
    fn test_read_line_lossy_resumes_after_timeout() {
        let chunks = VecDeque::from([Some(&b"81"[..]), None, Some(&b"50\n"[..])]);
        let mut input = BufReader::new(Stuttering(chunks));
        let mut buf = Vec::new();

        let err = read_line_lossy(&mut input, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
        assert_eq!(
            read_line_lossy(&mut input, &mut buf).unwrap().as_deref(),
            Some("8150\n")
        );
        assert_eq!(read_line_lossy(&mut input, &mut buf).unwrap(), None);
    }

    #[test]
    fn test_read_line_lossy_replaces_invalid_bytes() {
        let mut input = Cursor::new(vec![b'8', 0xff, b'\n']);
        let mut buf = Vec::new();
        assert_eq!(
            read_line_lossy(&mut input, &mut buf).unwrap().as_deref(),
            Some("8\u{fffd}\n")
        );
    }
}
