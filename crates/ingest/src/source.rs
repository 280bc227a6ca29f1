//! Line sources
//!
//! A source yields one line at a time without its line terminator.
//! `Ok(None)` means the stream ended cleanly; any `Err` aborts ingestion.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

/// Producer of raw lines
pub trait LineSource {
    /// Next line, or `None` at end of stream
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

impl<T: LineSource + ?Sized> LineSource for Box<T> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        (**self).read_line()
    }
}

/// Turn raw line bytes into a line without its terminator.
///
/// Log lines are not guaranteed to be UTF-8; invalid sequences become
/// U+FFFD instead of failing the source.
fn decode_line(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
    }
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => {
            debug!(
                target: "auditkv::ingest",
                valid_up_to = e.utf8_error().valid_up_to(),
                "Line is not valid UTF-8, replacing invalid bytes"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Lines from any buffered reader (stdin, a file read once, a byte slice)
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(decode_line(line)))
    }
}

/// Shared flag that ends a following tail at its next poll
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// New, not yet stopped
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the tail to stop
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether `stop` was called
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Lines from a file, optionally following it as it grows.
///
/// Without `follow` the tail ends at end of file. With `follow` it polls
/// for new data at end of file and only ends when its [`StopHandle`] is
/// triggered. A file that shrinks while followed is read again from the
/// start. A final line without terminator is held back while following,
/// since the writer may not have finished it.
#[derive(Debug)]
pub struct FileTail {
    path: PathBuf,
    reader: BufReader<File>,
    follow: bool,
    poll_interval: Duration,
    stop: StopHandle,
    pending: Vec<u8>,
}

impl FileTail {
    /// Open `path` for tailing from its first line
    pub fn open(path: impl AsRef<Path>, follow: bool) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        debug!(
            target: "auditkv::ingest",
            path = %path.display(),
            follow,
            "Opened file tail"
        );
        Ok(Self {
            path,
            reader: BufReader::new(file),
            follow,
            poll_interval: Duration::from_millis(250),
            stop: StopHandle::new(),
            pending: Vec::new(),
        })
    }

    /// Poll interval at end of file while following
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Use an externally owned stop flag
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Stop flag of this tail
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Path being tailed
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rewind_if_truncated(&mut self) -> io::Result<()> {
        let len = self.reader.get_ref().metadata()?.len();
        let position = self.reader.stream_position()?;
        if len < position {
            warn!(
                target: "auditkv::ingest",
                path = %self.path.display(),
                "File shrank while tailing, reading from start"
            );
            self.reader.seek(SeekFrom::Start(0))?;
            self.pending.clear();
        }
        Ok(())
    }
}

impl LineSource for FileTail {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            self.reader.read_until(b'\n', &mut self.pending)?;

            if self.pending.last() == Some(&b'\n') {
                return Ok(Some(decode_line(std::mem::take(&mut self.pending))));
            }

            // End of file reached.
            if !self.follow {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(decode_line(std::mem::take(&mut self.pending))));
            }

            if self.stop.is_stopped() {
                return Ok(None);
            }
            thread::sleep(self.poll_interval);
            self.rewind_if_truncated()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;

    fn drain(source: &mut impl LineSource) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = source.read_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_reader_source_strips_terminators() {
        let mut source = ReaderSource::new(Cursor::new("a\nb\r\n\nlast"));
        assert_eq!(drain(&mut source), vec!["a", "b", "", "last"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let input = b"ok\nbad \xff byte\r\nafter\n".to_vec();
        let mut source = ReaderSource::new(Cursor::new(input));
        assert_eq!(drain(&mut source), vec!["ok", "bad \u{FFFD} byte", "after"]);
    }

    #[test]
    fn test_file_tail_without_follow() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        std::fs::write(&path, "one\ntwo\nthree").unwrap();

        let mut tail = FileTail::open(&path, false).unwrap();
        assert_eq!(drain(&mut tail), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_file_tail_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        std::fs::write(&path, b"one\n\xc3(\nthree").unwrap();

        let mut tail = FileTail::open(&path, false).unwrap();
        assert_eq!(drain(&mut tail), vec!["one", "\u{FFFD}(", "three"]);
    }

    #[test]
    fn test_file_tail_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(FileTail::open(dir.path().join("absent.log"), false).is_err());
    }

    #[test]
    fn test_follow_sees_appended_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        std::fs::write(&path, "first\n").unwrap();

        let mut tail = FileTail::open(&path, true)
            .unwrap()
            .with_poll_interval(Duration::from_millis(5));
        let stop = tail.stop_handle();

        assert_eq!(tail.read_line().unwrap(), Some("first".to_string()));

        let writer_path = path.clone();
        let writer = thread::spawn(move || {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&writer_path)
                .unwrap();
            thread::sleep(Duration::from_millis(20));
            file.write_all(b"sec").unwrap();
            file.flush().unwrap();
            thread::sleep(Duration::from_millis(20));
            file.write_all(b"ond\n").unwrap();
            file.flush().unwrap();
        });

        // The half-written line is held back until its terminator arrives.
        assert_eq!(tail.read_line().unwrap(), Some("second".to_string()));
        writer.join().unwrap();

        stop.stop();
        assert_eq!(tail.read_line().unwrap(), None);
    }
}
