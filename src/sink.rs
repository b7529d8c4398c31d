//! The output file the now-playing string is published to.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// What the renderer shows about the output side.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SinkState {
    /// The string most recently handed to [`OutputSink::write`].
    pub last_written: String,
    /// The most recent write failure, cleared by the next successful write.
    pub last_error: Option<String>,
}

/// Replaces the destination file with each published string and keeps the
/// last written value around for the UI.
#[derive(Debug)]
pub struct OutputSink {
    path: PathBuf,
    state: Mutex<SinkState>,
}

impl OutputSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: Mutex::new(SinkState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents wholly. Both the attempted text and the
    /// outcome are recorded, so [`state`](Self::state) reflects failures
    /// instead of a stale success.
    pub fn write(&self, text: &str) -> io::Result<()> {
        let result = self.replace_file(text);
        let mut state = self.lock_state();
        state.last_written = text.to_string();
        state.last_error = result.as_ref().err().map(|e| e.to_string());
        result
    }

    /// Snapshot for the renderer.
    pub fn state(&self) -> SinkState {
        self.lock_state().clone()
    }

    // Consumers poll this file, so they must never observe a truncated
    // half-write: the content lands in a sibling file first and moves
    // into place with a rename.
    fn replace_file(&self, text: &str) -> io::Result<()> {
        let mut staging = OsString::from(self.path.as_os_str());
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        fs::write(&staging, text)?;
        fs::rename(&staging, &self.path)
    }

    fn lock_state(&self) -> MutexGuard<'_, SinkState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mpristext-sink-{}-{}", tag, std::process::id()))
    }

    #[test]
    fn test_write_overwrites_wholly_and_records_state() {
        let path = temp_path("overwrite");
        let sink = OutputSink::new(path.clone());

        sink.write("a much longer first line").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a much longer first line");

        sink.write("x").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x");

        let state = sink.state();
        assert_eq!(state.last_written, "x");
        assert_eq!(state.last_error, None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_empty_write_clears_the_file() {
        let path = temp_path("empty");
        let sink = OutputSink::new(path.clone());

        sink.write("something").unwrap();
        sink.write("").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(sink.state().last_written, "");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_failed_write_is_recorded_not_hidden() {
        let sink = OutputSink::new(PathBuf::from("/nonexistent/dir/for/mpristext/out.txt"));
        assert!(sink.write("track").is_err());

        let state = sink.state();
        assert_eq!(state.last_written, "track");
        assert!(state.last_error.is_some());
    }

    #[test]
    fn test_successful_write_clears_previous_error() {
        let path = temp_path("recover");
        let sink = OutputSink::new(path.clone());

        // Poke the state with a failure first.
        {
            let mut state = sink.lock_state();
            state.last_error = Some("boom".to_string());
        }
        sink.write("ok").unwrap();
        assert_eq!(sink.state().last_error, None);

        let _ = fs::remove_file(&path);
    }
}
