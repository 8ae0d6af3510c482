//! Command history log.
//!
//! Every line sent to the engine is mirrored here. The log is a diagnostic aid:
//! if the file cannot be created, or a later write fails, it turns into a sink
//! that drops everything instead of failing the session.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, LineWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    Append,
    #[default]
    Truncate,
}

#[derive(Debug, Default)]
pub struct HistoryLog {
    path: Option<PathBuf>,
    sink: Option<LineWriter<File>>,
}

impl HistoryLog {
    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Open the log at `path`, creating parent directories as needed.
    ///
    /// Never fails: on error the returned log is a no-op sink and the error is
    /// handed back so the caller can report the degraded state.
    pub fn open(path: &Path, mode: HistoryMode) -> (Self, Option<io::Error>) {
        match open_file(path, mode) {
            Ok(file) => (
                Self {
                    path: Some(path.to_path_buf()),
                    sink: Some(LineWriter::new(file)),
                },
                None,
            ),
            Err(e) => (Self::disabled(), Some(e)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append `text` followed by a newline.
    pub fn record(&mut self, text: &str) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(sink, "{}", text) {
            warn!("history write failed, disabling history: {}", e);
            self.sink = None;
        }
    }

    /// Flush and close the file. Safe to call repeatedly or on a disabled log.
    pub fn close(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.flush() {
                warn!("history flush failed: {}", e);
            }
        }
    }
}

fn open_file(path: &Path, mode: HistoryMode) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut opts = OpenOptions::new();
    opts.create(true);
    match mode {
        HistoryMode::Append => opts.append(true),
        HistoryMode::Truncate => opts.write(true).truncate(true),
    };
    opts.open(path)
}
