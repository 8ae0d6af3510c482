//! Data files staged on disk for the engine to read, owned by one session.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

#[derive(Debug)]
pub struct TempDataFile {
    path: PathBuf,
    handle: Option<BufWriter<File>>,
}

impl TempDataFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self.handle.as_mut() {
            Some(w) => writeln!(w, "{}", line),
            None => Err(io::Error::other(format!(
                "{} is already closed",
                self.path.display()
            ))),
        }
    }

    pub fn close(&mut self) -> io::Result<()> {
        match self.handle.take() {
            Some(mut w) => w.flush(),
            None => Ok(()),
        }
    }

    /// Close if still open and delete from disk if present. Both steps always run.
    fn discard(&mut self) {
        if let Err(e) = self.close() {
            warn!("closing {} failed: {}", self.path.display(), e);
        }
        if self.path.exists() {
            match fs::remove_file(&self.path) {
                Ok(()) => debug!("removed {}", self.path.display()),
                Err(e) => warn!("removing {} failed: {}", self.path.display(), e),
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct TempFiles {
    files: BTreeMap<PathBuf, TempDataFile>,
}

impl TempFiles {
    /// Create `path` for writing, truncating any existing file, and register
    /// it for cleanup.
    ///
    /// Registration happens only once creation succeeds, so a file this
    /// session could not create is never deleted by it. A failure after that
    /// point (a short write) still leaves the file registered.
    pub fn create(&mut self, path: &Path) -> io::Result<&mut TempDataFile> {
        if let Some(previous) = self.files.get_mut(path) {
            if let Err(e) = previous.close() {
                warn!("closing previous {} failed: {}", path.display(), e);
            }
        }
        let file = File::create(path)?;
        let entry = self
            .files
            .entry(path.to_path_buf())
            .or_insert_with(|| TempDataFile {
                path: path.to_path_buf(),
                handle: None,
            });
        entry.handle = Some(BufWriter::new(file));
        Ok(entry)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Remove one file ahead of teardown. Returns whether it was registered.
    pub fn remove(&mut self, path: &Path) -> bool {
        match self.files.remove(path) {
            Some(mut file) => {
                file.discard();
                true
            }
            None => false,
        }
    }

    /// Close and delete every registered file.
    pub fn clear(&mut self) {
        for (_, mut file) in std::mem::take(&mut self.files) {
            file.discard();
        }
    }
}
