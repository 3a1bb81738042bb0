use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hostsync_core::projection::hosts_file::HostsSink;
use tracing::debug;

/// A hosts file on disk, rewritten in full on every publish.
#[derive(Debug, Clone)]
pub struct HostsFile {
    path: PathBuf,
}

impl HostsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostsSink for HostsFile {
    fn write(&mut self, contents: &str) -> io::Result<()> {
        fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), bytes = contents.len(), "hosts file written");
        Ok(())
    }
}
