use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::fd::{IntoRawFd, RawFd};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use nix::unistd;

use crate::error::{Error, Result};
use crate::format::{CallSite, Entry};
use crate::resolve::Resolved;

/// Appends formatted lines to a resolved sink, one open/write/close per line.
pub(crate) struct Writer {
    // Serializes the open/write/close of lines from this process so that
    // concurrent appends never interleave within a line.
    lock: Mutex<()>,
}

impl Writer {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
        }
    }

    pub fn append(
        &self,
        resolved: &Resolved,
        site: CallSite,
        args: &[&dyn Display],
    ) -> Result<()> {
        // Formatting under the lock keeps file order and stamped order equal.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut line = (resolved.formatter)(&Entry::new(site, resolved.pid, args));
        if line.is_empty() {
            return Err(Error::Format(site.to_string()));
        }
        if !line.ends_with('\n') {
            line.push('\n');
        }

        let mut file = open_append(&resolved.path)?;
        file.write_all(line.as_bytes()).map_err(|source| Error::Write {
            path: resolved.path.clone(),
            source,
        })?;
        close_fd(file.into_raw_fd(), &resolved.path)
    }
}

/// Closes `fd`, reporting the failure `File`'s `Drop` would discard.
fn close_fd(fd: RawFd, path: &Path) -> Result<()> {
    unistd::close(fd).map_err(|errno| Error::Close {
        path: path.to_path_buf(),
        source: errno.into(),
    })
}

pub(crate) fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })
}
