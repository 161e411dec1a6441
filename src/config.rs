use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::format::Formatter;

/// A value that may be stored at most once.
struct SetOnce<T>(Mutex<Option<T>>);

impl<T: Clone> SetOnce<T> {
    fn new() -> Self {
        Self(Mutex::new(None))
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // Nothing panics while the lock is held, but a poisoned slot is still
        // consistent: it is either empty or holds a complete value.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value`, handing it back if the slot is already occupied.
    fn set(&self, value: T) -> std::result::Result<(), T> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Err(value);
        }
        *slot = Some(value);
        Ok(())
    }

    fn get(&self) -> Option<T> {
        self.lock().clone()
    }

    fn get_or_insert_with(&self, init: impl FnOnce() -> T) -> T {
        self.lock().get_or_insert_with(init).clone()
    }

    /// Returns the stored value, filling the slot from `init` first if it is
    /// empty. The lock is held across `init`, so a concurrent `set` waits and
    /// then fails.
    fn get_or_try_insert_with<E>(
        &self,
        init: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let mut slot = self.lock();
        if let Some(value) = slot.as_ref() {
            return Ok(value.clone());
        }
        let value = init()?;
        *slot = Some(value.clone());
        Ok(value)
    }
}

/// Set-once path and formatter of a sink.
pub(crate) struct Config {
    path: SetOnce<PathBuf>,
    formatter: SetOnce<Formatter>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            path: SetOnce::new(),
            formatter: SetOnce::new(),
        }
    }

    pub fn set_path<I, P>(&self, segments: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let path = join_segments(segments)?;
        self.path.set(path).map_err(|_| Error::PathAlreadySet)
    }

    pub fn set_formatter(&self, formatter: Formatter) -> Result<()> {
        self.formatter
            .set(formatter)
            .map_err(|_| Error::FormatterAlreadySet)
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.path.get()
    }

    /// The configured formatter, or `default()` which is then recorded as if
    /// it had been set explicitly.
    pub fn formatter_or_insert_with(&self, default: impl FnOnce() -> Formatter) -> Formatter {
        self.formatter.get_or_insert_with(default)
    }

    /// The configured path, or the one `locate` comes up with, which is then
    /// recorded as if it had been set explicitly.
    pub fn path_or_try_insert_with(
        &self,
        locate: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<PathBuf> {
        self.path.get_or_try_insert_with(locate)
    }
}

fn join_segments<I, P>(segments: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let path: PathBuf = segments.into_iter().collect();
    if path.as_os_str().is_empty() {
        return Err(Error::EmptyPath);
    }
    Ok(path)
}
