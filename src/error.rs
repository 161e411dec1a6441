use std::io;
use std::path::PathBuf;

/// Everything that can go wrong in a sink.
///
/// None of these are recoverable: a caller receiving an `Err` from a
/// [`Sink`](crate::Sink) method must treat it as fatal. The crate-root
/// functions do exactly that and panic.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- misuse ----------------------------------------------------
    #[error("path is already set")]
    PathAlreadySet,
    #[error("formatter is already set")]
    FormatterAlreadySet,
    #[error("path has no segments")]
    EmptyPath,

    // --------------------------------- environment -----------------------------------------------
    #[error("failed to create temporary file: {0}")]
    Create(#[source] io::Error),
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to close {path:?}: {source}")]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // --------------------------------- instrumentation -------------------------------------------
    #[error("formatter produced an empty line for {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reports `err` from the operation `op` and panics.
#[track_caller]
pub(crate) fn fatal(op: &str, err: Error) -> ! {
    log::error!(target: "testlog", "{op}: {err}");
    panic!("testlog: {op}: {err}");
}
