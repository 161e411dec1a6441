//! Append-only diagnostic log for test suites and instrumented programs.
//!
//! Every emit appends one line to a single file:
//!
//! ```text
//! [15:04:05.123456789][4242]	tests/it.rs:17	something happened
//! ```
//!
//! The file is chosen on the first emit, in this order: the path given to
//! [`set_path`], the `TESTLOG_PATH` environment variable, a fresh
//! `testlog-*` file in the temp dir. The formatter is fixed at the same
//! moment. Both setters fail once that has happened.
//!
//! The free functions here drive one process-wide [`Sink`] and panic on any
//! failure. Construct a [`Sink`] directly to get `Result`s and an instance
//! of your own.
//!
//! ```no_run
//! testlog::print(&[&"Print"]);
//! testlog::printf!("Printf {}", 42);
//!
//! let op = testlog::start("doSomething", &[&"<-", &1]);
//! op.stop(&[&"->", &"ok"]);
//!
//! testlog::stop("example", &[]);
//! ```

mod config;
mod error;
mod format;
mod resolve;
mod sink;
mod trace;
mod writer;

use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

pub use crate::error::{Error, Result};
pub use crate::format::{default_formatter, join_args, CallSite, Entry, Formatter};
pub use crate::sink::{Sink, PATH_ENV};
pub use crate::trace::{current_test, Stopper, TestName};

use crate::error::fatal;

static GLOBAL: Lazy<Sink> = Lazy::new(Sink::new);

/// The process-wide sink behind the free functions.
pub fn global() -> &'static Sink {
    &GLOBAL
}

/// Sets the log file to `segments` joined into one path. Panics if a path
/// was already set or something was already logged.
#[track_caller]
pub fn set_path<I, P>(segments: I)
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    if let Err(err) = GLOBAL.set_path(segments) {
        fatal("set path", err);
    }
}

/// Sets the line formatter. Panics if one was already set or something was
/// already logged.
#[track_caller]
pub fn set_formatter<F>(formatter: F)
where
    F: Fn(&Entry<'_>) -> String + Send + Sync + 'static,
{
    if let Err(err) = GLOBAL.set_formatter(formatter) {
        fatal("set formatter", err);
    }
}

/// The log file, choosing it now if nothing was logged yet.
#[track_caller]
pub fn path() -> PathBuf {
    match GLOBAL.path() {
        Ok(path) => path.to_path_buf(),
        Err(err) => fatal("resolve", err),
    }
}

/// Logs `args`, space-joined. Arguments containing `\n` are written as is.
#[track_caller]
pub fn print(args: &[&dyn Display]) {
    if let Err(err) = GLOBAL.print(args) {
        fatal("print", err);
    }
}

/// Logs a preformatted message. See also [`printf!`].
#[track_caller]
pub fn printf(args: fmt::Arguments<'_>) {
    if let Err(err) = GLOBAL.printf(args) {
        fatal("printf", err);
    }
}

/// Logs `<name> started <args>`; the returned [`Stopper`] logs the matching
/// `<name> stopped ...` line.
#[track_caller]
pub fn start(name: &str, args: &[&dyn Display]) -> Stopper<'static> {
    match GLOBAL.start(name, args) {
        Ok(stopper) => stopper,
        Err(err) => fatal("start", err),
    }
}

/// Logs `<name> stopped <args>` without a preceding [`start`].
#[track_caller]
pub fn stop(name: &str, args: &[&dyn Display]) {
    if let Err(err) = GLOBAL.stop(name, args) {
        fatal("stop", err);
    }
}

/// [`start`] named after the test `t`, typically `&current_test()`.
#[track_caller]
pub fn test<T>(t: &T, args: &[&dyn Display]) -> Stopper<'static>
where
    T: TestName + ?Sized,
{
    match GLOBAL.test(t, args) {
        Ok(stopper) => stopper,
        Err(err) => fatal("test", err),
    }
}

/// [`printf`] with `format!` syntax.
#[macro_export]
macro_rules! printf {
    ($($arg:tt)*) => {
        $crate::printf(::std::format_args!($($arg)*))
    };
}

/// [`print`] taking the arguments directly: `emit!("answer", 42)`.
#[macro_export]
macro_rules! emit {
    ($($arg:expr),* $(,)?) => {
        $crate::print(&[$(&$arg as &dyn ::std::fmt::Display),*])
    };
}
