//! Paired "started"/"stopped" events.
//!
//! ```no_run
//! fn do_something(sink: &testlog::Sink, v: i32) -> testlog::Result<()> {
//!     let op = sink.start("do_something", &[&"<-", &v])?;
//!     // ...
//!     op.try_stop(&[&"->", &"ok"])
//! }
//! ```

use std::borrow::Cow;
use std::fmt::Display;
use std::thread::{self, Thread};

use crate::error::{fatal, Result};
use crate::format::CallSite;
use crate::sink::Sink;

const STARTED: &str = "started";
const STOPPED: &str = "stopped";

/// Anything that identifies a running test.
pub trait TestName {
    fn test_name(&self) -> Cow<'_, str>;
}

impl TestName for str {
    fn test_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl TestName for String {
    fn test_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

/// libtest names each test thread after the test's path.
impl TestName for Thread {
    fn test_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name().unwrap_or("<unnamed>"))
    }
}

/// Handle to the current thread, named after the running test under libtest.
pub fn current_test() -> Thread {
    thread::current()
}

/// Emits the "stopped" line of an event begun with [`Sink::start`].
///
/// A stopper may be used any number of times; each call adds a line.
pub struct Stopper<'a> {
    sink: &'a Sink,
    name: String,
}

impl Stopper<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Emits `<name> stopped <args>` attributed to this call, panicking if
    /// the line can not be written.
    #[track_caller]
    pub fn stop(&self, args: &[&dyn Display]) {
        if let Err(err) = self.try_stop(args) {
            fatal("stop", err);
        }
    }

    /// Like [`Stopper::stop`] but hands the error back.
    #[track_caller]
    pub fn try_stop(&self, args: &[&dyn Display]) -> Result<()> {
        self.sink.event(CallSite::caller(), &self.name, STOPPED, args)
    }
}

impl Sink {
    /// Emits `<name> started <args>` and returns the matching [`Stopper`].
    #[track_caller]
    pub fn start(&self, name: &str, args: &[&dyn Display]) -> Result<Stopper<'_>> {
        self.event(CallSite::caller(), name, STARTED, args)?;
        Ok(Stopper {
            sink: self,
            name: name.to_owned(),
        })
    }

    /// Emits `<name> stopped <args>` for an event whose start is tracked
    /// elsewhere.
    #[track_caller]
    pub fn stop(&self, name: &str, args: &[&dyn Display]) -> Result<()> {
        self.event(CallSite::caller(), name, STOPPED, args)
    }

    /// [`Sink::start`] named after the test `t`. Meant to be called once at
    /// the top of a test, stopping the result at teardown.
    #[track_caller]
    pub fn test<T>(&self, t: &T, args: &[&dyn Display]) -> Result<Stopper<'_>>
    where
        T: TestName + ?Sized,
    {
        self.start(&t.test_name(), args)
    }

    fn event(
        &self,
        site: CallSite,
        name: &str,
        verb: &str,
        args: &[&dyn Display],
    ) -> Result<()> {
        let mut line: Vec<&dyn Display> = Vec::with_capacity(args.len() + 2);
        line.push(&name);
        line.push(&verb);
        line.extend_from_slice(args);
        self.append(site, &line)
    }
}
