//! Line formatting: the call-site a line is attributed to, the entry handed
//! to a formatter, and the default rendering.
//!
//! Default lines look like
//! `[15:04:05.123456789][4242]\tsrc/lib.rs:17\tsomething happened\n`.

use std::fmt::{self, Display};
use std::panic::Location;
use std::sync::Arc;

use chrono::Local;

/// Source position a log line is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    file: &'static str,
    line: u32,
}

impl CallSite {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// The location of whoever called the (`#[track_caller]`) function this
    /// is invoked from.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl From<&'static Location<'static>> for CallSite {
    fn from(loc: &'static Location<'static>) -> Self {
        Self::new(loc.file(), loc.line())
    }
}

impl Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One emit call as seen by a formatter.
pub struct Entry<'a> {
    site: CallSite,
    pid: u32,
    args: &'a [&'a dyn Display],
}

impl<'a> Entry<'a> {
    pub fn new(site: CallSite, pid: u32, args: &'a [&'a dyn Display]) -> Self {
        Self { site, pid, args }
    }

    pub fn site(&self) -> CallSite {
        self.site
    }

    /// Process id captured when the sink was resolved.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn args(&self) -> &[&'a dyn Display] {
        self.args
    }

    /// Arguments rendered and joined with single spaces.
    pub fn message(&self) -> String {
        join_args(self.args)
    }
}

/// Maps an entry to exactly one line of text.
pub type Formatter = Arc<dyn Fn(&Entry<'_>) -> String + Send + Sync>;

/// `[HH:MM:SS.nnnnnnnnn][pid]\t<file>:<line>\t<args>\n`, stamped with the
/// local wall-clock time at the moment of formatting.
pub fn default_formatter(entry: &Entry<'_>) -> String {
    format!(
        "[{}][{}]\t{}\t{}\n",
        Local::now().format("%H:%M:%S%.9f"),
        entry.pid(),
        entry.site(),
        entry.message()
    )
}

pub fn join_args(args: &[&dyn Display]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&arg.to_string());
    }
    out
}
