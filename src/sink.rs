use std::fmt::{self, Display};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::format::{CallSite, Entry};
use crate::resolve::{Gate, Resolved};
use crate::writer::Writer;

/// Environment variable naming the sink file when no path was set explicitly.
pub const PATH_ENV: &str = "TESTLOG_PATH";

/// A log sink: one backing file and one formatter, both fixed on first emit.
///
/// Every method returning [`Result`] reports failures the sink can not
/// recover from. Callers are expected to treat an `Err` as fatal; the
/// crate-level functions panic on it.
pub struct Sink {
    config: Config,
    gate: Gate,
    writer: Writer,
    env_var: String,
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink {
    /// A sink that falls back to [`PATH_ENV`] when no path is set.
    pub fn new() -> Self {
        Self::with_env_var(PATH_ENV)
    }

    /// A sink that falls back to the environment variable `name` when no
    /// path is set.
    pub fn with_env_var(name: impl Into<String>) -> Self {
        Self {
            config: Config::new(),
            gate: Gate::new(),
            writer: Writer::new(),
            env_var: name.into(),
        }
    }

    /// Sets the sink file to `segments` joined into one path. Fails if a
    /// path was already set or the sink has already been resolved.
    pub fn set_path<I, P>(&self, segments: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.config.set_path(segments)
    }

    /// Sets the line formatter. Fails if one was already set or the sink has
    /// already been resolved.
    pub fn set_formatter<F>(&self, formatter: F) -> Result<()>
    where
        F: Fn(&Entry<'_>) -> String + Send + Sync + 'static,
    {
        self.config.set_formatter(Arc::new(formatter))
    }

    /// The sink file, resolving the sink first if nothing was emitted yet.
    pub fn path(&self) -> Result<&Path> {
        Ok(&self.resolve()?.path)
    }

    /// The explicitly set path, or the resolved one. `None` before either.
    pub fn configured_path(&self) -> Option<PathBuf> {
        self.config.path()
    }

    pub fn is_resolved(&self) -> bool {
        self.gate.get().is_some()
    }

    /// Appends one line attributed to `site`.
    ///
    /// This is the entry point for wrappers that can not be `#[track_caller]`
    /// and capture the call-site themselves.
    pub fn append(&self, site: CallSite, args: &[&dyn Display]) -> Result<()> {
        let resolved = self.resolve()?;
        self.writer.append(resolved, site, args)
    }

    /// Appends `args`, space-joined, attributed to the caller.
    ///
    /// Arguments are written verbatim: one containing `\n` spreads the
    /// entry over several physical lines.
    #[track_caller]
    pub fn print(&self, args: &[&dyn Display]) -> Result<()> {
        self.append(CallSite::caller(), args)
    }

    /// Appends a preformatted message, usually built with `format_args!`.
    #[track_caller]
    pub fn printf(&self, args: fmt::Arguments<'_>) -> Result<()> {
        self.append(CallSite::caller(), &[&args])
    }

    fn resolve(&self) -> Result<&Resolved> {
        self.gate.resolve(&self.config, &self.env_var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    use crate::error::Error;

    const UNSET: &str = "TESTLOG_SINK_TEST_NEVER_SET";

    fn init_logging() {
        let _ = env_logger::try_init();
    }

    fn sink_in(dir: &Path) -> Sink {
        let sink = Sink::with_env_var(UNSET);
        sink.set_path([dir, Path::new("sink.log")]).unwrap();
        sink
    }

    #[test]
    fn stub_formatter_sees_every_call() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let sink = sink_in(dir.path());

        let expected: [Vec<&str>; 3] = [
            vec!["something happened"],
            vec!["something more", "happened"],
            vec!["and", "then"],
        ];
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        {
            let calls = calls.clone();
            let seen = seen.clone();
            sink.set_formatter(move |entry| {
                let args: Vec<String> = entry.args().iter().map(|a| a.to_string()).collect();
                seen.lock().unwrap().push(args);
                format!("{}\n", calls.fetch_add(1, Ordering::SeqCst))
            })
            .unwrap();
        }

        sink.print(&[&"something happened"]).unwrap();
        sink.print(&[&"something more", &"happened"]).unwrap();
        sink.print(&[&"and", &"then"]).unwrap();

        assert_eq!(
            fs::read_to_string(sink.path().unwrap()).unwrap(),
            "0\n1\n2\n"
        );
        assert_eq!(*seen.lock().unwrap(), expected);
    }

    #[test]
    fn default_lines_share_pid_and_advance_in_time() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink_in(dir.path());

        let first = line!() + 1;
        sink.print(&[&"something happened"]).unwrap();
        sink.print(&[&"something more", &"happened"]).unwrap();

        let content = fs::read_to_string(sink.path().unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("\tsomething happened"), "{}", lines[0]);
        assert!(lines[1].ends_with("\tsomething more happened"), "{}", lines[1]);
        assert!(lines[0].contains(&format!("\t{}:{first}\t", file!())));
        assert!(lines[1].contains(&format!("\t{}:{}\t", file!(), first + 1)));

        let header = |line: &str| -> (String, String) {
            let (stamp, rest) = line[1..].split_once("][").unwrap();
            let (pid, _) = rest.split_once(']').unwrap();
            (stamp.to_string(), pid.to_string())
        };
        let (t0, pid0) = header(lines[0]);
        let (t1, pid1) = header(lines[1]);
        assert!(t0 <= t1, "{t0} > {t1}");
        assert_eq!(pid0, pid1);
        assert_eq!(pid0, std::process::id().to_string());
    }

    #[test]
    fn printf_formats_message() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink_in(dir.path());
        sink.printf(format_args!("Printf {}", 42)).unwrap();

        let content = fs::read_to_string(sink.path().unwrap()).unwrap();
        assert!(content.ends_with("\tPrintf 42\n"), "{content}");
    }

    #[test]
    fn setters_fail_after_resolution() {
        let sink = Sink::with_env_var(UNSET);
        let path = sink.path().unwrap().to_path_buf();
        assert!(sink.is_resolved());
        assert_eq!(sink.configured_path(), Some(path.clone()));

        assert!(matches!(
            sink.set_path(["late.log"]),
            Err(Error::PathAlreadySet)
        ));
        assert!(matches!(
            sink.set_formatter(|_| String::from("late\n")),
            Err(Error::FormatterAlreadySet)
        ));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn scratch_file_reused_by_later_emits() {
        let sink = Sink::with_env_var(UNSET);
        assert!(!sink.is_resolved());
        sink.print(&[&"one"]).unwrap();
        let path = sink.path().unwrap().to_path_buf();
        sink.print(&[&"two"]).unwrap();
        sink.print(&[&"three"]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.lines().last().unwrap().ends_with("\tthree"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn env_var_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.log");
        let var = "TESTLOG_SINK_TEST_ENV";
        std::env::set_var(var, &path);

        let sink = Sink::with_env_var(var);
        sink.print(&[&"via env"]).unwrap();
        assert_eq!(sink.path().unwrap(), path);
        assert!(fs::read_to_string(&path).unwrap().ends_with("\tvia env\n"));
    }

    #[test]
    fn independent_sinks_do_not_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let a = Sink::with_env_var(UNSET);
        let b = Sink::with_env_var(UNSET);
        a.set_path([dir.path().join("a.log")]).unwrap();
        b.set_path([dir.path().join("b.log")]).unwrap();

        a.print(&[&"to a"]).unwrap();
        b.print(&[&"to b"]).unwrap();
        for name in ["a.log", "b.log"] {
            let content = fs::read_to_string(dir.path().join(name)).unwrap();
            assert_eq!(content.lines().count(), 1, "{name}");
        }
    }

    #[test]
    fn open_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::with_env_var(UNSET);
        sink.set_path([dir.path(), Path::new("missing"), Path::new("x.log")])
            .unwrap();
        assert!(matches!(
            sink.print(&[&"lost"]),
            Err(Error::Open { .. })
        ));
    }

    #[test]
    fn concurrent_first_emits_land_in_one_file() {
        const THREADS: usize = 16;

        let sink = Sink::with_env_var(UNSET);
        let barrier = Barrier::new(THREADS);
        thread::scope(|s| {
            for t in 0..THREADS {
                let (sink, barrier) = (&sink, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    sink.print(&[&"thread", &t]).unwrap();
                });
            }
        });

        let path = sink.path().unwrap().to_path_buf();
        let content = fs::read_to_string(&path).unwrap();
        let mut ids: Vec<usize> = content
            .lines()
            .map(|l| l.rsplit(' ').next().unwrap().parse().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..THREADS).collect::<Vec<_>>());
        fs::remove_file(path).unwrap();
    }
}
