//! One-time resolution of where a sink writes and how it formats.
//!
//! The first emit on a sink runs [`Gate::resolve`]; callers arriving while it
//! is in flight block on the latch and then read the published result.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use once_cell::sync::OnceCell;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::{default_formatter, Formatter};
use crate::writer;

/// Everything an append needs, fixed for the lifetime of the sink.
pub(crate) struct Resolved {
    pub path: PathBuf,
    pub formatter: Formatter,
    pub pid: u32,
}

pub(crate) struct Gate {
    resolved: OnceCell<Resolved>,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            resolved: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Option<&Resolved> {
        self.resolved.get()
    }

    /// Resolves on first use and returns the cached result afterwards. A
    /// failed attempt publishes nothing.
    pub fn resolve(&self, config: &Config, env_var: &str) -> Result<&Resolved> {
        self.resolved.get_or_try_init(|| resolve(config, env_var))
    }
}

fn resolve(config: &Config, env_var: &str) -> Result<Resolved> {
    let formatter = config.formatter_or_insert_with(|| Arc::new(default_formatter));

    let path = config.path_or_try_insert_with(|| match std::env::var_os(env_var) {
        Some(path) => {
            debug!(target: "testlog", "using ${env_var}");
            Ok(PathBuf::from(path))
        }
        None => create_scratch_file(),
    })?;
    // Explicit and environment-provided paths may not exist yet.
    writer::open_append(&path)?;

    let pid = std::process::id();
    info!(target: "testlog", "logging to {} (pid {pid})", path.display());

    Ok(Resolved {
        path,
        formatter,
        pid,
    })
}

/// Creates `testlog-<unix nanos>-XXXXXX` in the temp dir and keeps it.
fn create_scratch_file() -> Result<PathBuf> {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let file = tempfile::Builder::new()
        .prefix(&format!("testlog-{nanos}-"))
        .tempfile()
        .map_err(Error::Create)?;
    let (_, path) = file.keep().map_err(|e| Error::Create(e.error))?;
    debug!(target: "testlog", "created {}", path.display());
    Ok(path)
}
