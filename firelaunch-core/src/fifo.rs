//! Log and metrics pipe management
//!
//! The VMM writes its log and metrics streams into named pipes. This module
//! decides where those pipes live, creates them, forwards the log pipe into a
//! plain log file when one was requested, and keeps track of every resource
//! it created so that [`Options::close`] can release them on shutdown.

use nix::sys::stat::Mode;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::constants;
use crate::error::{LaunchError, LaunchResult};
use crate::options::{non_empty, Options};

/// A resource that must be released when the launcher shuts down
#[derive(Debug)]
pub enum Closer {
    /// Log file the log pipe is forwarded into
    LogFile(File),
    /// Private directory holding generated pipes
    TempDir(TempDir),
    /// Named pipe created at a caller-chosen path
    Pipe(PathBuf),
}

impl Closer {
    fn close(self) -> io::Result<()> {
        match self {
            Closer::LogFile(file) => file.sync_all(),
            Closer::TempDir(dir) => dir.close(),
            Closer::Pipe(path) => match std::fs::remove_file(&path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        }
    }

    fn describe(&self) -> String {
        match self {
            Closer::LogFile(_) => "fifo log file".to_string(),
            Closer::TempDir(dir) => format!("fifo directory {}", dir.path().display()),
            Closer::Pipe(path) => format!("fifo {}", path.display()),
        }
    }
}

/// Resources created while resolving pipes, released in creation order
#[derive(Debug, Default)]
pub struct FifoResources {
    closers: Vec<Closer>,
}

impl FifoResources {
    fn push(&mut self, closer: Closer) {
        self.closers.push(closer);
    }

    fn len(&self) -> usize {
        self.closers.len()
    }

    fn close(&mut self) {
        for closer in std::mem::take(&mut self.closers) {
            let what = closer.describe();
            match closer.close() {
                Ok(()) => debug!("Released {}", what),
                Err(e) => warn!("Failed to release {}: {}", what, e),
            }
        }
    }
}

impl Drop for FifoResources {
    fn drop(&mut self) {
        self.close();
    }
}

impl Options {
    /// Work out the log and metrics pipe paths.
    ///
    /// Returns a writer for the combined log file when `fifo_log_file` is set.
    /// Pipe paths the caller left unset are generated inside one private
    /// temporary directory, which is registered for removal.
    pub fn resolve_fifos(&mut self) -> LaunchResult<Option<File>> {
        let mut generate_log_fifo = false;
        let mut generate_metrics_fifo = false;
        let mut writer = None;

        if let Some(log_file) = non_empty(&self.fifo_log_file) {
            if non_empty(&self.log_fifo).is_some() {
                return Err(LaunchError::ConflictingLogOptions);
            }

            let file = open_fifo_log_file(log_file).map_err(LaunchError::FifoLogFile)?;
            writer = Some(file.try_clone().map_err(LaunchError::FifoLogFile)?);
            info!("Forwarding VMM log into {}", log_file.display());
            self.add_closer(Closer::LogFile(file));

            generate_log_fifo = true;
            generate_metrics_fifo = non_empty(&self.metrics_fifo).is_none();
        } else if non_empty(&self.log_fifo).is_some() || non_empty(&self.metrics_fifo).is_some() {
            generate_log_fifo = non_empty(&self.log_fifo).is_none();
            generate_metrics_fifo = non_empty(&self.metrics_fifo).is_none();
        }

        if generate_log_fifo || generate_metrics_fifo {
            let dir = tempfile::Builder::new()
                .prefix(constants::FIFO_DIR_PREFIX)
                .tempdir()
                .map_err(LaunchError::TempDir)?;
            debug!("Created fifo directory {}", dir.path().display());

            if generate_log_fifo {
                self.log_fifo = Some(dir.path().join(constants::LOG_FIFO_NAME));
            }
            if generate_metrics_fifo {
                self.metrics_fifo = Some(dir.path().join(constants::METRICS_FIFO_NAME));
            }
            self.add_closer(Closer::TempDir(dir));
        }

        Ok(writer)
    }

    /// Create the named pipes at the resolved log and metrics paths.
    ///
    /// A path that already holds a pipe is reused and left in place on close.
    pub fn create_pipes(&mut self) -> LaunchResult<()> {
        let paths: Vec<PathBuf> = [&self.log_fifo, &self.metrics_fifo]
            .into_iter()
            .filter_map(|path| non_empty(path).map(Path::to_path_buf))
            .collect();

        for path in paths {
            if is_fifo(&path) {
                debug!("Reusing existing fifo {}", path.display());
                continue;
            }
            create_fifo(&path)?;
            info!("Created fifo {}", path.display());
            self.add_closer(Closer::Pipe(path));
        }
        Ok(())
    }

    /// Create the pipes and, when a log writer is given, start copying the
    /// log pipe into it on a background thread.
    pub fn start_log_forwarding(
        &mut self,
        writer: Option<File>,
    ) -> LaunchResult<Option<JoinHandle<()>>> {
        self.create_pipes()?;

        match (writer, non_empty(&self.log_fifo)) {
            (Some(writer), Some(log_fifo)) => {
                FifoForwarder::spawn(log_fifo.to_path_buf(), writer).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Release every registered resource in registration order.
    ///
    /// Failures are logged and skipped. Calling this again is a no-op.
    pub fn close(&mut self) {
        self.resources.close();
    }

    /// Number of resources waiting to be released
    pub fn closer_count(&self) -> usize {
        self.resources.len()
    }

    fn add_closer(&mut self, closer: Closer) {
        self.resources.push(closer);
    }
}

/// Copies everything written into a pipe to a writer
pub struct FifoForwarder;

impl FifoForwarder {
    /// Start one worker thread for `fifo_path`.
    ///
    /// The worker blocks until the VMM opens the pipe for writing, then copies
    /// until the pipe is closed. Errors are reported as warnings since the
    /// caller has long since returned.
    ///
    /// The thread is detached. If no writer ever opens the pipe it stays
    /// parked in `open` until the process exits, even after [`Options::close`]
    /// has removed the pipe path.
    pub fn spawn<W>(fifo_path: PathBuf, mut writer: W) -> LaunchResult<JoinHandle<()>>
    where
        W: Write + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("fifo-forwarder".to_string())
            .spawn(move || match forward(&fifo_path, &mut writer) {
                Ok(bytes) => debug!("Forwarded {} bytes from {}", bytes, fifo_path.display()),
                Err(e) => warn!("Log forwarding from {} stopped: {}", fifo_path.display(), e),
            })?;
        Ok(handle)
    }
}

fn forward<W: Write>(fifo_path: &Path, writer: &mut W) -> io::Result<u64> {
    let mut fifo = File::open(fifo_path)?;
    let bytes = io::copy(&mut fifo, writer)?;
    writer.flush()?;
    Ok(bytes)
}

fn open_fifo_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o644)
        .open(path)
}

fn create_fifo(path: &Path) -> LaunchResult<()> {
    nix::unistd::mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR).map_err(|errno| {
        LaunchError::FifoCreate {
            path: path.to_path_buf(),
            source: errno.into(),
        }
    })
}

fn is_fifo(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.file_type().is_fifo())
        .unwrap_or(false)
}
