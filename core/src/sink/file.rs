use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{Result, SinkError};
use crate::sink::{Sink, SinkState};
use crate::telemetry::SinkMetrics;
use crate::tuple::Tuple;

pub const DEFAULT_PATH: &str = "tmp";
pub const DEFAULT_FILENAME: &str = "output";
pub const DEFAULT_SEPARATOR: &str = "|";
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Values substituted when a builder input is absent or invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDefaults {
    pub directory: PathBuf,
    pub filename: String,
    pub separator: String,
    pub buffer_size: usize,
}

impl Default for SinkDefaults {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_PATH),
            filename: DEFAULT_FILENAME.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Finalized, immutable settings of a [`FileSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSinkConfig {
    pub directory: PathBuf,
    pub location: PathBuf,
    pub separator: String,
    pub buffer_size: usize,
    pub create_dirs: bool,
}

/// Builder stages. Each one only exposes the next legal calls.
pub mod stage {
    #[derive(Debug)]
    pub struct Start;
    #[derive(Debug)]
    pub struct Filename;
    #[derive(Debug)]
    pub struct Optionals;
}

/// Staged builder for [`FileSink`]: `path -> filename -> [with_separator | buffer_size | create_dirs]* -> create`.
///
/// Empty or absent inputs fall back to the [`SinkDefaults`] the builder was
/// created with instead of failing. Use [`crate::config::SinkSettings::validate`]
/// when inputs must be rejected.
#[derive(Debug)]
pub struct FileSinkBuilder<S = stage::Start> {
    defaults: SinkDefaults,
    directory: PathBuf,
    location: PathBuf,
    separator: String,
    buffer_size: usize,
    create_dirs: bool,
    _stage: PhantomData<S>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl<S> FileSinkBuilder<S> {
    fn into_stage<T>(self) -> FileSinkBuilder<T> {
        FileSinkBuilder {
            defaults: self.defaults,
            directory: self.directory,
            location: self.location,
            separator: self.separator,
            buffer_size: self.buffer_size,
            create_dirs: self.create_dirs,
            _stage: PhantomData,
        }
    }
}

impl FileSinkBuilder<stage::Start> {
    pub fn new(defaults: SinkDefaults) -> Self {
        Self {
            directory: defaults.directory.clone(),
            location: PathBuf::new(),
            separator: defaults.separator.clone(),
            buffer_size: defaults.buffer_size,
            create_dirs: false,
            defaults,
            _stage: PhantomData,
        }
    }

    /// Sets the output directory.
    pub fn path<'a>(mut self, path: impl Into<Option<&'a str>>) -> FileSinkBuilder<stage::Filename> {
        match non_empty(path.into()) {
            Some(path) => self.directory = PathBuf::from(path),
            None => {
                debug!(default = %self.defaults.directory.display(), "Empty sink path, using default directory");
                self.directory = self.defaults.directory.clone();
            }
        }
        self.into_stage()
    }
}

impl Default for FileSinkBuilder<stage::Start> {
    fn default() -> Self {
        Self::new(SinkDefaults::default())
    }
}

impl FileSinkBuilder<stage::Filename> {
    /// Resolves the output file as `<path>/<filename>`.
    pub fn filename<'a>(
        mut self,
        filename: impl Into<Option<&'a str>>,
    ) -> FileSinkBuilder<stage::Optionals> {
        let name = match non_empty(filename.into()) {
            Some(name) => name.to_string(),
            None => {
                debug!(default = %self.defaults.filename, "Empty sink filename, using default");
                self.defaults.filename.clone()
            }
        };
        self.location = self.directory.join(name);
        self.into_stage()
    }
}

impl FileSinkBuilder<stage::Optionals> {
    pub fn with_separator<'a>(mut self, separator: impl Into<Option<&'a str>>) -> Self {
        self.separator = match non_empty(separator.into()) {
            Some(separator) => separator.to_string(),
            None => {
                debug!(default = %self.defaults.separator, "Empty separator, using default");
                self.defaults.separator.clone()
            }
        };
        self
    }

    /// Write buffer capacity in bytes. Non-positive sizes use the default.
    pub fn buffer_size(mut self, size: i64) -> Self {
        self.buffer_size = match usize::try_from(size) {
            Ok(size) if size > 0 => size,
            _ => {
                debug!(requested = size, default = self.defaults.buffer_size, "Invalid buffer size, using default");
                self.defaults.buffer_size
            }
        };
        self
    }

    /// Create missing parent directories when the sink begins.
    pub fn create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    pub fn config(&self) -> FileSinkConfig {
        FileSinkConfig {
            directory: self.directory.clone(),
            location: self.location.clone(),
            separator: self.separator.clone(),
            buffer_size: self.buffer_size,
            create_dirs: self.create_dirs,
        }
    }

    /// Mints a new, unopened sink. Every call yields an independent instance.
    pub fn create(&self) -> FileSink {
        FileSink::new(Arc::new(self.config()))
    }
}

/// Writes each tuple as one delimited line of a text file.
#[derive(Debug)]
pub struct FileSink {
    config: Arc<FileSinkConfig>,
    writer: Option<BufWriter<File>>,
    state: SinkState,
    line: String,
    metrics: SinkMetrics,
}

impl FileSink {
    /// Starts a builder using [`SinkDefaults::default`].
    pub fn path<'a>(path: impl Into<Option<&'a str>>) -> FileSinkBuilder<stage::Filename> {
        FileSinkBuilder::<stage::Start>::default().path(path)
    }

    pub fn new(config: Arc<FileSinkConfig>) -> Self {
        Self {
            config,
            writer: None,
            state: SinkState::Unopened,
            line: String::new(),
            metrics: SinkMetrics::default(),
        }
    }

    pub fn config(&self) -> &FileSinkConfig {
        &self.config
    }

    pub fn location(&self) -> &Path {
        &self.config.location
    }

    pub fn separator(&self) -> &str {
        &self.config.separator
    }

    pub fn buffer_size(&self) -> usize {
        self.config.buffer_size
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    fn open(&self) -> Result<File> {
        let location = &self.config.location;
        if self.config.create_dirs {
            if let Some(parent) = location.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| SinkError::io("create directory", parent, e))?;
            }
        }
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(location)
            .map_err(|e| SinkError::io("open", location, e))
    }

    fn serialize(&mut self, tuple: &dyn Tuple) {
        self.line.clear();
        let size = tuple.size();
        for index in 0..size {
            self.line.push_str(&tuple.value(index).to_string());
            if index + 1 < size {
                self.line.push_str(&self.config.separator);
            }
        }
        self.line.push_str(LINE_ENDING);
    }
}

impl Sink for FileSink {
    fn begin(&mut self) -> Result<()> {
        if self.state != SinkState::Unopened {
            return Err(SinkError::InvalidState {
                operation: "begin",
                state: self.state,
            });
        }

        let file = self.open()?;
        self.writer = Some(BufWriter::with_capacity(self.config.buffer_size, file));
        self.state = SinkState::Active;
        self.metrics.lifecycles_started += 1;
        info!(
            location = %self.config.location.display(),
            buffer_size = self.config.buffer_size,
            "File sink opened"
        );
        Ok(())
    }

    fn process(&mut self, tuple: &dyn Tuple) -> Result<()> {
        if self.state != SinkState::Active {
            return Err(SinkError::InvalidState {
                operation: "process",
                state: self.state,
            });
        }

        self.serialize(tuple);
        let Some(writer) = self.writer.as_mut() else {
            return Err(SinkError::InvalidState {
                operation: "process",
                state: self.state,
            });
        };
        writer
            .write_all(self.line.as_bytes())
            .map_err(|e| SinkError::io("write", &self.config.location, e))?;

        self.metrics.records_written += 1;
        self.metrics.bytes_written += self.line.len() as u64;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        self.state = SinkState::Closed;

        writer
            .flush()
            .map_err(|e| SinkError::io("flush", &self.config.location, e))?;
        self.metrics.lifecycles_completed += 1;
        info!(
            location = %self.config.location.display(),
            records = self.metrics.records_written,
            bytes = self.metrics.bytes_written,
            "File sink closed"
        );
        Ok(())
    }

    fn state(&self) -> SinkState {
        self.state
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            warn!(
                location = %self.config.location.display(),
                "File sink dropped while active, flushing"
            );
            if let Err(e) = writer.flush() {
                warn!(error = %e, "Failed to flush file sink on drop");
            }
        }
    }
}
