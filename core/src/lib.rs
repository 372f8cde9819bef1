//! A single-writer sink that serializes tuples as delimited lines of a text file.
//!
//! ```no_run
//! use tuple_sink_core::sink::{FileSink, Sink};
//!
//! # fn main() -> tuple_sink_core::errors::Result<()> {
//! let mut sink = FileSink::path("/tmp").filename("out").with_separator(",").create();
//! sink.begin()?;
//! sink.process(&["a", "b", "c"])?;
//! sink.process(&["x", "y"])?;
//! sink.end()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod sink;
pub mod telemetry;
pub mod tuple;

pub use config::SinkSettings;
pub use errors::{Result, SinkError};
pub use sink::{FileSink, FileSinkBuilder, Sink, SinkState};
pub use tuple::{Record, Tuple, Value};
