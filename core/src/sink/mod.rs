pub mod file;

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::errors::Result;
use crate::tuple::Tuple;

pub use file::{FileSink, FileSinkBuilder, FileSinkConfig, SinkDefaults};

/// Lifecycle of a sink: `Unopened -> Active -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkState {
    Unopened,
    Active,
    Closed,
}

impl fmt::Display for SinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SinkState::Unopened => "unopened",
            SinkState::Active => "active",
            SinkState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// The `Sink` trait defines the contract for any destination of a tuple stream.
///
/// A driver calls `begin` once, `process` per record, then `end` once.
/// Implementations are synchronous: every call runs to completion and a
/// single instance must not be shared between concurrent writers.
pub trait Sink: Send {
    /// Acquires the output resource. On failure the sink stays `Unopened`.
    fn begin(&mut self) -> Result<()>;

    /// Serializes one tuple into the output. Rejected unless the sink is `Active`.
    fn process(&mut self, tuple: &dyn Tuple) -> Result<()>;

    /// Flushes and releases the output resource. A no-op when nothing is open.
    fn end(&mut self) -> Result<()>;

    fn state(&self) -> SinkState;
}

/// Runs a full lifecycle over `tuples`, returning the number of records processed.
///
/// `end` is called on every exit path once `begin` has succeeded, including
/// when a `process` call fails partway through. The first error is returned.
pub fn drain<S, I, T>(sink: &mut S, tuples: I) -> Result<usize>
where
    S: Sink + ?Sized,
    I: IntoIterator<Item = T>,
    T: Tuple,
{
    sink.begin()?;

    let mut count = 0;
    let mut outcome = Ok(());
    for tuple in tuples {
        if let Err(e) = sink.process(&tuple) {
            outcome = Err(e);
            break;
        }
        count += 1;
    }

    let closed = sink.end();
    match (outcome, closed) {
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                warn!(error = %close_err, "Failed to close sink after processing error");
            }
            Err(e)
        }
        (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(count),
    }
}
