use anyhow::{Context, Result};
use std::io::{self, BufRead};
use tracing::info;
use tuple_sink_core::config::load_config;
use tuple_sink_core::sink::drain;
use tuple_sink_core::telemetry::init_tracing;
use tuple_sink_core::tuple::Record;

/// Drives a file sink from standard input.
///
/// What it does at a high-level:
///     Load config from the path given as first argument, or from the environment.
///     Read one JSON array per stdin line, e.g. `["a", 1, null]`.
///     Write every record through the sink, then report the metrics.
fn main() -> Result<()> {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let settings = load_config(config_path.as_deref()).context("Failed to load sink configuration")?;
    settings.validate().context("Invalid sink configuration")?;

    let mut sink = settings.build_sink();
    info!(location = %sink.location().display(), "Starting sink runner");

    let records = read_records(io::stdin().lock())?;
    let written = drain(&mut sink, records).context("Sink lifecycle failed")?;

    info!(written, metrics = ?sink.metrics(), "Sink runner finished");
    Ok(())
}

/// Parses stdin before the sink is opened so a malformed line never leaves
/// a truncated output file behind.
fn read_records(input: impl BufRead) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read input line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line)
            .with_context(|| format!("Input line {} is not a JSON array", line_no))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuple_sink_core::tuple::{Tuple, Value};

    #[test]
    fn test_read_records_skips_blank_lines() {
        let input = "[\"a\", 1]\n\n  \n[null]\n";
        let records = read_records(input.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].size(), 2);
        assert_eq!(records[1].get(0), Some(&Value::Null));
    }

    #[test]
    fn test_read_records_reports_line_number() {
        let input = "[\"ok\"]\n{\"not\": \"an array\"}\n";
        let err = read_records(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
