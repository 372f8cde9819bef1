use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tuple_sink_core=info,tuple_sink_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Counters kept by a sink instance across its lifecycle.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SinkMetrics {
    pub records_written: u64,
    /// Bytes handed to the write buffer, line terminators included.
    pub bytes_written: u64,
    pub lifecycles_started: u64,
    pub lifecycles_completed: u64,
}
