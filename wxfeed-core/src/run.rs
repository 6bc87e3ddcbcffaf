use chrono::Local;
use tracing::{error, warn};

use crate::{
    client::FeedSource,
    config::RunConfig,
    error::RunError,
    feed,
    output::LineSink,
};

/// Per-run tally of what happened to each requested location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rendered: usize,
    pub fetch_failed: usize,
    pub parse_failed: usize,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.fetch_failed == 0 && self.parse_failed == 0
    }
}

/// Fetch, parse, render and write each location in order, one at a time.
///
/// Fetch and parse failures are logged and counted; the run moves on to the
/// next location. Sink and render failures abort the run.
pub async fn run<S, W>(
    source: &S,
    config: &RunConfig,
    locations: &[u64],
    sink: &mut W,
) -> Result<RunSummary, RunError>
where
    S: FeedSource + ?Sized,
    W: LineSink + ?Sized,
{
    let mut summary = RunSummary::default();

    for &location in locations {
        let body = match source.fetch(location, config.units).await {
            Ok(body) => body,
            Err(e) => {
                warn!(location, error = %e, "skipping location, fetch failed");
                summary.fetch_failed += 1;
                continue;
            }
        };

        let mut record = match feed::parse_with_namespace(&body, &config.namespace) {
            Ok(record) => record,
            Err(e) => {
                error!(location, error = %e, "could not parse weather feed");
                summary.parse_failed += 1;
                continue;
            }
        };

        if config.use_current_time {
            record = record.with_observed_at(Local::now().fixed_offset());
        }

        let line = config.format.render(&record, &config.date_format)?;
        sink.write_line(&line)?;
        summary.rendered += 1;
    }

    Ok(summary)
}
