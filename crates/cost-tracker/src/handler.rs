//! Invocation dispatch and the two request flows.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::clock::{iso_timestamp, Clock};
use crate::cost::{CostAndUsageRequest, CostAndUsageResponse, CostReporter, UNBLENDED_COST};
use crate::error::{Error, Result};
use crate::invocation::Invocation;
use crate::response::{HttpResponse, LogEntry, LOGGED_MESSAGE};
use crate::store::{CostRecord, CostStore};

/// Logged when the cost API reports no results for the window.
pub const ZERO_COST: &str = "0.00";

/// Maximum entries returned by a read.
pub const READ_LIMIT: usize = 10;

/// Fetches yesterday's cost and appends it to the store.
pub struct CostLogger {
    costs: Arc<dyn CostReporter>,
    store: Arc<dyn CostStore>,
    clock: Arc<dyn Clock>,
}

impl CostLogger {
    #[must_use]
    pub fn new(
        costs: Arc<dyn CostReporter>,
        store: Arc<dyn CostStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            costs,
            store,
            clock,
        }
    }

    /// Query the previous day's unblended cost and write one record.
    ///
    /// # Errors
    ///
    /// Any cost API or store failure is returned as-is; nothing is retried.
    pub async fn log_previous_day(&self) -> Result<CostRecord> {
        let now = self.clock.now();
        let request = CostAndUsageRequest::previous_day(now);
        debug!(
            provider = self.costs.name(),
            start = %request.time_period.start,
            end = %request.time_period.end,
            "Querying cost"
        );

        let response = self.costs.get_cost_and_usage(&request).await?;
        let record = CostRecord::new(iso_timestamp(now), first_unblended_amount(&response)?);
        self.store.put(&record).await?;

        info!(
            timestamp = %record.timestamp,
            cost = record.cost.as_deref().unwrap_or_default(),
            "Cost logged"
        );
        Ok(record)
    }
}

/// First bucket's unblended amount, or [`ZERO_COST`] when there are no buckets.
fn first_unblended_amount(response: &CostAndUsageResponse) -> Result<String> {
    let Some(first) = response.results_by_time.first() else {
        return Ok(ZERO_COST.to_string());
    };
    first
        .total
        .get(UNBLENDED_COST)
        .and_then(|metric| metric.amount.clone())
        .ok_or_else(|| {
            Error::MalformedResponse(format!("first result has no {UNBLENDED_COST} amount"))
        })
}

/// Reads logged entries for display.
///
/// The read is an unordered scan capped at [`READ_LIMIT`]: once the table
/// holds more than that, the entries returned are not necessarily the most
/// recent ones.
pub struct LogReader {
    store: Arc<dyn CostStore>,
}

impl LogReader {
    #[must_use]
    pub fn new(store: Arc<dyn CostStore>) -> Self {
        Self { store }
    }

    /// Scan up to [`READ_LIMIT`] records and map them to log entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails or a record is malformed.
    pub async fn read_logs(&self) -> Result<Vec<LogEntry>> {
        let records = self.store.scan(READ_LIMIT).await?;
        debug!(count = records.len(), "Read cost records");
        Ok(records.iter().map(LogEntry::from).collect())
    }
}

/// Routes each invocation to the Cost Logger or the Log Reader.
///
/// Built once per execution context; both branches share the store.
pub struct Dispatcher {
    logger: CostLogger,
    reader: LogReader,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        costs: Arc<dyn CostReporter>,
        store: Arc<dyn CostStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            logger: CostLogger::new(costs, Arc::clone(&store), clock),
            reader: LogReader::new(store),
        }
    }

    /// Classify a raw payload and dispatch it.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the selected branch.
    pub async fn handle(&self, payload: &Value) -> Result<HttpResponse> {
        self.dispatch(Invocation::from_payload(payload)).await
    }

    /// Run the branch for an already-classified invocation.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the selected branch.
    pub async fn dispatch(&self, invocation: Invocation) -> Result<HttpResponse> {
        info!(invocation = %invocation, "Dispatching invocation");
        match invocation {
            Invocation::HttpGet => {
                let entries = self.reader.read_logs().await?;
                Ok(HttpResponse::json_with_cors(&entries)?)
            }
            Invocation::Scheduled => {
                self.logger.log_previous_day().await?;
                Ok(HttpResponse::message(LOGGED_MESSAGE)?)
            }
        }
    }
}
