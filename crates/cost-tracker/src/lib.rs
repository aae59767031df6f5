//! Daily AWS cost logger with a small read API.
//!
//! One function, two branches:
//!
//! - **Cost Logger** - on a scheduled (non-HTTP) invocation, asks Cost
//!   Explorer for yesterday's unblended cost and appends a
//!   `{Timestamp, Cost}` record to a DynamoDB table.
//! - **Log Reader** - on an HTTP `GET` invocation, scans up to 10 records
//!   and returns them as a JSON array for a frontend.
//!
//! ## Wiring
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cost_tracker::{Config, CostExplorerClient, Dispatcher, DynamoDbStore, SystemClock};
//!
//! let config = Config::from_env()?;
//! let store = Arc::new(DynamoDbStore::new(&config)?);
//! let costs = Arc::new(CostExplorerClient::new(&config)?);
//! let dispatcher = Dispatcher::new(costs, store, Arc::new(SystemClock));
//!
//! let response = dispatcher.handle(&serde_json::json!({"httpMethod": "GET"})).await?;
//! ```
//!
//! ## Configuration
//!
//! See [`Config`]. `DYNAMODB_TABLE` and AWS credentials are required; all
//! other settings have defaults.

pub mod aws;
pub mod clock;
pub mod config;
pub mod cost;
pub mod error;
pub mod handler;
pub mod invocation;
pub mod response;
pub mod store;
pub mod telemetry;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AwsCredentials, Config, ConfigError, LogFormat};
pub use cost::{CostExplorerClient, CostReporter};
pub use error::{Error, Result};
pub use handler::{CostLogger, Dispatcher, LogReader};
pub use invocation::Invocation;
pub use response::{HttpResponse, LogEntry};
pub use store::{CostRecord, CostStore, DynamoDbStore, InMemoryStore};
