//! Cost-reporting API.
//!
//! [`CostReporter`] is the seam the Cost Logger depends on;
//! [`CostExplorerClient`] is the AWS implementation.

mod client;
pub mod models;

use async_trait::async_trait;

use crate::aws::AwsError;

pub use client::CostExplorerClient;
pub use models::{
    CostAndUsageRequest, CostAndUsageResponse, DateInterval, Granularity, MetricValue,
    ResultByTime, UNBLENDED_COST,
};

/// A source of aggregated spend.
#[async_trait]
pub trait CostReporter: Send + Sync {
    /// Provider name, used in logs.
    fn name(&self) -> &'static str;

    /// Fetch cost and usage for a window.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    async fn get_cost_and_usage(
        &self,
        request: &CostAndUsageRequest,
    ) -> Result<CostAndUsageResponse, AwsError>;
}
