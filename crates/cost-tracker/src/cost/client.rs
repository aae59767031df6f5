//! Cost Explorer API client.

use async_trait::async_trait;
use tracing::instrument;
use url::Url;

use super::models::{CostAndUsageRequest, CostAndUsageResponse};
use super::CostReporter;
use crate::aws::{AwsError, AwsJsonClient, ServiceSpec};
use crate::config::Config;

/// Cost Explorer is served from a single region.
const COST_EXPLORER_REGION: &str = "us-east-1";
const COST_EXPLORER_ENDPOINT: &str = "https://ce.us-east-1.amazonaws.com/";

const SPEC: ServiceSpec = ServiceSpec {
    signing_name: "ce",
    target_prefix: "AWSInsightsIndexService",
    content_type: "application/x-amz-json-1.1",
};

/// AWS Cost Explorer provider.
#[derive(Debug, Clone)]
pub struct CostExplorerClient {
    client: AwsJsonClient,
}

impl CostExplorerClient {
    /// Create a client from configuration, honouring the endpoint override.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or signer cannot be created.
    pub fn new(config: &Config) -> Result<Self, AwsError> {
        let endpoint = match &config.cost_explorer_endpoint {
            Some(url) => url.clone(),
            None => Url::parse(COST_EXPLORER_ENDPOINT)
                .map_err(|e| AwsError::Signing(format!("bad default endpoint: {e}")))?,
        };
        let client = AwsJsonClient::new(
            SPEC,
            endpoint,
            COST_EXPLORER_REGION,
            config.credentials.clone(),
        )?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CostReporter for CostExplorerClient {
    fn name(&self) -> &'static str {
        "cost-explorer"
    }

    #[instrument(skip(self), fields(provider = "cost-explorer"))]
    async fn get_cost_and_usage(
        &self,
        request: &CostAndUsageRequest,
    ) -> Result<CostAndUsageResponse, AwsError> {
        self.client.call("GetCostAndUsage", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AwsCredentials;
    use crate::cost::models::UNBLENDED_COST;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        Config {
            table_name: "cost-logs".to_string(),
            region: "eu-west-1".to_string(),
            credentials: AwsCredentials::new("AKIDEXAMPLE", "secret"),
            cost_explorer_endpoint: Some(Url::parse(&server.uri()).unwrap()),
            dynamodb_endpoint: None,
            log_format: crate::config::LogFormat::Json,
        }
    }

    #[tokio::test]
    async fn test_get_cost_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header(
                "x-amz-target",
                "AWSInsightsIndexService.GetCostAndUsage",
            ))
            .and(header("content-type", "application/x-amz-json-1.1"))
            .and(body_json(json!({
                "TimePeriod": {"Start": "2024-01-01", "End": "2024-01-02"},
                "Granularity": "DAILY",
                "Metrics": ["UnblendedCost"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ResultsByTime": [{
                    "TimePeriod": {"Start": "2024-01-01", "End": "2024-01-02"},
                    "Total": {"UnblendedCost": {"Amount": "4.56", "Unit": "USD"}},
                    "Estimated": false
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CostExplorerClient::new(&config_for(&server)).unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let response = client
            .get_cost_and_usage(&CostAndUsageRequest::previous_day(now))
            .await
            .unwrap();

        assert_eq!(
            response.results_by_time[0].total[UNBLENDED_COST]
                .amount
                .as_deref(),
            Some("4.56")
        );
    }

    #[tokio::test]
    async fn test_signs_for_us_east_1_regardless_of_region() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ResultsByTime": []})))
            .mount(&server)
            .await;

        let client = CostExplorerClient::new(&config_for(&server)).unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        client
            .get_cost_and_usage(&CostAndUsageRequest::previous_day(now))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let auth = requests[0]
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(auth.contains("/us-east-1/ce/aws4_request"));
    }

    #[tokio::test]
    async fn test_access_denied_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "AccessDeniedException",
                "Message": "User is not authorized to perform: ce:GetCostAndUsage"
            })))
            .mount(&server)
            .await;

        let client = CostExplorerClient::new(&config_for(&server)).unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let err = client
            .get_cost_and_usage(&CostAndUsageRequest::previous_day(now))
            .await
            .unwrap_err();
        assert!(matches!(err, AwsError::Api { ref code, .. } if code == "AccessDeniedException"));
    }
}
