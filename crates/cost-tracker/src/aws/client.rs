//! Signed AWS JSON-protocol client.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::sigv4::{SigV4Signer, SigningTime};
use crate::config::AwsCredentials;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors from an AWS API call.
#[derive(Error, Debug)]
pub enum AwsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("AWS API error: {status} {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request could not be signed.
    #[error("Signing error: {0}")]
    Signing(String),
}

/// Static description of one AWS JSON service.
#[derive(Debug, Clone, Copy)]
pub struct ServiceSpec {
    /// SigV4 signing name, e.g. `dynamodb`.
    pub signing_name: &'static str,
    /// Prefix of the `X-Amz-Target` header, e.g. `DynamoDB_20120810`.
    pub target_prefix: &'static str,
    /// `application/x-amz-json-1.0` or `-1.1`.
    pub content_type: &'static str,
}

/// Error body returned by AWS JSON services.
#[derive(Debug, Deserialize)]
struct AwsErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

/// A client bound to one service endpoint.
#[derive(Debug, Clone)]
pub struct AwsJsonClient {
    client: Client,
    signer: SigV4Signer,
    endpoint: Url,
    spec: ServiceSpec,
}

impl AwsJsonClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the signer is incomplete or the HTTP client
    /// cannot be built.
    pub fn new(
        spec: ServiceSpec,
        endpoint: Url,
        region: impl Into<String>,
        credentials: AwsCredentials,
    ) -> Result<Self, AwsError> {
        let signer = SigV4Signer::new(credentials, region, spec.signing_name)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("cost-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            signer,
            endpoint,
            spec,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Invoke `operation` with `input` and decode the output.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or an
    /// output body that does not decode into `T`.
    pub async fn call<I, T>(&self, operation: &str, input: &I) -> Result<T, AwsError>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(input)?;
        let target = format!("{}.{operation}", self.spec.target_prefix);

        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), self.spec.content_type.to_string());
        headers.insert("x-amz-target".to_string(), target.clone());

        let signature = self.signer.sign(
            "POST",
            &self.endpoint,
            &headers,
            &body,
            &SigningTime::now(),
        )?;

        debug!(
            service = self.spec.signing_name,
            target = %target,
            endpoint = %self.endpoint,
            "AWS request"
        );

        let mut request = self.client.post(self.endpoint.clone());
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = signature.headers.apply(request).body(body).send().await?;

        Self::handle_response(response).await
    }

    /// Handle API response.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AwsError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse AWS response");
                AwsError::Serialization(e)
            });
        }

        Err(Self::api_error(status, &text))
    }

    fn api_error(status: StatusCode, text: &str) -> AwsError {
        match serde_json::from_str::<AwsErrorBody>(text) {
            Ok(body) => AwsError::Api {
                status: status.as_u16(),
                code: body
                    .error_type
                    .as_deref()
                    .map(short_error_code)
                    .unwrap_or_default()
                    .to_string(),
                message: body.message.unwrap_or_default(),
            },
            Err(_) => AwsError::Api {
                status: status.as_u16(),
                code: String::new(),
                message: text.to_string(),
            },
        }
    }
}

/// `com.amazonaws.dynamodb.v20120810#ResourceNotFoundException` becomes
/// `ResourceNotFoundException`.
fn short_error_code(raw: &str) -> &str {
    raw.rsplit('#').next().unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SPEC: ServiceSpec = ServiceSpec {
        signing_name: "dynamodb",
        target_prefix: "DynamoDB_20120810",
        content_type: "application/x-amz-json-1.0",
    };

    fn client_for(server: &MockServer) -> AwsJsonClient {
        AwsJsonClient::new(
            SPEC,
            Url::parse(&server.uri()).unwrap(),
            "us-east-1",
            AwsCredentials::new("AKIDEXAMPLE", "secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_short_error_code() {
        assert_eq!(
            short_error_code("com.amazonaws.dynamodb.v20120810#ResourceNotFoundException"),
            "ResourceNotFoundException"
        );
        assert_eq!(short_error_code("ValidationException"), "ValidationException");
    }

    #[tokio::test]
    async fn test_call_sends_signed_target_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-amz-target", "DynamoDB_20120810.Scan"))
            .and(header("content-type", "application/x-amz-json-1.0"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Count": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let out: Value = client_for(&server)
            .call("Scan", &json!({"TableName": "t"}))
            .await
            .unwrap();
        assert_eq!(out["Count"], 0);

        let requests = server.received_requests().await.unwrap();
        let auth = requests[0]
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
        assert!(auth.contains("/us-east-1/dynamodb/aws4_request"));
        assert!(auth.contains("content-type;host;x-amz-content-sha256;x-amz-date;x-amz-target"));
    }

    #[tokio::test]
    async fn test_api_error_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException",
                "message": "Requested resource not found"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .call::<_, Value>("Scan", &json!({}))
            .await
            .unwrap_err();
        match err {
            AwsError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, "ResourceNotFoundException");
                assert_eq!(message, "Requested resource not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_capitalized_message_and_plain_text_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "DynamoDB_20120810.PutItem"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "__type": "UnrecognizedClientException",
                "Message": "The security token included in the request is invalid."
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "DynamoDB_20120810.Scan"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .call::<_, Value>("PutItem", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AwsError::Api { status: 403, ref code, ref message }
                if code == "UnrecognizedClientException" && message.contains("security token")
        ));

        let err = client.call::<_, Value>("Scan", &json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            AwsError::Api { status: 503, ref message, .. } if message == "Service Unavailable"
        ));
    }

    #[tokio::test]
    async fn test_undecodable_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .call::<_, Value>("Scan", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AwsError::Serialization(_)));
    }
}
