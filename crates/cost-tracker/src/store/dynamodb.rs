//! DynamoDB-backed store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{CostRecord, CostStore};
use crate::aws::{AwsError, AwsJsonClient, ServiceSpec};
use crate::config::Config;
use crate::error::{Error, Result};

const SPEC: ServiceSpec = ServiceSpec {
    signing_name: "dynamodb",
    target_prefix: "DynamoDB_20120810",
    content_type: "application/x-amz-json-1.0",
};

const ATTR_TIMESTAMP: &str = "Timestamp";
const ATTR_COST: &str = "Cost";

/// A DynamoDB attribute value in its tagged JSON form, e.g. `{"S": "1.23"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    S(String),
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "B")]
    B(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(Vec<String>),
    #[serde(rename = "M")]
    M(HashMap<String, AttributeValue>),
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
}

impl AttributeValue {
    /// The scalar text of an `S` or `N` value.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::S(s) | Self::N(s) => Some(s),
            _ => None,
        }
    }
}

/// A DynamoDB item.
pub type Item = HashMap<String, AttributeValue>;

impl From<&CostRecord> for Item {
    fn from(record: &CostRecord) -> Self {
        let mut item = Item::new();
        item.insert(
            ATTR_TIMESTAMP.to_string(),
            AttributeValue::S(record.timestamp.clone()),
        );
        if let Some(cost) = &record.cost {
            item.insert(ATTR_COST.to_string(), AttributeValue::S(cost.clone()));
        }
        item
    }
}

impl TryFrom<Item> for CostRecord {
    type Error = Error;

    fn try_from(mut item: Item) -> Result<Self> {
        let timestamp = match item.remove(ATTR_TIMESTAMP) {
            Some(AttributeValue::S(s)) => s,
            Some(other) => {
                return Err(Error::InvalidRecord(format!(
                    "{ATTR_TIMESTAMP} must be a string, got {other:?}"
                )))
            }
            None => {
                return Err(Error::InvalidRecord(format!(
                    "item has no {ATTR_TIMESTAMP} attribute"
                )))
            }
        };
        // Non-scalar costs render as absent.
        let cost = item
            .get(ATTR_COST)
            .and_then(AttributeValue::as_scalar)
            .map(str::to_string);
        Ok(Self { timestamp, cost })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutItemInput<'a> {
    table_name: &'a str,
    item: Item,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ScanInput<'a> {
    table_name: &'a str,
    limit: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScanOutput {
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    last_evaluated_key: Option<Item>,
}

/// Cost records in a DynamoDB table keyed by `Timestamp`.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: AwsJsonClient,
    table_name: String,
}

impl DynamoDbStore {
    /// Create a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or signer cannot be created.
    pub fn new(config: &Config) -> std::result::Result<Self, AwsError> {
        let endpoint = match &config.dynamodb_endpoint {
            Some(url) => url.clone(),
            None => Url::parse(&format!("https://dynamodb.{}.amazonaws.com/", config.region))
                .map_err(|e| AwsError::Signing(format!("bad region `{}`: {e}", config.region)))?,
        };
        let client =
            AwsJsonClient::new(SPEC, endpoint, &config.region, config.credentials.clone())?;
        Ok(Self {
            client,
            table_name: config.table_name.clone(),
        })
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl CostStore for DynamoDbStore {
    #[instrument(skip(self, record), fields(timestamp = %record.timestamp))]
    async fn put(&self, record: &CostRecord) -> Result<()> {
        let input = PutItemInput {
            table_name: &self.table_name,
            item: Item::from(record),
        };
        let _: IgnoredAny = self.client.call("PutItem", &input).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn scan(&self, limit: usize) -> Result<Vec<CostRecord>> {
        let input = ScanInput {
            table_name: &self.table_name,
            limit: i32::try_from(limit).unwrap_or(i32::MAX),
        };
        let output: ScanOutput = self.client.call("Scan", &input).await?;
        debug!(
            items = output.items.len(),
            truncated = output.last_evaluated_key.is_some(),
            "Scanned cost records"
        );
        output
            .items
            .into_iter()
            .take(limit)
            .map(CostRecord::try_from)
            .collect()
    }
}
