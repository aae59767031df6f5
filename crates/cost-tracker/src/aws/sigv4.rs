//! AWS Signature Version 4 request signing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use super::AwsError;
use crate::config::AwsCredentials;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Date strings used in a signature scope.
#[derive(Debug, Clone)]
pub struct SigningTime {
    /// `YYYYMMDDTHHMMSSZ`
    pub amz_date: String,
    /// `YYYYMMDD`
    pub date: String,
}

impl SigningTime {
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    #[must_use]
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self {
            amz_date: datetime.format("%Y%m%dT%H%M%SZ").to_string(),
            date: datetime.format("%Y%m%d").to_string(),
        }
    }
}

/// Headers to attach to a signed request.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: String,
    pub security_token: Option<String>,
}

impl SignedHeaders {
    /// Attach the signature headers to a request builder.
    pub fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req
            .header("authorization", &self.authorization)
            .header("x-amz-date", &self.amz_date)
            .header("x-amz-content-sha256", &self.content_sha256);
        match &self.security_token {
            Some(token) => req.header("x-amz-security-token", token),
            None => req,
        }
    }
}

/// Signature output, including the intermediate strings for debugging.
#[derive(Debug, Clone)]
pub struct Signature {
    pub headers: SignedHeaders,
    pub canonical_request: String,
    pub string_to_sign: String,
}

/// Signs requests for one service in one region.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: AwsCredentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    /// Create a signer.
    ///
    /// # Errors
    ///
    /// Returns an error if any component is empty.
    pub fn new(
        credentials: AwsCredentials,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Result<Self, AwsError> {
        let region = region.into();
        let service = service.into();

        if credentials.access_key_id.trim().is_empty() {
            return Err(AwsError::Signing("access key id is required".to_string()));
        }
        if credentials.secret_access_key.trim().is_empty() {
            return Err(AwsError::Signing("secret access key is required".to_string()));
        }
        if region.trim().is_empty() {
            return Err(AwsError::Signing("region is required".to_string()));
        }
        if service.trim().is_empty() {
            return Err(AwsError::Signing("service is required".to_string()));
        }

        Ok(Self {
            credentials,
            region,
            service,
        })
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Sign a request.
    ///
    /// `headers` are the caller's own headers; `host`, `x-amz-date`,
    /// `x-amz-content-sha256` and the session token are added here.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL has no host.
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &BTreeMap<String, String>,
        payload: &[u8],
        time: &SigningTime,
    ) -> Result<Signature, AwsError> {
        let host = url
            .host_str()
            .ok_or_else(|| AwsError::Signing(format!("url `{url}` has no host")))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let payload_hash = sha256_hex(payload);
        let mut canonical = BTreeMap::new();
        for (name, value) in headers {
            canonical.insert(name.trim().to_ascii_lowercase(), normalize_value(value));
        }
        canonical.insert("host".to_string(), host);
        canonical.insert("x-amz-date".to_string(), time.amz_date.clone());
        canonical.insert("x-amz-content-sha256".to_string(), payload_hash.clone());
        if let Some(token) = &self.credentials.session_token {
            canonical.insert("x-amz-security-token".to_string(), normalize_value(token));
        }

        let canonical_headers: String = canonical
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();
        let signed_headers = canonical.keys().cloned().collect::<Vec<_>>().join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method.to_ascii_uppercase(),
            canonical_uri(url),
            canonical_query(url),
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let scope = format!(
            "{}/{}/{}/aws4_request",
            time.date, self.region, self.service
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{}\n{}\n{}",
            time.amz_date,
            scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let signature = hex::encode(hmac_sha256(
            &self.signing_key(&time.date)?,
            string_to_sign.as_bytes(),
        )?);
        let authorization = format!(
            "{ALGORITHM} Credential={}/{}, SignedHeaders={}, Signature={}",
            self.credentials.access_key_id, scope, signed_headers, signature
        );

        Ok(Signature {
            headers: SignedHeaders {
                authorization,
                amz_date: time.amz_date.clone(),
                content_sha256: payload_hash,
                security_token: self.credentials.session_token.clone(),
            },
            canonical_request,
            string_to_sign,
        })
    }

    fn signing_key(&self, date: &str) -> Result<Vec<u8>, AwsError> {
        let secret = format!("AWS4{}", self.credentials.secret_access_key);
        let k_date = hmac_sha256(secret.as_bytes(), date.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, self.service.as_bytes())?;
        hmac_sha256(&k_service, b"aws4_request")
    }
}

fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        "/".to_string()
    } else {
        percent_encode(path, false)
    }
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (percent_encode(&k, true), percent_encode(&v, true)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(value: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for &byte in value.as_bytes() {
        let unreserved =
            matches!(byte, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~');
        if unreserved || (!encode_slash && byte == b'/') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

// Collapse runs of whitespace and trim, as SigV4 requires.
fn normalize_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AwsError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AwsError::Signing(format!("invalid hmac key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
