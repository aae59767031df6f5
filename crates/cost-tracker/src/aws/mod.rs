//! Minimal AWS JSON-protocol plumbing.
//!
//! Cost Explorer and DynamoDB both accept `POST /` with an `X-Amz-Target`
//! header naming the operation and a JSON body, signed with SigV4.
//! [`AwsJsonClient`] does exactly that and nothing more.

mod client;
pub mod sigv4;

pub use client::{AwsError, AwsJsonClient, ServiceSpec};
pub use sigv4::{SigV4Signer, SigningTime};
