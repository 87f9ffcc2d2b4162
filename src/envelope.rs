use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Table tag carried by every order message.
pub const ORDERS_TABLE: &str = "orders";

/// Wire envelope for one raw order record as published by a producer.
///
/// The `data` mapping carries whatever field names the upstream source uses;
/// reconciling them is the normalizer's job, not the envelope's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default = "unknown_source")]
    pub source: String,
    #[serde(default = "orders_table")]
    pub table: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

fn unknown_source() -> String {
    "unknown".to_string()
}

fn orders_table() -> String {
    ORDERS_TABLE.to_string()
}

impl RawMessage {
    pub fn new(source: &str, data: HashMap<String, String>) -> Self {
        Self {
            source: source.to_string(),
            table: ORDERS_TABLE.to_string(),
            data,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Hex sha256 of a raw payload, used to identify a delivery in logs.
pub fn payload_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
