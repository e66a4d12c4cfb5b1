//! Result models
//!
//! Thin, lenient views over SPAS payloads. Every field the service may omit is
//! optional, and fields not modelled here are kept in `extra`, so a schema
//! change on the remote side degrades to missing values rather than errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::request::Payload;

/// One resolved address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressItem {
    /// Internal numeric identifier
    pub object_id: i64,
    #[serde(default)]
    pub object_guid: Option<String>,
    #[serde(default)]
    pub object_level_id: Option<i32>,
    #[serde(default)]
    pub full_name: String,
    /// Name of the object itself, without its parents
    #[serde(default)]
    pub short_name: Option<String>,
    /// Hierarchy level, e.g. "Город" or "Улица"
    #[serde(default)]
    pub level_name: Option<String>,
    #[serde(default)]
    pub region_code: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub address_details: Option<AddressDetails>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AddressItem {
    fn detail(&self, pick: impl Fn(&AddressDetails) -> &Option<String>) -> Option<&str> {
        self.address_details.as_ref().and_then(|d| pick(d).as_deref())
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.detail(|d| &d.postal_code)
    }

    pub fn oktmo(&self) -> Option<&str> {
        self.detail(|d| &d.oktmo)
    }

    pub fn okato(&self) -> Option<&str> {
        self.detail(|d| &d.okato)
    }

    pub fn kladr_code(&self) -> Option<&str> {
        self.detail(|d| &d.kladr_code)
    }

    pub fn cadastral_number(&self) -> Option<&str> {
        self.detail(|d| &d.cadastral_number)
    }

    /// Tax office for legal entities
    pub fn ifns_ul(&self) -> Option<&str> {
        self.detail(|d| &d.ifns_ul)
    }

    /// Tax office for individuals
    pub fn ifns_fl(&self) -> Option<&str> {
        self.detail(|d| &d.ifns_fl)
    }
}

/// Extended attributes of an address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressDetails {
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Tax office for legal entities
    #[serde(default)]
    pub ifns_ul: Option<String>,
    /// Tax office for individuals
    #[serde(default)]
    pub ifns_fl: Option<String>,
    #[serde(default)]
    pub okato: Option<String>,
    #[serde(default)]
    pub oktmo: Option<String>,
    #[serde(default)]
    pub kladr_code: Option<String>,
    #[serde(default)]
    pub cadastral_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHint {
    #[serde(default)]
    pub object_id: Option<i64>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Top-level administrative region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub object_id: Option<i64>,
    #[serde(default)]
    pub region_code: Option<i32>,
    #[serde(default)]
    pub full_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Items of a list payload
///
/// Accepts a bare array or an object holding the array under `field`.
pub fn list_items(payload: &Payload, field: &str) -> Vec<Payload> {
    match payload {
        Value::Array(items) => items.clone(),
        Value::Object(map) => match map.get(field) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Whether a lookup payload holds at least one address
pub fn has_addresses(payload: &Payload) -> bool {
    match payload {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => match map.get("addresses") {
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => false,
            None => !map.is_empty(),
        },
        _ => false,
    }
}

/// Decode the first address of a lookup payload
pub fn first_address(payload: &Payload) -> Result<Option<AddressItem>> {
    let candidate = match payload {
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) if !map.contains_key("addresses") => Some(payload.clone()),
        _ => list_items(payload, "addresses").into_iter().next(),
    };

    match candidate {
        Some(item) => Ok(Some(serde_json::from_value(item)?)),
        None => Ok(None),
    }
}

/// Decode a details payload, unwrapping `address_details` when present
pub fn details_from(payload: &Payload) -> Result<AddressDetails> {
    let inner = payload.get("address_details").unwrap_or(payload);
    Ok(serde_json::from_value(inner.clone())?)
}
