//! Remote operations and the requests that invoke them

use std::fmt;

use serde_json::{Value, json};

use crate::classify::{ClassifiedQuery, QueryKind};
use crate::config::AddressType;

/// Decoded response payload, passed upward unmodified
pub type Payload = Value;

/// Remote operations exposed by SPAS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Free-text address search
    SearchByText,
    /// Lookup by internal numeric id
    ById,
    /// Lookup by global identifier
    ByGlobalId,
    /// Lookup by cadastral number
    ByCadastral,
    /// Autocomplete suggestions
    Hints,
    /// Extended attributes of a resolved address
    Details,
    /// Top-level administrative regions
    Regions,
}

impl Operation {
    /// Operation serving a classified lookup
    pub fn for_kind(kind: QueryKind) -> Self {
        match kind {
            QueryKind::ById => Operation::ById,
            QueryKind::ByGlobalId => Operation::ByGlobalId,
            QueryKind::ByCadastral => Operation::ByCadastral,
            QueryKind::ByFreeText => Operation::SearchByText,
        }
    }

    /// Endpoint path relative to the base URL
    pub fn path(self) -> &'static str {
        match self {
            Operation::SearchByText => "SearchAddressItem",
            Operation::ById => "GetAddressItemById",
            Operation::ByGlobalId => "GetAddressItemByGuid",
            Operation::ByCadastral => "GetAddressItemByCadastralNumber",
            Operation::Hints => "GetAddressHint",
            Operation::Details => "GetDetails",
            Operation::Regions => "GetRegions",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Operation::Hints => Method::Post,
            _ => Method::Get,
        }
    }

    /// Query parameter carrying the lookup key
    fn key_param(self) -> Option<&'static str> {
        match self {
            Operation::SearchByText => Some("search_string"),
            Operation::ById | Operation::Details => Some("object_id"),
            Operation::ByGlobalId => Some("object_guid"),
            Operation::ByCadastral => Some("cadastral_number"),
            Operation::Hints | Operation::Regions => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// HTTP method of a remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request to the remote service
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Operation being invoked
    pub operation: Operation,
    /// HTTP method
    pub method: Method,
    /// Query string parameters, in order
    pub params: Vec<(String, String)>,
    /// JSON body for POST operations
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            method: operation.method(),
            params: Vec::new(),
            body: None,
        }
    }

    fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    /// Lookup matching the classified kind of the query
    pub fn lookup(query: &ClassifiedQuery, address_type: AddressType) -> Self {
        let operation = Operation::for_kind(query.kind());
        let mut request = Self::new(operation);
        if let Some(name) = operation.key_param() {
            request = request.param(name, query.key());
        }
        request.param("address_type", address_type.code().to_string())
    }

    /// Autocomplete request for partial text
    pub fn hints(query: &ClassifiedQuery, address_type: AddressType) -> Self {
        let mut request = Self::new(Operation::Hints);
        request.body = Some(json!({
            "search_string": query.key(),
            "address_type": address_type.code(),
        }));
        request
    }

    /// Extended attributes of an address by internal id
    pub fn details(object_id: i64, address_type: AddressType) -> Self {
        Self::new(Operation::Details)
            .param("object_id", object_id.to_string())
            .param("address_type", address_type.code().to_string())
    }

    /// Region enumeration, no key
    pub fn regions() -> Self {
        Self::new(Operation::Regions)
    }

    /// Value of a query parameter
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}
