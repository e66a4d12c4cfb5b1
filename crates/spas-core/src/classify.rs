//! Query classification
//!
//! Maps raw caller input onto the remote lookup it targets. Rules are tried
//! in order and the first match wins:
//!
//! 1. integer, or a string of digits with an optional sign → [`QueryKind::ById`]
//! 2. `8-4-4-4-12` hexadecimal identifier → [`QueryKind::ByGlobalId`]
//! 3. `DD:DD:DDDDDDD:D` cadastral number → [`QueryKind::ByCadastral`]
//! 4. anything else → [`QueryKind::ByFreeText`]
//!
//! Classification never fails and performs no I/O. Input the service does not
//! recognize is still sent as free text; the service decides whether it exists.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("valid id pattern"));

static GLOBAL_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid global id pattern")
});

static CADASTRAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}:[0-9]{2}:[0-9]{6,7}:[0-9]+$").expect("valid cadastral pattern")
});

/// Raw caller input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Textual input of any shape
    Text(String),
    /// Numeric identifier
    Id(i64),
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Text(text) => f.write_str(text),
            Query::Id(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Query::Text(text.to_string())
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Query::Text(text)
    }
}

impl From<&String> for Query {
    fn from(text: &String) -> Self {
        Query::Text(text.clone())
    }
}

impl From<i64> for Query {
    fn from(id: i64) -> Self {
        Query::Id(id)
    }
}

impl From<i32> for Query {
    fn from(id: i32) -> Self {
        Query::Id(id.into())
    }
}

impl From<u32> for Query {
    fn from(id: u32) -> Self {
        Query::Id(id.into())
    }
}

/// Remote lookup a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    ById,
    ByGlobalId,
    ByCadastral,
    ByFreeText,
}

/// A query paired with the lookup it targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedQuery {
    kind: QueryKind,
    key: String,
    raw: Query,
}

impl ClassifiedQuery {
    /// Treat the input as free text regardless of its shape
    ///
    /// Used for autocomplete, where partial input is always textual.
    pub fn free_text(raw: impl Into<Query>) -> Self {
        let raw = raw.into();
        let key = match &raw {
            Query::Text(text) => text.trim().to_string(),
            Query::Id(id) => id.to_string(),
        };
        Self {
            kind: QueryKind::ByFreeText,
            key,
            raw,
        }
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Normalized lookup key sent to the service
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Input exactly as the caller supplied it
    pub fn raw(&self) -> &Query {
        &self.raw
    }

    /// Whether the lookup key is empty after normalization
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

/// Classify raw input
///
/// # Examples
///
/// ```
/// use spas_core::classify::{classify, QueryKind};
///
/// assert_eq!(classify(123456).kind(), QueryKind::ById);
/// assert_eq!(classify("77:01:0001001:1").kind(), QueryKind::ByCadastral);
/// assert_eq!(classify(" Москва, Тверская 1 ").key(), "Москва, Тверская 1");
/// ```
pub fn classify(raw: impl Into<Query>) -> ClassifiedQuery {
    let raw = raw.into();

    let (kind, key) = match &raw {
        Query::Id(id) => (QueryKind::ById, id.to_string()),
        Query::Text(text) => {
            let trimmed = text.trim();
            if ID_PATTERN.is_match(trimmed) {
                (QueryKind::ById, normalize_id(trimmed))
            } else if GLOBAL_ID_PATTERN.is_match(trimmed) {
                (QueryKind::ByGlobalId, trimmed.to_ascii_lowercase())
            } else if CADASTRAL_PATTERN.is_match(trimmed) {
                (QueryKind::ByCadastral, trimmed.to_string())
            } else {
                (QueryKind::ByFreeText, trimmed.to_string())
            }
        }
    };

    ClassifiedQuery { kind, key, raw }
}

// "+0042" -> "42", "-7" -> "-7"
fn normalize_id(digits: &str) -> String {
    let (sign, body) = match digits.as_bytes()[0] {
        b'-' => ("-", &digits[1..]),
        b'+' => ("", &digits[1..]),
        _ => ("", digits),
    };
    let body = body.trim_start_matches('0');
    if body.is_empty() {
        "0".to_string()
    } else {
        format!("{}{}", sign, body)
    }
}
