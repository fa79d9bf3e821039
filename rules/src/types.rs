use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP status codes accepted by the bulk redirect store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum RedirectCode {
    /// 301. Also what the store assumes when an item omits its status.
    #[default]
    MovedPermanently,
    /// 302
    Found,
    /// 307
    TemporaryRedirect,
    /// 308
    PermanentRedirect,
}

impl RedirectCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            RedirectCode::MovedPermanently => 301,
            RedirectCode::Found => 302,
            RedirectCode::TemporaryRedirect => 307,
            RedirectCode::PermanentRedirect => 308,
        }
    }

    pub const fn from_u16(code: u16) -> Option<Self> {
        match code {
            301 => Some(RedirectCode::MovedPermanently),
            302 => Some(RedirectCode::Found),
            307 => Some(RedirectCode::TemporaryRedirect),
            308 => Some(RedirectCode::PermanentRedirect),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unsupported redirect status code: {0}")]
pub struct InvalidRedirectCode(pub u16);

impl TryFrom<u16> for RedirectCode {
    type Error = InvalidRedirectCode;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        RedirectCode::from_u16(code).ok_or(InvalidRedirectCode(code))
    }
}

impl From<RedirectCode> for u16 {
    fn from(code: RedirectCode) -> Self {
        code.as_u16()
    }
}

impl fmt::Display for RedirectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// A single spreadsheet cell, kept in the JSON type the sheet returned it as.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Values a spreadsheet user would consider "not filled in".
    pub fn is_falsy(&self) -> bool {
        match self {
            CellValue::Bool(b) => !b,
            CellValue::Integer(n) => *n == 0,
            CellValue::Float(n) => *n == 0.0 || n.is_nan(),
            CellValue::Text(s) => s.is_empty(),
        }
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Integer(n) => write!(f, "{n}"),
            CellValue::Float(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Integer(n)
    }
}

/// An untyped redirect row as it came out of the spreadsheet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RawRow {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        RawRow {
            source: source.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }
}

/// A validated and sanitized redirect, before locale expansion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub source: String,
    pub destination: String,
    pub code: RedirectCode,
    pub localized: bool,
    pub deleted: bool,
    pub description: String,
}

/// The redirect itself as the rules list API stores it. Both URLs are
/// absolute (or carry their own scheme).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectDetails {
    pub source_url: String,
    pub target_url: String,
    #[serde(default)]
    pub status_code: RedirectCode,
}

/// One entry of a bulk redirect list. The store wraps every redirect in an
/// object alongside metadata we never write ourselves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRuleItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub redirect: RedirectDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,
}

impl PublishedRuleItem {
    pub fn new(
        source_url: impl Into<String>,
        target_url: impl Into<String>,
        status_code: RedirectCode,
    ) -> Self {
        RedirectDetails {
            source_url: source_url.into(),
            target_url: target_url.into(),
            status_code,
        }
        .into()
    }
}

impl From<RedirectDetails> for PublishedRuleItem {
    fn from(redirect: RedirectDetails) -> Self {
        PublishedRuleItem {
            id: None,
            redirect,
            created_on: None,
            modified_on: None,
        }
    }
}
