//! JSON bodies returned by every endpoint.
//!
//! ```json
//! {
//!   "success": true,
//!   "errors": [],
//!   "messages": ["There are 2 rules to add (in spreadsheet but not published)."],
//!   "addedRules": [...],
//!   "removedRules": [...]
//! }
//! ```

use rules::{PublishedRuleItem, RawRow, Rule};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Common response wrapper. Endpoint specific fields are flattened in.
///
/// `errors` and `messages` hold plain strings for anything produced here and
/// the original objects for anything relayed from the upstream APIs.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    /// `None` is serialized as `null`: the outcome is unknown.
    pub success: Option<bool>,
    pub errors: Vec<JsonValue>,
    pub messages: Vec<JsonValue>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            success: Some(true),
            errors: Vec::new(),
            messages: Vec::new(),
            body,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(JsonValue::String(message.into()));
        self
    }
}

impl Envelope<NoPayload> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            errors: vec![JsonValue::String(error.into())],
            messages: Vec::new(),
            body: NoPayload {},
        }
    }

    pub fn from_status(status: Status) -> Self {
        Self {
            success: Some(status.success),
            errors: status.errors,
            messages: status.messages,
            body: NoPayload {},
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NoPayload {}

/// Body of `GET /`. Carries no outcome, only a greeting.
#[derive(Debug, Clone, Serialize)]
pub struct Hello {
    pub messages: Vec<String>,
}

/// Reachability report from one of the upstream APIs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    pub success: bool,
    pub errors: Vec<JsonValue>,
    pub messages: Vec<JsonValue>,
}

impl Status {
    /// Both sides must be healthy; errors and messages are concatenated.
    pub fn merge(self, other: Status) -> Status {
        let mut errors = self.errors;
        errors.extend(other.errors);
        let mut messages = self.messages;
        messages.extend(other.messages);

        Status {
            success: self.success && other.success,
            errors,
            messages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPayload {
    pub input_rows: Vec<Rule>,
    pub invalid_rules: Vec<RawRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffPayload {
    pub added_rules: Vec<PublishedRuleItem>,
    pub removed_rules: Vec<PublishedRuleItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadOutcome {
    Succeeded,
    Failed,
    Unknown,
}

impl UploadOutcome {
    pub fn from_api_flag(success: Option<bool>) -> Self {
        match success {
            Some(true) => UploadOutcome::Succeeded,
            Some(false) => UploadOutcome::Failed,
            None => UploadOutcome::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadOutcome::Succeeded => "succeeded",
            UploadOutcome::Failed => "failed",
            UploadOutcome::Unknown => "unknown",
        }
    }

    pub fn as_success(self) -> Option<bool> {
        match self {
            UploadOutcome::Succeeded => Some(true),
            UploadOutcome::Failed => Some(false),
            UploadOutcome::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPayload {
    pub outcome: UploadOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Uploaded items the store rejected, matched back by index.
    pub invalid_rules: Vec<PublishedRuleItem>,
}
