//! Cloudflare Rules Lists API client.
//!
//! The published redirects live in a single bulk redirect list. Publishing
//! replaces every item in it with one PUT.

use crate::APP_NAME;
use crate::config::RulesListConfig;
use crate::envelope::{Status, UploadOutcome};
use async_trait::async_trait;
use rules::PublishedRuleItem;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use url::Url;

/// Upper bound on item pages followed in a single fetch.
const MAX_PAGES: usize = 100;

#[derive(thiserror::Error, Debug)]
pub enum RulesListError {
    #[error("Cloudflare API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Cloudflare API returned {code}, {reason}")]
    Status { code: u16, reason: String },
    #[error("Cloudflare API response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Cloudflare API reported failure")]
    Unsuccessful,
}

/// What the store said about a full-replace upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    pub outcome: UploadOutcome,
    pub errors: Vec<JsonValue>,
    pub messages: Vec<JsonValue>,
    pub operation_id: Option<String>,
    /// Uploaded items named by the store's error objects.
    pub invalid_rules: Vec<PublishedRuleItem>,
}

impl UploadReport {
    fn unknown(error: String) -> Self {
        UploadReport {
            outcome: UploadOutcome::Unknown,
            errors: vec![json!(error)],
            messages: Vec::new(),
            operation_id: None,
            invalid_rules: Vec::new(),
        }
    }
}

/// Where published redirects are stored.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn status(&self) -> Status;

    /// Currently published items. Empty when the store cannot be read.
    async fn fetch_items(&self) -> Vec<PublishedRuleItem>;

    /// Replaces the whole list with `items`.
    async fn upload(&self, items: &[PublishedRuleItem]) -> UploadReport;
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    success: Option<bool>,
    #[serde(default)]
    errors: Vec<JsonValue>,
    #[serde(default)]
    messages: Vec<JsonValue>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Deserialize)]
struct ResultInfo {
    cursors: Option<Cursors>,
}

#[derive(Deserialize)]
struct Cursors {
    after: Option<String>,
}

#[derive(Deserialize)]
struct ListMetadata {
    name: Option<String>,
    num_items: Option<u64>,
    num_referencing_filters: Option<u64>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct UploadResult {
    operation_id: Option<String>,
}

pub struct RulesListClient {
    client: reqwest::Client,
    endpoint: Url,
    account_id: String,
    list_id: String,
    api_token: String,
}

impl RulesListClient {
    pub fn new(config: &RulesListConfig) -> Self {
        RulesListClient {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            account_id: config.account_id.clone(),
            list_id: config.list_id.clone(),
            api_token: config.api_token.clone(),
        }
    }

    fn list_url(&self) -> String {
        format!(
            "{}/accounts/{}/rules/lists/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.account_id,
            self.list_id
        )
    }

    fn items_url(&self) -> String {
        format!("{}/items", self.list_url())
    }

    fn dashboard_url(&self) -> String {
        format!(
            "https://dash.cloudflare.com/{}/configurations/lists/{}",
            self.account_id, self.list_id
        )
    }

    /// Reads a response body as an API envelope. An empty body is an error.
    async fn read_body<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiResponse<T>, RulesListError> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn try_fetch_items(&self) -> Result<Vec<PublishedRuleItem>, RulesListError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut request = self.client.get(self.items_url()).bearer_auth(&self.api_token);
            if let Some(after) = &cursor {
                request = request.query(&[("cursor", after.as_str())]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(RulesListError::Status {
                    code: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or_default().to_string(),
                });
            }

            let page: ApiResponse<Vec<PublishedRuleItem>> = Self::read_body(response).await?;
            if page.success != Some(true) {
                return Err(RulesListError::Unsuccessful);
            }
            items.extend(page.result.unwrap_or_default());

            cursor = page
                .result_info
                .and_then(|info| info.cursors)
                .and_then(|cursors| cursors.after)
                .filter(|after| !after.is_empty());
            if cursor.is_none() {
                return Ok(items);
            }
        }

        tracing::warn!(
            pages = MAX_PAGES,
            items = items.len(),
            "Stopped following rule list pages"
        );
        Ok(items)
    }

    async fn update_description(&self) -> Result<(), RulesListError> {
        let description = format!(
            "Updated by {} on {}",
            APP_NAME,
            chrono::Utc::now().to_rfc2822()
        );
        let response = self
            .client
            .put(self.list_url())
            .bearer_auth(&self.api_token)
            .json(&json!({ "description": description }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RulesListError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RuleStore for RulesListClient {
    async fn status(&self) -> Status {
        let mut messages = vec![json!(format!(
            "Cloudflare Rules List URL {}",
            self.dashboard_url()
        ))];

        let response = match self
            .client
            .get(self.list_url())
            .bearer_auth(&self.api_token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Cloudflare list status check failed");
                return Status {
                    success: false,
                    errors: vec![json!(RulesListError::from(e).to_string())],
                    messages,
                };
            }
        };

        let http_status = response.status();
        let payload = match Self::read_body::<ListMetadata>(response).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Cloudflare list status unreadable");
                ApiResponse {
                    success: None,
                    errors: vec![json!(e.to_string())],
                    messages: Vec::new(),
                    result: None,
                    result_info: None,
                }
            }
        };

        if let Some(list) = &payload.result {
            messages.push(json!(format!(
                "Cloudflare list {} contains {} rules and referenced by {} filters.",
                list.name.as_deref().unwrap_or_default(),
                list.num_items.unwrap_or_default(),
                list.num_referencing_filters.unwrap_or_default()
            )));
            messages.push(json!(format!(
                "Cloudflare list description: {}",
                list.description.as_deref().unwrap_or_default()
            )));
        }
        messages.extend(payload.messages);

        let mut errors = Vec::new();
        if !http_status.is_success() {
            errors.push(json!(
                RulesListError::Status {
                    code: http_status.as_u16(),
                    reason: http_status.canonical_reason().unwrap_or_default().to_string(),
                }
                .to_string()
            ));
        }
        errors.extend(payload.errors);

        Status {
            success: http_status.is_success() && payload.success == Some(true),
            errors,
            messages,
        }
    }

    async fn fetch_items(&self) -> Vec<PublishedRuleItem> {
        match self.try_fetch_items().await {
            Ok(items) => {
                tracing::debug!(items = items.len(), "Fetched published rules");
                items
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read published rules, assuming none");
                Vec::new()
            }
        }
    }

    async fn upload(&self, items: &[PublishedRuleItem]) -> UploadReport {
        let response = match self
            .client
            .put(self.items_url())
            .bearer_auth(&self.api_token)
            .json(items)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Rule list upload failed");
                return UploadReport::unknown(RulesListError::from(e).to_string());
            }
        };

        let http_status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return UploadReport::unknown(RulesListError::from(e).to_string()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return UploadReport::unknown(format!(
                "Cloudflare API returned an empty response ({http_status}), upload outcome unknown"
            ));
        }
        let payload: ApiResponse<UploadResult> = match serde_json::from_slice(&bytes) {
            Ok(payload) => payload,
            Err(e) => {
                return UploadReport::unknown(format!(
                    "Cloudflare API returned an unreadable response ({http_status}), upload outcome unknown: {e}"
                ));
            }
        };

        let mut outcome = UploadOutcome::from_api_flag(payload.success);
        let mut errors = Vec::new();
        if !http_status.is_success() {
            if outcome == UploadOutcome::Unknown {
                outcome = UploadOutcome::Failed;
            }
            errors.push(json!(
                RulesListError::Status {
                    code: http_status.as_u16(),
                    reason: http_status.canonical_reason().unwrap_or_default().to_string(),
                }
                .to_string()
            ));
        }

        let invalid_rules: Vec<PublishedRuleItem> = payload
            .errors
            .iter()
            .filter_map(|error| error.pointer("/source/parameter_value_index"))
            .filter_map(JsonValue::as_u64)
            .filter_map(|index| items.get(usize::try_from(index).ok()?).cloned())
            .collect();

        let has_api_errors = !payload.errors.is_empty();
        errors.extend(payload.errors);
        let mut messages = payload.messages;
        let operation_id = payload.result.and_then(|result| result.operation_id);

        if !has_api_errors {
            if let Some(op) = &operation_id {
                messages.push(json!(format!("Cloudflare API provided operation ID {op}")));
            }
        }

        if outcome == UploadOutcome::Succeeded && !has_api_errors {
            if let Err(e) = self.update_description().await {
                tracing::warn!(error = %e, "Could not update rule list description");
            }
        }

        tracing::info!(
            outcome = ?outcome,
            items = items.len(),
            rejected = invalid_rules.len(),
            "Uploaded rule list"
        );

        UploadReport {
            outcome,
            errors,
            messages,
            operation_id,
            invalid_rules,
        }
    }
}
