use crate::envelope::{Status, UploadOutcome};
use crate::rules_list::{RuleStore, UploadReport};
use crate::sheets::{RowSource, SheetError};
use async_trait::async_trait;
use rules::locale::Locales;
use rules::{BulkListBuilder, PublishedRuleItem, RawRow, UrlExpander};
use serde_json::json;
use std::sync::Mutex;

/// In-memory spreadsheet. `None` rows simulate an unreachable sheet.
pub struct FakeSheet {
    pub rows: Option<Vec<RawRow>>,
}

impl FakeSheet {
    pub fn with_rows(rows: Vec<RawRow>) -> Self {
        FakeSheet { rows: Some(rows) }
    }

    pub fn failing() -> Self {
        FakeSheet { rows: None }
    }
}

#[async_trait]
impl RowSource for FakeSheet {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, SheetError> {
        self.rows.clone().ok_or(SheetError::Status {
            code: 500,
            reason: "Internal Server Error".into(),
        })
    }

    async fn status(&self) -> Status {
        Status {
            success: self.rows.is_some(),
            errors: vec![],
            messages: vec![json!("fake sheet")],
        }
    }
}

/// In-memory rules list that records every upload.
pub struct FakeStore {
    pub published: Vec<PublishedRuleItem>,
    pub outcome: UploadOutcome,
    pub uploads: Mutex<Vec<Vec<PublishedRuleItem>>>,
}

impl FakeStore {
    pub fn new(published: Vec<PublishedRuleItem>) -> Self {
        FakeStore {
            published,
            outcome: UploadOutcome::Succeeded,
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RuleStore for FakeStore {
    async fn status(&self) -> Status {
        Status {
            success: true,
            errors: vec![],
            messages: vec![json!("fake store")],
        }
    }

    async fn fetch_items(&self) -> Vec<PublishedRuleItem> {
        self.published.clone()
    }

    async fn upload(&self, items: &[PublishedRuleItem]) -> UploadReport {
        self.uploads.lock().unwrap().push(items.to_vec());
        UploadReport {
            outcome: self.outcome,
            errors: vec![],
            messages: vec![json!("Cloudflare API provided operation ID fake")],
            operation_id: Some("fake".into()),
            invalid_rules: vec![],
        }
    }
}

/// Builder for `https://any.org` with two locales, `en-us` being the default.
pub fn test_builder() -> BulkListBuilder {
    let locales = Locales::new(vec!["en-us".into(), "fr-fr".into()], "en-US");
    BulkListBuilder::new(UrlExpander::new("https://any.org", locales))
}
