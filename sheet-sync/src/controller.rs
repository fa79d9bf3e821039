//! The pipeline actions behind each endpoint.
//!
//! Each action runs once per request: the spreadsheet is read in full, rows
//! are validated and expanded, and only then is the rules list consulted.

use crate::config::Config;
use crate::envelope::{
    DiffPayload, Envelope, Hello, ListPayload, NoPayload, PublishPayload,
};
use crate::metrics_defs::{CANDIDATE_ITEMS, INVALID_ROWS, PUBLISH_REJECTED_ITEMS, SHEET_ROWS};
use crate::rules_list::{RuleStore, RulesListClient};
use crate::sheets::{RowSource, SheetError, SheetsClient};
use crate::{APP_NAME, VERSION};
use rules::{BulkListBuilder, ProcessedRows, PublishedRuleItem, partition_rows};
use shared::{counter, gauge};
use std::sync::Arc;

pub struct Controller {
    sheet: Arc<dyn RowSource>,
    store: Arc<dyn RuleStore>,
    builder: BulkListBuilder,
}

impl Controller {
    pub fn new(sheet: Arc<dyn RowSource>, store: Arc<dyn RuleStore>, builder: BulkListBuilder) -> Self {
        Controller {
            sheet,
            store,
            builder,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Controller::new(
            Arc::new(SheetsClient::new(&config.spreadsheet)),
            Arc::new(RulesListClient::new(&config.rules_list)),
            config.redirects.bulk_list_builder(),
        )
    }

    pub fn hello(&self) -> Hello {
        Hello {
            messages: vec![format!("{APP_NAME} {VERSION} says hello.")],
        }
    }

    /// Whether both upstream APIs are reachable.
    pub async fn status(&self) -> Envelope<NoPayload> {
        let sheet = self.sheet.status().await;
        let store = self.store.status().await;
        Envelope::from_status(sheet.merge(store))
    }

    pub async fn list(&self) -> Result<Envelope<ListPayload>, SheetError> {
        let ProcessedRows { rules, invalid } = self.processed_rows().await?;

        let message = format!(
            "Google sheet contains {} valid rules and {} rows with errors.",
            rules.len(),
            invalid.len()
        );
        Ok(Envelope::ok(ListPayload {
            input_rows: rules,
            invalid_rules: invalid,
        })
        .with_message(message))
    }

    pub async fn diff(&self) -> Result<Envelope<DiffPayload>, SheetError> {
        let candidate = self.candidate_items().await?;
        let published = self.store.fetch_items().await;
        let diff = rules::diff(&published, &candidate);

        tracing::info!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            "Computed rule list diff"
        );

        let added = format!(
            "There are {} rules to add (in spreadsheet but not published).",
            diff.added.len()
        );
        let removed = format!(
            "There are {} rules to remove (published but not in spreadsheet).",
            diff.removed.len()
        );
        Ok(Envelope::ok(DiffPayload {
            added_rules: diff.added,
            removed_rules: diff.removed,
        })
        .with_message(added)
        .with_message(removed))
    }

    /// Replaces the published list with what the spreadsheet currently says.
    pub async fn publish(&self) -> Result<Envelope<PublishPayload>, SheetError> {
        let candidate = self.candidate_items().await?;
        let report = self.store.upload(&candidate).await;

        if !report.invalid_rules.is_empty() {
            counter!(PUBLISH_REJECTED_ITEMS, "outcome" => report.outcome.as_str())
                .increment(report.invalid_rules.len() as u64);
        }

        Ok(Envelope {
            success: report.outcome.as_success(),
            errors: report.errors,
            messages: report.messages,
            body: PublishPayload {
                outcome: report.outcome,
                operation_id: report.operation_id,
                invalid_rules: report.invalid_rules,
            },
        })
    }

    async fn processed_rows(&self) -> Result<ProcessedRows, SheetError> {
        let rows = self.sheet.fetch_rows().await?;
        gauge!(SHEET_ROWS).set(rows.len() as f64);

        let processed = partition_rows(rows);
        gauge!(INVALID_ROWS).set(processed.invalid.len() as f64);
        if !processed.invalid.is_empty() {
            tracing::info!(invalid = processed.invalid.len(), "Spreadsheet has invalid rows");
        }
        Ok(processed)
    }

    async fn candidate_items(&self) -> Result<Vec<PublishedRuleItem>, SheetError> {
        let processed = self.processed_rows().await?;
        let items = self.builder.make_bulk_list(&processed.rules);
        gauge!(CANDIDATE_ITEMS).set(items.len() as f64);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::UploadOutcome;
    use crate::testutils::{FakeSheet, FakeStore, test_builder};
    use rules::{CellValue, RawRow, RedirectCode};
    use serde_json::json;

    fn row(source: &str, destination: &str) -> RawRow {
        RawRow::new(source, destination)
    }

    fn sheet_rows() -> Vec<RawRow> {
        let mut localized = row("/work", "/play");
        localized.code = Some(CellValue::Integer(301));
        localized.localized = Some("yes".into());

        let mut deleted = row("/old", "/new");
        deleted.deleted = Some(CellValue::Bool(true));

        vec![localized, deleted, row("/dull", "/dull"), row("", "/nowhere")]
    }

    fn controller(sheet: FakeSheet, store: Arc<FakeStore>) -> Controller {
        Controller::new(Arc::new(sheet), store, test_builder())
    }

    #[test]
    fn test_hello() {
        let controller = controller(FakeSheet::with_rows(vec![]), Arc::new(FakeStore::new(vec![])));
        let hello = controller.hello();
        assert_eq!(
            hello.messages,
            vec![format!("directomatic {VERSION} says hello.")]
        );
    }

    #[tokio::test]
    async fn test_status_merges_both_sides() {
        let controller = controller(FakeSheet::failing(), Arc::new(FakeStore::new(vec![])));
        let status = controller.status().await;
        assert_eq!(status.success, Some(false));
        assert_eq!(status.messages, vec![json!("fake sheet"), json!("fake store")]);
    }

    #[tokio::test]
    async fn test_list() {
        let controller = controller(
            FakeSheet::with_rows(sheet_rows()),
            Arc::new(FakeStore::new(vec![])),
        );
        let list = controller.list().await.unwrap();

        assert_eq!(list.success, Some(true));
        assert_eq!(
            list.messages,
            vec![json!("Google sheet contains 1 valid rules and 2 rows with errors.")]
        );
        assert_eq!(list.body.input_rows.len(), 1);
        assert_eq!(list.body.input_rows[0].code, RedirectCode::MovedPermanently);
        // the soft-deleted row is not an error
        assert_eq!(
            list.body.invalid_rules,
            vec![row("/dull", "/dull"), row("", "/nowhere")]
        );
    }

    #[tokio::test]
    async fn test_list_sheet_failure() {
        let controller = controller(FakeSheet::failing(), Arc::new(FakeStore::new(vec![])));
        assert!(matches!(
            controller.list().await,
            Err(SheetError::Status { code: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_diff() {
        let kept = PublishedRuleItem::new(
            "https://any.org/work",
            "https://any.org/play",
            RedirectCode::MovedPermanently,
        );
        let stale = PublishedRuleItem::new("https://any.org/a", "https://any.org/b", RedirectCode::Found);
        let store = Arc::new(FakeStore::new(vec![kept, stale.clone()]));
        let controller = controller(FakeSheet::with_rows(sheet_rows()), store);

        let diff = controller.diff().await.unwrap();
        assert_eq!(diff.body.removed_rules, vec![stale]);
        assert_eq!(
            diff.body.added_rules,
            vec![PublishedRuleItem::new(
                "https://any.org/fr-fr/work",
                "https://any.org/fr-fr/play",
                RedirectCode::MovedPermanently,
            )]
        );
        assert_eq!(
            diff.messages,
            vec![
                json!("There are 1 rules to add (in spreadsheet but not published)."),
                json!("There are 1 rules to remove (published but not in spreadsheet)."),
            ]
        );
    }

    #[tokio::test]
    async fn test_publish_uploads_full_list() {
        let store = Arc::new(FakeStore::new(vec![]));
        let controller = controller(FakeSheet::with_rows(sheet_rows()), store.clone());

        let published = controller.publish().await.unwrap();
        assert_eq!(published.success, Some(true));
        assert_eq!(published.body.outcome, UploadOutcome::Succeeded);
        assert_eq!(published.body.operation_id.as_deref(), Some("fake"));

        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].len(), 2);
        assert_eq!(uploads[0][0].redirect.source_url, "https://any.org/work");
    }

    #[tokio::test]
    async fn test_publish_unknown_outcome() {
        let mut store = FakeStore::new(vec![]);
        store.outcome = UploadOutcome::Unknown;
        let controller = controller(FakeSheet::with_rows(vec![]), Arc::new(store));

        let published = controller.publish().await.unwrap();
        assert_eq!(published.success, None);
        assert_eq!(published.body.outcome, UploadOutcome::Unknown);
    }

    #[tokio::test]
    async fn test_publish_sheet_failure_uploads_nothing() {
        let store = Arc::new(FakeStore::new(vec![]));
        let controller = controller(FakeSheet::failing(), store.clone());

        assert!(controller.publish().await.is_err());
        assert!(store.uploads.lock().unwrap().is_empty());
    }
}
