//! Google Sheets values API client.
//!
//! The first row of the configured range holds the column headers. A header
//! such as `source: from URL` names the `source` field; everything after the
//! first `:` is commentary for the humans editing the sheet.

use crate::config::SpreadsheetConfig;
use crate::envelope::Status;
use async_trait::async_trait;
use indexmap::IndexMap;
use rules::{CellValue, RawRow};
use serde::Deserialize;
use serde_json::json;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum SheetError {
    #[error("Google Sheets API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Google Sheet API returned {code}, {reason}")]
    Status { code: u16, reason: String },
    #[error("Google Sheets API did not return any rows.")]
    NoRows,
}

/// Where the redirect rows come from.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Every data row below the header row, in sheet order.
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, SheetError>;

    /// Reachability report. Never fails; problems end up in `errors`.
    async fn status(&self) -> Status;
}

#[derive(Deserialize, Default)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Option<CellValue>>>,
}

pub struct SheetsClient {
    client: reqwest::Client,
    endpoint: Url,
    sheet_id: String,
    api_key: String,
    range: String,
}

impl SheetsClient {
    pub fn new(config: &SpreadsheetConfig) -> Self {
        SheetsClient {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            sheet_id: config.id.clone(),
            api_key: config.api_key.clone(),
            range: config.range.clone(),
        }
    }

    fn values_url(&self) -> String {
        format!(
            "{}/{}/values/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.sheet_id,
            self.range
        )
    }

    fn edit_url(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/edit",
            self.sheet_id
        )
    }

    async fn fetch_values(&self) -> Result<Vec<Vec<Option<CellValue>>>, SheetError> {
        let response = self
            .client
            .get(self.values_url())
            .query(&[
                ("key", self.api_key.as_str()),
                ("valueRenderOption", "UNFORMATTED_VALUE"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response.json::<ValueRange>().await?.values)
    }
}

#[async_trait]
impl RowSource for SheetsClient {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, SheetError> {
        let values = self.fetch_values().await?;
        let rows = rows_from_values(values)?;
        tracing::debug!(rows = rows.len(), "Fetched spreadsheet rows");
        Ok(rows)
    }

    async fn status(&self) -> Status {
        let (values, error) = match self.fetch_values().await {
            Ok(values) => (values, None),
            Err(e) => {
                tracing::warn!(error = %e, "Google Sheet status check failed");
                (Vec::new(), Some(e))
            }
        };

        let summary = if values.is_empty() {
            "Google Sheet contains no rows.".to_string()
        } else {
            format!("Google Sheet contains {} total rows.", values.len())
        };

        Status {
            success: error.is_none(),
            errors: error.map(|e| json!(e.to_string())).into_iter().collect(),
            messages: vec![
                json!(summary),
                json!(format!("Google Sheet URL {}", self.edit_url())),
            ],
        }
    }
}

/// Field name carried by a header cell: the text before the first `:`.
pub fn header_key(header: &str) -> String {
    header.split(':').next().unwrap_or_default().trim().to_string()
}

/// Pairs each header with the cell in the same column. Missing trailing
/// cells are `None`; cells beyond the last header are dropped.
pub fn merge_headers(
    headers: &[String],
    row: &[Option<CellValue>],
) -> IndexMap<String, Option<CellValue>> {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| (header.clone(), row.get(i).cloned().flatten()))
        .collect()
}

fn rows_from_values(values: Vec<Vec<Option<CellValue>>>) -> Result<Vec<RawRow>, SheetError> {
    let mut values = values.into_iter();
    let header_row = values.next().ok_or(SheetError::NoRows)?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.as_ref().map(|c| header_key(&c.to_string())).unwrap_or_default())
        .collect();

    Ok(values
        .filter(|row| !is_blank(row))
        .map(|row| raw_row_from_fields(&merge_headers(&headers, &row)))
        .collect())
}

fn is_blank(row: &[Option<CellValue>]) -> bool {
    row.iter().all(|cell| match cell {
        None => true,
        Some(CellValue::Text(s)) => s.trim().is_empty(),
        Some(_) => false,
    })
}

fn lookup<'a>(
    fields: &'a IndexMap<String, Option<CellValue>>,
    name: &str,
) -> Option<&'a CellValue> {
    fields
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.as_ref())
}

fn raw_row_from_fields(fields: &IndexMap<String, Option<CellValue>>) -> RawRow {
    let text = |name: &str| lookup(fields, name).map(|value| value.to_string());

    RawRow {
        source: text("source").unwrap_or_default(),
        destination: text("destination").unwrap_or_default(),
        code: lookup(fields, "code").cloned(),
        localized: lookup(fields, "localized").cloned(),
        deleted: lookup(fields, "deleted").cloned(),
        description: text("description"),
    }
}
