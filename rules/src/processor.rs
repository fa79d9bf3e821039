use crate::types::{RawRow, RedirectCode, Rule};
use crate::validators::{validate_boolean, validate_code, validate_path};

/// Status used when a row does not name a usable one.
pub const DEFAULT_CODE: RedirectCode = RedirectCode::Found;

/// Result of turning one spreadsheet row into a rule.
///
/// A rejection says nothing about why. Callers that need to tell a
/// soft-deleted row from a broken one re-read the row's `deleted` cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted(Rule),
    Rejected,
}

impl RowOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RowOutcome::Accepted(_))
    }

    pub fn into_rule(self) -> Option<Rule> {
        match self {
            RowOutcome::Accepted(rule) => Some(rule),
            RowOutcome::Rejected => None,
        }
    }
}

/// Validates a raw row and applies the publishing rules to it.
pub fn process_sheet_row(row: &RawRow) -> RowOutcome {
    let paths = validate_path(&row.source)
        .and_then(|source| validate_path(&row.destination).map(|dest| (source, dest)));
    let (source, destination) = match paths {
        Ok(paths) => paths,
        Err(e) => {
            tracing::debug!(error = %e, "rejecting row");
            return RowOutcome::Rejected;
        }
    };

    let code = validate_code(row.code.as_ref(), DEFAULT_CODE);
    let localized = validate_boolean(row.localized.as_ref(), false);
    let deleted = validate_boolean(row.deleted.as_ref(), false);

    if deleted {
        tracing::debug!(%source, "skipping deleted row");
        return RowOutcome::Rejected;
    }

    // A redirect onto itself would loop forever.
    if source == destination {
        tracing::debug!(%source, "rejecting self-redirect");
        return RowOutcome::Rejected;
    }

    RowOutcome::Accepted(Rule {
        source,
        destination,
        code,
        localized,
        deleted,
        description: row.description.clone().unwrap_or_default(),
    })
}

/// Rows split into publishable rules and the rows that were rejected for a
/// reason other than being marked deleted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessedRows {
    pub rules: Vec<Rule>,
    pub invalid: Vec<RawRow>,
}

/// Runs every row through [`process_sheet_row`], preserving row order.
pub fn partition_rows<I>(rows: I) -> ProcessedRows
where
    I: IntoIterator<Item = RawRow>,
{
    let mut processed = ProcessedRows::default();

    for row in rows {
        match process_sheet_row(&row) {
            RowOutcome::Accepted(rule) => processed.rules.push(rule),
            RowOutcome::Rejected => {
                if !validate_boolean(row.deleted.as_ref(), false) {
                    processed.invalid.push(row);
                }
            }
        }
    }

    processed
}
