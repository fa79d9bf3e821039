//! Spreadsheet row to bulk redirect pipeline.
//!
//! Raw rows are validated into [`Rule`]s, expanded per locale into
//! [`PublishedRuleItem`]s, and compared against what the store already has.
//! Nothing in this crate performs I/O.

pub mod bulk_list;
pub mod differ;
pub mod expander;
pub mod locale;
pub mod processor;
pub mod types;
pub mod validators;

pub use bulk_list::BulkListBuilder;
pub use differ::{RuleDiff, diff, redirect_compare, rule_in_list};
pub use expander::UrlExpander;
pub use locale::Locales;
pub use processor::{ProcessedRows, RowOutcome, partition_rows, process_sheet_row};
pub use types::{CellValue, PublishedRuleItem, RawRow, RedirectCode, RedirectDetails, Rule};
pub use validators::ValidationError;
