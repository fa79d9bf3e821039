use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with endpoint, status.",
};

pub const SHEET_ROWS: MetricDef = MetricDef {
    name: "sheet.rows",
    metric_type: MetricType::Gauge,
    description: "Data rows read from the spreadsheet on the last pipeline run",
};

pub const INVALID_ROWS: MetricDef = MetricDef {
    name: "sheet.invalid_rows",
    metric_type: MetricType::Gauge,
    description: "Rows rejected for reasons other than being soft-deleted",
};

pub const CANDIDATE_ITEMS: MetricDef = MetricDef {
    name: "rules_list.candidate_items",
    metric_type: MetricType::Gauge,
    description: "Bulk list items built from the spreadsheet after locale fan-out",
};

pub const PUBLISH_REJECTED_ITEMS: MetricDef = MetricDef {
    name: "rules_list.publish_rejected",
    metric_type: MetricType::Counter,
    description: "Uploaded items the rules list API rejected. Tagged with outcome.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    SHEET_ROWS,
    INVALID_ROWS,
    CANDIDATE_ITEMS,
    PUBLISH_REJECTED_ITEMS,
];
