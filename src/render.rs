//! Turning records into table rows.
//!
//! [`render_table`] interprets a column schema against a page of records.
//! Rendering never fails: missing or malformed fields fall back to a
//! placeholder or to the raw string.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use crate::api::Record;
use crate::schema::{Column, ColumnKind};

pub const PLACEHOLDER: &str = "-";

/// Characters of content shown before the expand toggle.
pub const CONTENT_PREVIEW_CHARS: usize = 100;

pub const EXPAND_LABEL: &str = "[expand]";
pub const COLLAPSE_LABEL: &str = "[collapse]";

/// Display format for parsed timestamps (day.month.year, 24h clock).
const DATE_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

const CATEGORY_LABELS: &[(&str, &str)] = &[
    ("military_operations", "Военные операции"),
    ("humanitarian_crisis", "Гуманитарный кризис"),
    ("economic_consequences", "Экономические последствия"),
    ("political_decisions", "Политические решения"),
    ("information_social", "Информационно-социальные аспекты"),
    ("ukraine", "Украина"),
    ("middle_east", "Ближний восток"),
    ("fake_news", "Фейки"),
    ("info_war", "Инфовойна"),
    ("europe", "Европа"),
    ("usa", "США"),
    ("other", "Другое"),
];

/// Bucket used when a record has no category.
pub const DEFAULT_CATEGORY: &str = "other";

/// Display label for a category id.  Unknown ids pass through unchanged.
pub fn category_label(id: &str) -> &str {
    CATEGORY_LABELS
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, label)| *label)
        .unwrap_or(id)
}

/// Format a timestamp for display, or return it verbatim if it does not parse.
pub fn format_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Risk bucket of a social post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_lowercase()).as_deref() {
            Some("high") | Some("высокий") => Self::High,
            Some("medium") | Some("средний") => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::High => "risk-high",
            Self::Medium => "risk-medium",
            Self::Low => "risk-low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKind {
    Plain,
    Date,
    Title,
    Content {
        full: String,
        preview: String,
        expanded: bool,
    },
    Category,
    Risk(RiskLevel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    /// Text as currently displayed.
    pub text: String,
}

impl Cell {
    fn plain(kind: CellKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    fn content(raw: Option<String>) -> Self {
        let full = raw.unwrap_or_else(|| PLACEHOLDER.to_string());
        if full.chars().count() <= CONTENT_PREVIEW_CHARS {
            return Self::plain(
                CellKind::Content {
                    preview: full.clone(),
                    full: full.clone(),
                    expanded: false,
                },
                full,
            );
        }
        let mut preview: String = full.chars().take(CONTENT_PREVIEW_CHARS).collect();
        preview.push_str("...");
        Self {
            text: preview.clone(),
            kind: CellKind::Content {
                full,
                preview,
                expanded: false,
            },
        }
    }

    /// Whether the search highlight applies to this cell.
    pub fn is_searchable(&self) -> bool {
        matches!(self.kind, CellKind::Title | CellKind::Content { .. })
    }

    /// Label of the expand/collapse toggle, if this cell has one.
    pub fn toggle_label(&self) -> Option<&'static str> {
        match &self.kind {
            CellKind::Content { full, preview, expanded } if full != preview => {
                Some(if *expanded { COLLAPSE_LABEL } else { EXPAND_LABEL })
            }
            _ => None,
        }
    }

    /// Swap between preview and full text.  Returns `false` for cells
    /// without a toggle.
    pub fn toggle(&mut self) -> bool {
        if self.toggle_label().is_none() {
            return false;
        }
        if let CellKind::Content { full, preview, expanded } = &mut self.kind {
            *expanded = !*expanded;
            self.text = if *expanded { full.clone() } else { preview.clone() };
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub risk: Option<RiskLevel>,
    pub record: Record,
}

impl Row {
    /// Toggle the first expandable cell of the row.
    pub fn toggle_content(&mut self) -> bool {
        self.cells.iter_mut().any(Cell::toggle)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RenderedTable {
    /// Single "no data" row in place of headers and body.
    #[default]
    NoData,
    Rows {
        headers: Vec<Column>,
        rows: Vec<Row>,
    },
}

impl RenderedTable {
    pub fn rows(&self) -> &[Row] {
        match self {
            Self::NoData => &[],
            Self::Rows { rows, .. } => rows,
        }
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        match self {
            Self::NoData => &mut [],
            Self::Rows { rows, .. } => rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

pub fn render_cell(record: &Record, column: &Column) -> Cell {
    match column.kind {
        ColumnKind::Date(fields) => {
            let text = record
                .first_text(fields)
                .map(|raw| format_date(&raw))
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            Cell::plain(CellKind::Date, text)
        }
        ColumnKind::Title => Cell::plain(
            CellKind::Title,
            record.text(column.field).unwrap_or_else(|| PLACEHOLDER.to_string()),
        ),
        ColumnKind::Content => Cell::content(record.text(column.field)),
        ColumnKind::Category => {
            let id = record
                .text(column.field)
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
            Cell::plain(CellKind::Category, category_label(&id))
        }
        ColumnKind::Count => Cell::plain(
            CellKind::Plain,
            record.text(column.field).unwrap_or_else(|| "0".to_string()),
        ),
        ColumnKind::Percent => Cell::plain(
            CellKind::Plain,
            format!("{:.1}%", record.number(column.field).unwrap_or(0.0)),
        ),
        ColumnKind::Risk => {
            let raw = record.text(column.field);
            let level = RiskLevel::parse(raw.as_deref());
            Cell::plain(
                CellKind::Risk(level),
                raw.unwrap_or_else(|| "low".to_string()),
            )
        }
        ColumnKind::Plain => Cell::plain(
            CellKind::Plain,
            record.text(column.field).unwrap_or_else(|| PLACEHOLDER.to_string()),
        ),
    }
}

/// Render a page of records against `columns`.
pub fn render_table(items: &[Record], columns: &[Column]) -> RenderedTable {
    if items.is_empty() {
        return RenderedTable::NoData;
    }
    let has_risk = columns.iter().any(|c| c.kind == ColumnKind::Risk);
    let rows = items
        .iter()
        .map(|record| {
            let cells: Vec<Cell> = columns.iter().map(|c| render_cell(record, c)).collect();
            let risk = has_risk.then(|| {
                cells
                    .iter()
                    .find_map(|c| match c.kind {
                        CellKind::Risk(level) => Some(level),
                        _ => None,
                    })
                    .unwrap_or(RiskLevel::Low)
            });
            Row {
                cells,
                risk,
                record: record.clone(),
            }
        })
        .collect();
    RenderedTable::Rows {
        headers: columns.to_vec(),
        rows,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::{clear, highlight, Highlighter};
    use crate::schema::{SchemaRegistry, GENERIC};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn texts(row: &Row) -> Vec<&str> {
        row.cells.iter().map(|c| c.text.as_str()).collect()
    }

    // -- placeholders --------------------------------------------------------

    #[test]
    fn missing_fields_render_placeholder() {
        let table = render_table(&[record(json!({}))], GENERIC);
        let row = &table.rows()[0];
        assert_eq!(texts(row), vec!["-", "-", "Другое"]);
    }

    #[test]
    fn missing_content_renders_placeholder_without_toggle() {
        let columns = SchemaRegistry::builtin().resolve("ok");
        let table = render_table(&[record(json!({}))], columns);
        let row = &table.rows()[0];
        assert_eq!(row.cells[0].text, "-"); // id
        assert_eq!(row.cells[2].text, "-"); // text
        assert_eq!(row.cells[2].toggle_label(), None);
        assert_eq!(row.cells[3].text, "-"); // date
        assert_eq!(row.cells[4].text, "0"); // likes
        assert_eq!(row.cells[5].text, "0.0%");
    }

    #[test]
    fn empty_page_is_single_no_data_state() {
        let table = render_table(&[], GENERIC);
        assert_eq!(table, RenderedTable::NoData);
        assert!(table.is_empty());
    }

    // -- dates ---------------------------------------------------------------

    #[test]
    fn naive_timestamp_is_formatted() {
        assert_eq!(format_date("2024-03-05 14:07:09"), "05.03.2024, 14:07:09");
        assert_eq!(format_date("2024-03-05T14:07:09.123"), "05.03.2024, 14:07:09");
        assert_eq!(format_date("2024-03-05"), "05.03.2024, 00:00:00");
    }

    #[test]
    fn unparseable_date_shows_raw_string() {
        assert_eq!(format_date("вчера вечером"), "вчера вечером");
    }

    #[test]
    fn date_column_uses_fallback_key() {
        let table = render_table(&[record(json!({ "date": "garbage" }))], GENERIC);
        assert_eq!(table.rows()[0].cells[0].text, "garbage");
    }

    // -- categories ----------------------------------------------------------

    #[test]
    fn category_translation_is_idempotent() {
        for id in ["ukraine", "usa", "other", "sports"] {
            let once = category_label(id);
            let twice = category_label(once);
            assert_eq!(once, twice, "id {id:?}");
        }
        assert_eq!(category_label("sports"), "sports");
        assert_eq!(category_label("ukraine"), "Украина");
    }

    // -- content -------------------------------------------------------------

    #[test]
    fn long_content_is_truncated_and_toggles() {
        let long: String = "ж".repeat(150);
        let mut cell = render_cell(
            &record(json!({ "text": long })),
            &SchemaRegistry::builtin().resolve("vk")[2],
        );
        assert_eq!(cell.text.chars().count(), 103);
        assert!(cell.text.ends_with("..."));
        assert_eq!(cell.toggle_label(), Some(EXPAND_LABEL));

        assert!(cell.toggle());
        assert_eq!(cell.text, long);
        assert_eq!(cell.toggle_label(), Some(COLLAPSE_LABEL));

        assert!(cell.toggle());
        assert_eq!(cell.text.chars().count(), 103);
    }

    #[test]
    fn short_content_has_no_toggle() {
        let mut cell = render_cell(
            &record(json!({ "text": "short" })),
            &SchemaRegistry::builtin().resolve("vk")[2],
        );
        assert_eq!(cell.toggle_label(), None);
        assert!(!cell.toggle());
        assert_eq!(cell.text, "short");
    }

    #[test]
    fn toggle_label_is_never_highlighted() {
        let long = format!("{} expand", "x".repeat(120));
        let cell = render_cell(
            &record(json!({ "text": long })),
            &SchemaRegistry::builtin().resolve("vk")[2],
        );
        let h = Highlighter::new("expand").unwrap();
        // Only the cell text is highlighted; the toggle label is drawn apart.
        let segs = highlight(Some(&h), &cell.text);
        assert!(segs.iter().all(|s| !s.matched));
        assert_eq!(clear(&segs), cell.text);
    }

    // -- social --------------------------------------------------------------

    #[test]
    fn social_row_carries_risk_and_percent() {
        let columns = SchemaRegistry::builtin().resolve("twitter");
        let table = render_table(
            &[record(json!({
                "id": 7,
                "author_username": "someone",
                "text": "hello",
                "extremism_percentage": 42.26,
                "risk_level": "Высокий",
            }))],
            columns,
        );
        let row = &table.rows()[0];
        assert_eq!(row.risk, Some(RiskLevel::High));
        assert_eq!(row.cells[6].text, "42.3%");
        assert_eq!(row.cells[7].text, "Высокий");
    }

    #[test]
    fn news_rows_have_no_risk() {
        let table = render_table(&[record(json!({ "title": "t" }))], GENERIC);
        assert_eq!(table.rows()[0].risk, None);
    }

    #[test]
    fn risk_parsing_defaults_low() {
        assert_eq!(RiskLevel::parse(Some("MEDIUM")), RiskLevel::Medium);
        assert_eq!(RiskLevel::parse(Some("unknown")), RiskLevel::Low);
        assert_eq!(RiskLevel::parse(None), RiskLevel::Low);
        assert_eq!(RiskLevel::High.class(), "risk-high");
    }

    #[test]
    fn row_toggle_content_finds_expandable_cell() {
        let columns = SchemaRegistry::builtin().resolve("ok");
        let mut table = render_table(&[record(json!({ "text": "y".repeat(200) }))], columns);
        let row = &mut table.rows_mut()[0];
        assert!(row.toggle_content());
        assert_eq!(row.cells[2].text.len(), 200);
    }
}
