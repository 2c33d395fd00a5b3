//! Completeness checking against the dashboard's own displayed totals.
//!
//! Two cross-check strategies exist in the wild and are kept as separate,
//! independently selectable policies: a summary-card row count on the
//! enrollment views, and per-column footer sums on the instructor view.
//! A mismatch never fails the unit; the dashboard's totals are known to
//! disagree with its paginated detail on occasion, so the checker detects
//! and flags, nothing more.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::automation::{AutomationError, AutomationResult};
use crate::domain::Row;

/// First digit group in a displayed figure, thousands separators included.
static DISPLAY_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d[\d,]*").unwrap_or_else(|e| panic!("display-number pattern: {e}"))
});

/// Which cross-check a target runs after accumulation.
#[derive(Debug, Clone, Copy)]
pub enum CompletenessPolicy {
    /// Compare the accumulated row count against the summary-card figure.
    RowCount,
    /// Compare per-column sums against the grid's totals footer.
    ColumnSums { pairs: &'static [ColumnPair] },
}

/// One column-sum comparison. The totals footer renders one cell short of
/// the data rows, hence the separate footer index.
#[derive(Debug, Clone, Copy)]
pub struct ColumnPair {
    pub label: &'static str,
    pub column: usize,
    pub footer_column: usize,
}

/// Row-count mismatch, reported alongside the flagged output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMismatch {
    pub expected: i64,
    pub actual: usize,
}

/// Column-sum mismatch for one compared column.
#[derive(Debug, Clone)]
pub struct SumMismatch {
    pub label: &'static str,
    pub expected: Option<f64>,
    pub actual: f64,
}

/// Parses a displayed integer, stripping thousands separators.
pub fn parse_display_count(text: &str) -> Option<i64> {
    let matched = DISPLAY_NUMBER.find(text)?;
    matched.as_str().replace(',', "").parse().ok()
}

/// Parses the leading numeric token of a displayed value. Handles plain
/// counts, separator-grouped counts, and suffixed figures like "12.34 %".
pub fn parse_display_value(text: &str) -> Option<f64> {
    let token = text.split_whitespace().next()?;
    token.replace(',', "").parse().ok()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reads the expected total from the Nth summary card of a markup snapshot.
pub fn expected_total(markup: &str, card_index: usize) -> AutomationResult<i64> {
    let selector = Selector::parse("svg.card")
        .map_err(|e| AutomationError::Driver(format!("summary card selector: {e}")))?;
    let document = Html::parse_document(markup);
    let card = document.select(&selector).nth(card_index).ok_or_else(|| {
        AutomationError::NotFound(format!("summary card {card_index} not present"))
    })?;
    let text: String = card.text().collect();
    parse_display_count(&text).ok_or_else(|| {
        AutomationError::NotFound(format!("summary card {card_index} holds no figure: '{text}'"))
    })
}

/// Mismatch if and only if the accumulated count differs from the figure.
pub fn check_row_count(expected: i64, actual: usize) -> Option<CountMismatch> {
    if actual as i64 != expected {
        Some(CountMismatch { expected, actual })
    } else {
        None
    }
}

/// Compares each configured column's sum against the footer figure, both
/// rounded to two decimals. An unparseable footer cell counts as a
/// mismatch; the data is flagged for manual follow-up either way.
pub fn check_column_sums(
    rows: &[Row],
    footer: &[String],
    pairs: &[ColumnPair],
) -> Vec<SumMismatch> {
    let mut mismatches = Vec::new();
    for pair in pairs {
        let actual = round2(
            rows.iter()
                .filter_map(|row| row.get(pair.column))
                .filter_map(|cell| parse_display_value(cell))
                .sum(),
        );
        let expected = footer
            .get(pair.footer_column)
            .and_then(|cell| parse_display_value(cell))
            .map(round2);

        let agrees = matches!(expected, Some(e) if (e - actual).abs() < 1e-9);
        if !agrees {
            mismatches.push(SumMismatch {
                label: pair.label,
                expected,
                actual,
            });
        }
    }
    mismatches
}

/// Normalizes numeric display text in place once accumulation is done.
/// Count columns lose their separators; percentage columns keep only the
/// leading numeric token.
pub fn coerce_numeric_columns(rows: &mut [Row], numeric: &[usize], percent: &[usize]) {
    for row in rows.iter_mut() {
        for &column in numeric {
            if let Some(cell) = row.get_mut(column) {
                if let Some(value) = parse_display_value(cell) {
                    *cell = if value.fract() == 0.0 {
                        format!("{}", value as i64)
                    } else {
                        format!("{value}")
                    };
                }
            }
        }
        for &column in percent {
            if let Some(cell) = row.get_mut(column) {
                if let Some(token) = cell.split_whitespace().next() {
                    *cell = token.to_string();
                }
            }
        }
    }
}
