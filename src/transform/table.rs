use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::extract::TableFragment;

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static DATA_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static ANY_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());

/// Cell texts of one data row, with its 1-based position among data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row: usize,
    pub cells: Vec<String>,
}

/// Rows containing at least one `<td>`; header-only rows are skipped.
pub fn parse_rows(fragment: &TableFragment) -> Vec<RawRow> {
    let html = Html::parse_fragment(fragment.html());

    html.select(&ROW)
        .filter(|row| row.select(&DATA_CELL).next().is_some())
        .enumerate()
        .map(|(i, row)| RawRow {
            row: i + 1,
            cells: row
                .select(&ANY_CELL)
                .map(|c| collapse_whitespace(&c.text().collect::<String>()))
                .collect(),
        })
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip thousands separators and parse.
pub fn clean_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
