/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use crate::net::SchemaError;
use log::{debug, warn};
use scraper::{ElementRef, Html, Selector};

/// Named column positions for one screen's ranking table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// CSS selector of the ranking table.
    pub table_selector: &'static str,
    pub code: usize,
    pub name: usize,
    pub market: usize,
    pub price: usize,
    pub change_amount: usize,
    pub change_percent: usize,
    /// Rows shorter than this are not data rows.
    pub min_columns: usize,
}

impl ColumnSchema {
    fn fields(&self) -> [(&'static str, usize); 6] {
        [
            ("code", self.code),
            ("name", self.name),
            ("market", self.market),
            ("price", self.price),
            ("change_amount", self.change_amount),
            ("change_percent", self.change_percent),
        ]
    }

    fn max_index(&self) -> usize {
        self.fields().iter().map(|(_, i)| *i).max().unwrap_or(0)
    }

    /// Cell count a row needs before it is looked at.
    pub fn required_columns(&self) -> usize {
        self.min_columns.max(self.max_index() + 1)
    }

    /// Checked once at startup.
    pub fn validate(&self, source_name: &str) -> Result<(), SchemaError> {
        if Selector::parse(self.table_selector).is_err() {
            return Err(SchemaError::BadSelector {
                source_name: source_name.to_string(),
                selector: self.table_selector.to_string(),
            });
        }
        let max = self.max_index();
        if self.min_columns <= max {
            return Err(SchemaError::ColumnOutOfRange {
                source_name: source_name.to_string(),
                min_columns: self.min_columns,
                index: max,
            });
        }
        let fields = self.fields();
        for (i, (a, ia)) in fields.iter().enumerate() {
            if let Some((b, _)) = fields[i + 1..].iter().find(|(_, ib)| ib == ia) {
                return Err(SchemaError::DuplicateColumn {
                    source_name: source_name.to_string(),
                    a: *a,
                    b: *b,
                    index: *ia,
                });
            }
        }
        Ok(())
    }
}

/// One table cell, text already whitespace-normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub link_text: Option<String>,
    pub href: Option<String>,
}

impl Cell {
    pub fn text(s: &str) -> Self {
        Cell {
            text: norm_text(s),
            ..Default::default()
        }
    }

    fn from_element(el: ElementRef<'_>, link_sel: &Selector) -> Self {
        let text = norm_text(&el.text().collect::<String>());
        let link = el.select(link_sel).next();
        Cell {
            text,
            link_text: link.map(|a| norm_text(&a.text().collect::<String>())),
            href: link.and_then(|a| a.value().attr("href").map(str::to_string)),
        }
    }
}

/// A ranking row as read from the page, before any threshold is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRow {
    pub code: String,
    pub name: String,
    pub market: String,
    pub price: f64,
    pub change_amount: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TablePage {
    Missing,
    Rows {
        records: Vec<ExtractedRow>,
        /// Rows looked at, including skipped ones.
        total_rows: usize,
        skipped: usize,
    },
}

/// Strip thousands separators, percent signs and a leading plus. Empty and
/// lone `-` are unparsable.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '%').collect();
    let cleaned = cleaned.trim();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(cleaned).trim();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Map one row to a record, or `None` when the row must be skipped.
///
/// The percent field gates admission so it must parse; price and change are
/// best-effort and fall back to 0.
pub fn extract_row(cells: &[Cell], schema: &ColumnSchema) -> Option<ExtractedRow> {
    if cells.len() < schema.required_columns() {
        return None;
    }

    let change_percent = parse_number(&cells[schema.change_percent].text)?;

    let code_cell = &cells[schema.code];
    let code = code_cell
        .link_text
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(&code_cell.text)
        .to_string();
    if code.is_empty() {
        return None;
    }

    let price = parse_number(&cells[schema.price].text)
        .filter(|p| *p >= 0.0)
        .unwrap_or(0.0);
    let change_amount = parse_number(&cells[schema.change_amount].text).unwrap_or(0.0);

    Some(ExtractedRow {
        code,
        name: cells[schema.name].text.clone(),
        market: cells[schema.market].text.clone(),
        price,
        change_amount,
        change_percent,
    })
}

/// Read every data row of the schema's table on a ranking page.
pub fn extract_table(html: &str, schema: &ColumnSchema) -> TablePage {
    let doc = Html::parse_document(html);
    let table_sel = match Selector::parse(schema.table_selector) {
        Ok(s) => s,
        Err(_) => {
            warn!("invalid table selector `{}`", schema.table_selector);
            return TablePage::Missing;
        }
    };
    let Some(table) = doc.select(&table_sel).next() else {
        return TablePage::Missing;
    };

    let rows = table_rows(table, declares_tbody(html));
    let total_rows = rows.len();
    let mut records = Vec::with_capacity(total_rows);
    let mut skipped = 0usize;

    for (i, cells) in rows.iter().enumerate() {
        match extract_row(cells, schema) {
            Some(r) => records.push(r),
            None => {
                skipped += 1;
                debug!("skipping row {i} ({} cells)", cells.len());
            }
        }
    }

    TablePage::Rows {
        records,
        total_rows,
        skipped,
    }
}

/// Whether the raw markup spells out a `<tbody>` anywhere.
///
/// The parsed tree can't answer this: HTML5 wraps bare rows in an implied
/// `<tbody>`.
fn declares_tbody(html: &str) -> bool {
    html.as_bytes()
        .windows(6)
        .any(|w| w.eq_ignore_ascii_case(b"<tbody"))
}

/// Data rows of a ranking table.
///
/// With a `<thead>` or a `<tbody>` in the markup, every row of the body is
/// data. A bare table keeps its two header rows inline, so those are dropped.
fn table_rows(table: ElementRef<'_>, explicit_body: bool) -> Vec<Vec<Cell>> {
    let link_sel = match Selector::parse("a") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let children = || table.children().filter_map(ElementRef::wrap);
    let has_thead = children().any(|c| c.value().name() == "thead");
    let header_rows = if has_thead || explicit_body { 0 } else { 2 };

    let trs: Vec<ElementRef<'_>> = children()
        .filter(|c| matches!(c.value().name(), "tbody" | "tr"))
        .flat_map(|c| {
            if c.value().name() == "tr" {
                vec![c]
            } else {
                c.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|r| r.value().name() == "tr")
                    .collect()
            }
        })
        .skip(header_rows)
        .collect();

    trs.into_iter()
        .map(|tr| {
            tr.children()
                .filter_map(ElementRef::wrap)
                .filter(|c| matches!(c.value().name(), "td" | "th"))
                .map(|c| Cell::from_element(c, &link_sel))
                .collect()
        })
        .collect()
}

/// Collapse whitespace & trim
pub fn norm_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}
