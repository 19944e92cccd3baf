use anyhow::{anyhow, bail, Result};
use scraper::{ElementRef, Html, Selector};

use super::table::Table;

/// Elements whose content is never treated as page text.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "iframe", "noscript", "template"];

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {:?}", css, e))
}

/// Visible text of an element, whitespace collapsed. Text inside scripts,
/// styles and frames is ignored.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            let text: &str = text;
            parts.push(text);
        }
    }
    parts.concat().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the first table with a header row and at least one data row.
///
/// The header row is the first row containing `<th>` cells, or the first row
/// of the table when it has none.
pub fn extract_table(document: &str) -> Result<Table> {
    let html = Html::parse_document(document);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("th, td")?;
    let th_sel = selector("th")?;

    for table in html.select(&table_sel) {
        if table
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| SKIPPED_ELEMENTS.contains(&a.value().name()))
        {
            continue;
        }

        let rows: Vec<ElementRef<'_>> = table.select(&row_sel).collect();
        let header_idx = rows
            .iter()
            .position(|r| r.select(&th_sel).next().is_some())
            .unwrap_or(0);
        let Some(header_row) = rows.get(header_idx) else {
            continue;
        };

        let headers: Vec<String> = header_row.select(&cell_sel).map(visible_text).collect();
        if headers.iter().all(|h| h.is_empty()) {
            continue;
        }

        let data: Vec<Vec<String>> = rows[header_idx + 1..]
            .iter()
            .map(|row| {
                let mut cells: Vec<String> = row.select(&cell_sel).map(visible_text).collect();
                cells.resize(headers.len().max(cells.len()), String::new());
                cells
            })
            .filter(|cells| cells.iter().any(|c| !c.is_empty()))
            .collect();

        if !data.is_empty() {
            return Ok(Table::new(headers, data));
        }
    }

    bail!("No table with a header row and data rows found in the document")
}

/// Whether `text` looks like an HTML document rather than CSV.
pub fn looks_like_html(text: &str) -> bool {
    let head: String = text
        .trim_start_matches('\u{feff}')
        .trim_start()
        .chars()
        .take(512)
        .collect::<String>()
        .to_lowercase();
    head.starts_with('<') || head.contains("<table") || head.contains("<html")
}
