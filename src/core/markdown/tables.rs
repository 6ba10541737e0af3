//! Markdown pipe tables → `insertTable` plus per-cell text.
//!
//! The Docs API lays a freshly inserted table out at fixed offsets from the
//! insertion index: +1 for the table start, +1 for each row start, +2 for
//! each cell start, the cell's text, and +2 past the end of the table. These
//! constants come from observed API behaviour rather than the published
//! reference, so they need re-checking against live responses whenever the
//! API version changes.

use std::sync::LazyLock;

use regex::Regex;

use super::compiler::CompileError;
use super::inline::parse_inline;
use super::lines::{classify, compile_line, LineKind, LineOutput};
use super::requests::{InsertionPoint, Request};

static DIVIDER_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:?-+:?$").unwrap());

const TABLE_START: usize = 1;
const ROW_START: usize = 1;
const CELL_START: usize = 2;
const TABLE_END: usize = 2;

/// Buffered `|` lines waiting for the end of the table block.
#[derive(Debug, Default)]
pub struct TableBuildState {
    rows: Vec<String>,
}

impl TableBuildState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_table_line(line: &str) -> bool {
        line.trim_start().starts_with('|')
    }

    pub fn push(&mut self, line: &str) {
        self.rows.push(line.trim().to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drains the buffered rows, leaving the state empty.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.rows)
    }
}

/// Compiled table: `insertTable`, every cell's text, then every cell's styles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOutput {
    pub rows: usize,
    pub columns: usize,
    pub requests: Vec<Request>,
    pub images: Vec<Request>,
    pub next_index: usize,
}

/// Splits a row on `|`, dropping the empty strings the outer pipes produce.
pub fn split_row(row: &str) -> Vec<&str> {
    let mut cells: Vec<&str> = row.trim().split('|').collect();
    if cells.first().is_some_and(|cell| cell.trim().is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|cell| cell.trim().is_empty()) {
        cells.pop();
    }
    cells.into_iter().map(str::trim).collect()
}

fn is_divider(cells: &[&str]) -> bool {
    !cells.is_empty() && cells.iter().all(|cell| DIVIDER_CELL.is_match(cell))
}

/// Compiles buffered table rows with the table inserted at `start_index`.
pub fn compile_table(
    rows: &[String],
    start_index: usize,
    target: &InsertionPoint,
) -> Result<TableOutput, CompileError> {
    let content_rows: Vec<Vec<&str>> = rows
        .iter()
        .map(|row| split_row(row))
        .filter(|cells| !is_divider(cells))
        .collect();

    let row_count = content_rows.len();
    let cells: Vec<&str> = content_rows.into_iter().flatten().collect();
    if row_count == 0 || cells.is_empty() {
        return Err(CompileError::EmptyTable);
    }
    if cells.len() % row_count != 0 {
        return Err(CompileError::InconsistentTable {
            cells: cells.len(),
            rows: row_count,
        });
    }
    let columns = cells.len() / row_count;

    let mut texts = Vec::new();
    let mut styles = Vec::new();
    let mut images = Vec::new();
    let mut index = start_index + TABLE_START;

    // Cells are laid out row-major over the flattened cell list.
    for (position, cell) in cells.iter().enumerate() {
        if position % columns == 0 {
            index += ROW_START;
        }
        index += CELL_START;

        let output = compile_cell(cell, index, target);
        texts.extend(output.insert);
        styles.extend(output.styles);
        images.extend(output.images);
        index = output.next_index;
    }

    let mut requests = Vec::with_capacity(1 + texts.len() + styles.len());
    requests.push(Request::InsertTable {
        rows: row_count,
        columns,
        location: target.location(start_index),
    });
    requests.extend(texts);
    requests.extend(styles);

    Ok(TableOutput {
        rows: row_count,
        columns,
        requests,
        images,
        next_index: index + TABLE_END,
    })
}

fn compile_cell(cell: &str, index: usize, target: &InsertionPoint) -> LineOutput {
    // A page break cannot live inside a cell; keep the dashes as text.
    if classify(cell) == LineKind::PageBreak {
        let run = parse_inline(cell, index, target);
        let (images, styles) = run
            .requests
            .into_iter()
            .partition(|request| matches!(request, Request::InsertInlineImage { .. }));
        return LineOutput {
            insert: Some(Request::insert_text(run.text, target.location(index))),
            styles,
            images,
            next_index: run.next_index,
            ..LineOutput::default()
        };
    }
    let mut output = compile_line(cell, index, false, target);
    output.list_item = None;
    output
}
