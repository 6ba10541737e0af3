//! Document-level Markdown compiler.
//!
//! Threads the running document index through every block and assembles the
//! final batch in three streams:
//!
//! 1. content: text, page breaks and tables, each line followed by its styles
//! 2. inline images, last index first, so earlier images don't shift later ones
//! 3. list bullets, last run first, since creating bullets strips the nesting
//!    tabs and would otherwise shift every later index

use std::cmp::Reverse;

use thiserror::Error;

use super::lines::compile_line;
use super::lists::{ListRun, ListRunTracker};
use super::requests::{InsertionPoint, Request};
use super::tables::{compile_table, TableBuildState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Table has {cells} cells, which cannot be split evenly across {rows} rows")]
    InconsistentTable { cells: usize, rows: usize },

    #[error("Table has no content rows")]
    EmptyTable,
}

/// Ordered `batchUpdate` requests plus the index right after the inserted content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledBatch {
    pub requests: Vec<Request>,
    pub end_index: usize,
}

impl CompiledBatch {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

enum Block<'a> {
    Line(&'a str),
    Table(Vec<String>),
    Blank,
}

impl Block<'_> {
    fn has_content(&self) -> bool {
        !matches!(self, Block::Blank)
    }
}

/// Compiles Markdown into Docs requests anchored at an insertion point.
#[derive(Debug, Clone, Default)]
pub struct MarkdownCompiler {
    target: InsertionPoint,
}

impl MarkdownCompiler {
    pub fn new(target: InsertionPoint) -> Self {
        Self { target }
    }

    pub fn compile(&self, markdown: &str) -> Result<CompiledBatch, CompileError> {
        let blocks = split_blocks(markdown);
        let target = &self.target;

        let mut content = Vec::new();
        let mut images = Vec::new();
        let mut lists = ListRunTracker::new();
        let mut index = target.index;

        for (position, block) in blocks.iter().enumerate() {
            match block {
                Block::Blank => lists.push(None),
                Block::Table(rows) => {
                    lists.push(None);
                    let table = compile_table(rows, index, target)?;
                    content.extend(table.requests);
                    images.extend(table.images);
                    index = table.next_index;
                }
                Block::Line(line) => {
                    let terminate = blocks[position + 1..].iter().any(Block::has_content);
                    let output = compile_line(line, index, terminate, target);
                    content.extend(output.insert);
                    content.extend(output.styles);
                    images.extend(output.images);
                    lists.push(output.list_item);
                    index = output.next_index;
                }
            }
        }

        let runs = lists.finish();
        let image_indices: Vec<usize> = images.iter().filter_map(image_index).collect();

        images.reverse();
        images.sort_by_key(|request| Reverse(image_index(request)));

        // A run of empty or image-only items has an empty range, which the
        // API rejects; those items stay plain paragraphs.
        let bullets = runs
            .iter()
            .rev()
            .map(|run| shift_for_images(run, &image_indices))
            .filter(|run| run.start_index < run.end_index)
            .map(|run| run.to_request(target));

        // Bullets go after the images: creating them strips the nesting tabs
        // and would shift every image index computed above.
        let mut requests = content;
        requests.extend(images);
        requests.extend(bullets);

        tracing::debug!(
            requests = requests.len(),
            list_runs = runs.len(),
            end_index = index,
            "Compiled markdown batch"
        );

        Ok(CompiledBatch {
            requests,
            end_index: index,
        })
    }
}

/// Compiles Markdown for an empty document body (starting at index 1).
pub fn compile(markdown: &str) -> Result<CompiledBatch, CompileError> {
    MarkdownCompiler::default().compile(markdown)
}

fn split_blocks(markdown: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut table = TableBuildState::new();

    for line in markdown.trim().lines() {
        // A trailing double space is a soft break; the line ends here either way.
        let line = line.trim_end();

        if TableBuildState::is_table_line(line) {
            table.push(line);
            continue;
        }
        if !table.is_empty() {
            blocks.push(Block::Table(table.take()));
        }
        if line.trim().is_empty() {
            blocks.push(Block::Blank);
        } else {
            blocks.push(Block::Line(line));
        }
    }
    if !table.is_empty() {
        blocks.push(Block::Table(table.take()));
    }

    blocks
}

fn image_index(request: &Request) -> Option<usize> {
    match request {
        Request::InsertInlineImage { location, .. } => Some(location.index),
        _ => None,
    }
}

// Images are applied before bullets and each one occupies a single index.
fn shift_for_images(run: &ListRun, image_indices: &[usize]) -> ListRun {
    let before = |index: usize| image_indices.iter().filter(|&&i| i < index).count();
    ListRun {
        start_index: run.start_index + before(run.start_index),
        end_index: run.end_index + before(run.end_index),
        ..*run
    }
}
