//! Convenience construction of template content
//!
//! These helpers produce the same structure a template preprocessor would:
//! inline expressions wrapped in placeholder markers, comment range-starts
//! wrapped in processor markers.

use crate::{
    CommentAnchor, CommentBody, CommentId, DocumentPart, Marker, NodeId, Paragraph, Result, Run,
    RunFormat, Table, TableCell, TableRow,
};

impl DocumentPart {
    /// Append an empty paragraph to a container (body or cell)
    pub fn append_paragraph(&mut self, parent: NodeId) -> Result<NodeId> {
        let id = self.add(Paragraph::new());
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Append a paragraph holding one plain run per text
    pub fn append_text_paragraph(&mut self, parent: NodeId, texts: &[&str]) -> Result<NodeId> {
        let paragraph = self.append_paragraph(parent)?;
        for text in texts {
            self.append_run(paragraph, Run::new(*text))?;
        }
        Ok(paragraph)
    }

    pub fn append_run(&mut self, parent: NodeId, run: Run) -> Result<NodeId> {
        let id = self.add(run);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Append a marker wrapping the given runs
    pub fn append_marker(&mut self, parent: NodeId, marker: Marker, runs: Vec<Run>) -> Result<NodeId> {
        let id = self.add(marker);
        self.append_child(parent, id)?;
        for run in runs {
            self.append_run(id, run)?;
        }
        Ok(id)
    }

    /// Append a placeholder marker wrapping one run of `text`
    pub fn append_placeholder(
        &mut self,
        paragraph: NodeId,
        text: &str,
        format: Option<RunFormat>,
    ) -> Result<NodeId> {
        let run = match format {
            Some(format) => Run::formatted(text, format),
            None => Run::new(text),
        };
        self.append_marker(paragraph, Marker::placeholder(), vec![run])
    }

    /// Append an inline-processor marker wrapping one run of `text`
    pub fn append_inline_processor(&mut self, paragraph: NodeId, text: &str) -> Result<NodeId> {
        self.append_marker(paragraph, Marker::inline_processor(), vec![Run::new(text)])
    }

    /// Register a comment body and append its range-start to `paragraph`,
    /// wrapped in a processor marker.
    pub fn append_comment_start(
        &mut self,
        paragraph: NodeId,
        body: CommentBody,
    ) -> Result<(CommentId, NodeId)> {
        let comment = self.comments.insert(body);
        let marker = self.append_processor_marker(paragraph, comment)?;
        Ok((comment, marker))
    }

    /// Append a processor marker wrapping a range-start for an existing comment
    pub fn append_processor_marker(&mut self, parent: NodeId, comment: CommentId) -> Result<NodeId> {
        let marker = self.add(Marker::processor());
        self.append_child(parent, marker)?;
        let start = self.add(CommentAnchor::range_start(comment));
        self.append_child(marker, start)?;
        Ok(marker)
    }

    /// Append a bare (unwrapped) range-start
    pub fn append_bare_comment_start(&mut self, parent: NodeId, comment: CommentId) -> Result<NodeId> {
        let start = self.add(CommentAnchor::range_start(comment));
        self.append_child(parent, start)?;
        Ok(start)
    }

    pub fn append_comment_end(&mut self, parent: NodeId, comment: CommentId) -> Result<NodeId> {
        let end = self.add(CommentAnchor::range_end(comment));
        self.append_child(parent, end)?;
        Ok(end)
    }

    pub fn append_comment_reference(&mut self, parent: NodeId, comment: CommentId) -> Result<NodeId> {
        let reference = self.add(CommentAnchor::reference(comment));
        self.append_child(parent, reference)?;
        Ok(reference)
    }

    /// Append the full anchor set closing a comment: range-end then reference
    pub fn close_comment(&mut self, parent: NodeId, comment: CommentId) -> Result<()> {
        self.append_comment_end(parent, comment)?;
        self.append_comment_reference(parent, comment)?;
        Ok(())
    }

    /// Append a table of `rows` x `columns` cells, each with one empty paragraph.
    /// Returns the table id and the row ids.
    pub fn append_table(
        &mut self,
        parent: NodeId,
        rows: usize,
        columns: usize,
    ) -> Result<(NodeId, Vec<NodeId>)> {
        let table = self.add(Table::new());
        self.append_child(parent, table)?;
        let mut row_ids = Vec::with_capacity(rows);
        for _ in 0..rows {
            let row = self.add(TableRow::new());
            self.append_child(table, row)?;
            for _ in 0..columns {
                let cell = self.add(TableCell::new());
                self.append_child(row, cell)?;
                self.append_paragraph(cell)?;
            }
            row_ids.push(row);
        }
        Ok((table, row_ids))
    }

    /// First paragraph of the `column`th cell of a row
    pub fn cell_paragraph(&self, row: NodeId, column: usize) -> Option<NodeId> {
        let cell = *self.children(row).get(column)?;
        self.children(cell)
            .iter()
            .copied()
            .find(|&c| self.paragraph(c).is_some())
    }
}
