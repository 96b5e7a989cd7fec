//! Run splicing - replace a logical text range with new runs
//!
//! The range is given in paragraph char offsets. Characters outside the
//! range keep their runs and formatting; the replacement runs are inserted
//! once, contiguously, where the range began.

use crate::{EditError, Result, RunModel};
use doc_model::{DocModelError, DocumentPart, NodeId, Run};
use tracing::debug;

/// Run-level rewriting of paragraph text
pub struct RunSplicer;

impl RunSplicer {
    /// Replace the characters `[start, end)` of a paragraph with `replacement`.
    ///
    /// Replacement runs without a format inherit the first touched run's
    /// format. Returns `false` when the range touches no run (empty range).
    pub fn replace_range(
        part: &mut DocumentPart,
        paragraph: NodeId,
        start: usize,
        end: usize,
        mut replacement: Vec<Run>,
    ) -> Result<bool> {
        let model = RunModel::of(part, paragraph)?;
        let len = model.char_len();
        if start > end || end > len {
            return Err(EditError::InvalidRange { start, end, len });
        }

        let affected = model.runs_in(start..end);
        let (Some(first), Some(last)) = (affected.first().copied(), affected.last().copied())
        else {
            debug!(%paragraph, start, end, "empty splice range, nothing replaced");
            return Ok(false);
        };

        let inherited = part
            .run(first.run)
            .and_then(|run| run.format.clone());
        for run in &mut replacement {
            if run.format.is_none() {
                run.format = inherited.clone();
            }
        }

        // Left text of the first run and right text of the last run survive.
        let first_text = run_text(part, first.run)?;
        let left: String = first_text.chars().take(start - first.start).collect();
        let last_text = run_text(part, last.run)?;
        let right: String = last_text.chars().skip(end - last.start).collect();

        let mut anchor = first.run;
        if first.run == last.run {
            // Single run: whole, prefix, suffix or interior match. The run keeps
            // the left text; the right text becomes a fragment after the
            // inserted content.
            set_run_text(part, first.run, left.clone())?;
            for run in replacement {
                let id = part.add(run);
                part.insert_after(anchor, id)?;
                anchor = id;
            }
            if !right.is_empty() {
                let fragment = part
                    .run(first.run)
                    .map(|run| run.fragment(right))
                    .ok_or(DocModelError::NodeNotFound(first.run))?;
                let id = part.add(fragment);
                part.insert_after(anchor, id)?;
            }
        } else {
            set_run_text(part, first.run, left.clone())?;
            set_run_text(part, last.run, right.clone())?;
            for span in &affected[1..affected.len() - 1] {
                part.remove_subtree(span.run)?;
            }
            for run in replacement {
                let id = part.add(run);
                part.insert_after(anchor, id)?;
                anchor = id;
            }
            if right.is_empty() {
                part.remove_subtree(last.run)?;
            }
        }

        if left.is_empty() {
            part.remove_subtree(first.run)?;
        }
        Ok(true)
    }

    /// Replace the first literal occurrence of `needle` in the paragraph text.
    ///
    /// A missing needle is a no-op returning `false`; the paragraph is left
    /// untouched.
    pub fn replace_text(
        part: &mut DocumentPart,
        paragraph: NodeId,
        needle: &str,
        replacement: Vec<Run>,
    ) -> Result<bool> {
        let model = RunModel::of(part, paragraph)?;
        let Some(start) = model.find(needle) else {
            debug!(%paragraph, needle, "text not present, splice skipped");
            return Ok(false);
        };
        let end = start + needle.chars().count();
        Self::replace_range(part, paragraph, start, end, replacement)
    }

    /// Replace `[start, end)` if it still reads `expected`, otherwise fall back
    /// to a literal search for `expected`.
    pub fn replace_expected(
        part: &mut DocumentPart,
        paragraph: NodeId,
        start: usize,
        end: usize,
        expected: &str,
        replacement: Vec<Run>,
    ) -> Result<bool> {
        let model = RunModel::of(part, paragraph)?;
        if model.slice(start, end).as_deref() == Some(expected) {
            Self::replace_range(part, paragraph, start, end, replacement)
        } else {
            Self::replace_text(part, paragraph, expected, replacement)
        }
    }

    /// Join adjacent sibling runs of a paragraph that share a format.
    ///
    /// Returns the number of runs merged away.
    pub fn merge_similar_runs(part: &mut DocumentPart, paragraph: NodeId) -> Result<usize> {
        if part.paragraph(paragraph).is_none() {
            return Err(EditError::ParagraphNotFound(paragraph));
        }

        let children = part.children(paragraph).to_vec();
        let mut merged = 0;
        let mut current: Option<NodeId> = None;
        for child in children {
            let Some(run) = part.run(child) else {
                current = None;
                continue;
            };
            let format = run.format.clone();
            let text = run.text.clone();

            match current {
                Some(target) if part.run(target).is_some_and(|t| t.format == format) => {
                    if let Some(target_run) = part.run_mut(target) {
                        target_run.text.push_str(&text);
                    }
                    part.remove_subtree(child)?;
                    merged += 1;
                }
                _ => current = Some(child),
            }
        }
        Ok(merged)
    }
}

fn run_text(part: &DocumentPart, run: NodeId) -> Result<String> {
    part.run(run)
        .map(|r| r.text.clone())
        .ok_or(EditError::DocModel(DocModelError::NodeNotFound(run)))
}

fn set_run_text(part: &mut DocumentPart, run: NodeId, text: String) -> Result<()> {
    let target = part
        .run_mut(run)
        .ok_or(EditError::DocModel(DocModelError::NodeNotFound(run)))?;
    target.text = text;
    Ok(())
}
