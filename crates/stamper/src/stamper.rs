//! Stamping driver - runs the hook loop over every part of a document

use crate::config::StamperConfiguration;
use crate::discovery::HookIterator;
use crate::hook::HookOutcome;
use crate::{ContextTree, Result, StampError, Value};
use doc_model::{Document, DocumentPart, NodeId, PartKind};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Counts for one stamped part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartReport {
    pub part: PartKind,
    /// Hooks that applied their expression
    pub resolved: usize,
    /// Hooks handled by the exception policy
    pub failed: usize,
    /// Scans of the part, the final clean scan included
    pub passes: usize,
    /// Context branches registered, the root branch included
    pub branches: usize,
}

impl PartReport {
    fn new(part: PartKind) -> Self {
        Self {
            part,
            resolved: 0,
            failed: 0,
            passes: 0,
            branches: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StampReport {
    pub parts: Vec<PartReport>,
}

impl StampReport {
    pub fn resolved(&self) -> usize {
        self.parts.iter().map(|p| p.resolved).sum()
    }

    pub fn failed(&self) -> usize {
        self.parts.iter().map(|p| p.failed).sum()
    }

    pub fn part(&self, kind: PartKind) -> Option<&PartReport> {
        self.parts.iter().find(|p| p.part == kind)
    }
}

#[derive(Debug, Clone)]
pub struct Stamper {
    config: StamperConfiguration,
}

impl Stamper {
    pub fn new(config: StamperConfiguration) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StamperConfiguration {
        &self.config
    }

    /// Stamp every part of `document` against `root`, in part order
    pub fn stamp(&self, document: &mut Document, root: Value) -> Result<StampReport> {
        let mut report = StampReport::default();
        for part in document.parts_mut() {
            report.parts.push(self.stamp_part(part, root.clone())?);
        }
        Ok(report)
    }

    /// Run the hook loop over one part with a fresh context tree.
    ///
    /// After a hook changes the document the part is scanned again from the
    /// start. Hooks that failed without changing anything are skipped on
    /// later scans, so every hook runs once.
    pub fn stamp_part(&self, part: &mut DocumentPart, root: Value) -> Result<PartReport> {
        let max_passes = self.config.options().max_passes;
        let mut tree = ContextTree::new(root);
        let mut report = PartReport::new(part.kind);
        let mut skipped: HashSet<NodeId> = HashSet::new();
        let mut hooks = HookIterator::collect(part)?;
        debug!(part = %part.kind, hooks = hooks.len(), "stamping part");

        'scan: loop {
            report.passes += 1;
            if report.passes > max_passes {
                return Err(StampError::Configuration(format!(
                    "{} still has hooks after {max_passes} passes",
                    part.kind
                )));
            }

            while let Some(hook) = hooks.next() {
                let id = hook.id();
                if skipped.contains(&id) {
                    continue;
                }
                trace!(hook = %id, context = hook.context_key(), "running hook");
                let outcome = hook.run(part, &mut tree, &self.config)?;
                match outcome {
                    HookOutcome::Resolved => report.resolved += 1,
                    HookOutcome::Fallback => report.failed += 1,
                    HookOutcome::Failed => {
                        report.failed += 1;
                        skipped.insert(id);
                    }
                }
                if outcome.mutated() {
                    hooks.reset(part)?;
                    continue 'scan;
                }
            }
            break;
        }

        report.branches = tree.len();
        debug!(
            part = %part.kind,
            resolved = report.resolved,
            failed = report.failed,
            passes = report.passes,
            "part stamped"
        );
        Ok(report)
    }
}
