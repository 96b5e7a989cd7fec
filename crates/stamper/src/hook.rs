//! Hooks - one executable unit per stamping marker or comment
//!
//! A hook evaluates its expression against its context branch, applies the
//! result to the document and removes its own marker or comment once it has
//! succeeded.

use crate::config::StamperConfiguration;
use crate::directive::{CommitScope, HookScope};
use crate::discovery::CommentRecord;
use crate::evaluation::UnionContext;
use crate::{ContextTree, Result, StampError};
use doc_model::{DocumentPart, MarkerKind, NodeId};
use edit_engine::{RunModel, RunSplicer};
use std::collections::HashSet;
use tracing::debug;

/// What running a hook did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// Expression applied and the hook consumed
    Resolved,
    /// Expression failed but the placeholder was still replaced
    Fallback,
    /// Expression failed and the document is unchanged
    Failed,
}

impl HookOutcome {
    pub fn mutated(&self) -> bool {
        !matches!(self, HookOutcome::Failed)
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, HookOutcome::Resolved)
    }
}

#[derive(Debug, Clone)]
pub enum Hook {
    Expression(ExpressionHook),
    Comment(CommentHook),
}

impl Hook {
    /// Node the hook is anchored to: its marker, or a bare comment's start
    pub fn id(&self) -> NodeId {
        match self {
            Hook::Expression(hook) => hook.marker,
            Hook::Comment(hook) => hook.marker.unwrap_or(hook.comment.start),
        }
    }

    pub fn context_key(&self) -> &str {
        match self {
            Hook::Expression(hook) => &hook.context_key,
            Hook::Comment(hook) => &hook.context_key,
        }
    }

    pub fn set_context_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        match self {
            Hook::Expression(hook) => hook.context_key = key,
            Hook::Comment(hook) => hook.context_key = key,
        }
    }

    pub fn run(
        &self,
        part: &mut DocumentPart,
        tree: &mut ContextTree,
        config: &StamperConfiguration,
    ) -> Result<HookOutcome> {
        match self {
            Hook::Expression(hook) => hook.run(part, tree, config),
            Hook::Comment(hook) => hook.run(part, tree, config),
        }
    }
}

/// Placeholder or inline processor living inside a paragraph
#[derive(Debug, Clone)]
pub struct ExpressionHook {
    pub marker: NodeId,
    pub kind: MarkerKind,
    pub paragraph: NodeId,
    pub context_key: String,
}

impl ExpressionHook {
    pub fn new(marker: NodeId, kind: MarkerKind, paragraph: NodeId, context_key: &str) -> Self {
        Self {
            marker,
            kind,
            paragraph,
            context_key: context_key.to_string(),
        }
    }

    pub fn run(
        &self,
        part: &mut DocumentPart,
        tree: &mut ContextTree,
        config: &StamperConfiguration,
    ) -> Result<HookOutcome> {
        let branch = tree.find(&self.context_key)?.clone();
        let raw = part.text_of(self.marker);
        let scope = HookScope::locate(part, self.marker, None, &self.context_key);
        let mut ctx = UnionContext::new(
            branch,
            config.accessors(),
            config.directives().instantiate(&scope),
            config.interfaces(),
            config.functions(),
        );
        let engine = config.engine();

        match self.kind {
            MarkerKind::Placeholder => {
                let resolution = engine.resolve(part, &mut ctx, &raw)?;
                let fallback = resolution.is_fallback();
                self.splice(part, &raw, resolution.into_runs(), config)?;
                if fallback {
                    return Ok(HookOutcome::Fallback);
                }
                ctx.commit(part, &mut CommitScope::new(tree, &scope))?;
                Ok(HookOutcome::Resolved)
            }
            MarkerKind::InlineProcessor | MarkerKind::Processor => {
                if !engine.process(&mut ctx, &raw)? {
                    return Ok(HookOutcome::Failed);
                }
                ctx.commit(part, &mut CommitScope::new(tree, &scope))?;
                part.discard_subtree(self.marker);
                Ok(HookOutcome::Resolved)
            }
        }
    }

    /// Unwrap the marker and splice `runs` over the text it held
    fn splice(
        &self,
        part: &mut DocumentPart,
        raw: &str,
        runs: Vec<doc_model::Run>,
        config: &StamperConfiguration,
    ) -> Result<()> {
        let inside: HashSet<NodeId> = part.descendants(self.marker).into_iter().collect();
        let model = RunModel::of(part, self.paragraph)?;
        let start = model
            .spans()
            .iter()
            .find(|span| inside.contains(&span.run))
            .map(|span| span.start);

        part.replace_with_children(self.marker)?;
        let Some(start) = start else {
            debug!(marker = %self.marker, "placeholder marker holds no text");
            return Ok(());
        };
        let end = start + raw.chars().count();
        RunSplicer::replace_expected(part, self.paragraph, start, end, raw, runs)?;
        if config.options().merge_similar_runs {
            RunSplicer::merge_similar_runs(part, self.paragraph)?;
        }
        Ok(())
    }
}

/// Directive expression held in a comment's body
#[derive(Debug, Clone)]
pub struct CommentHook {
    pub comment: CommentRecord,
    /// Processor marker wrapping the range-start, if any
    pub marker: Option<NodeId>,
    pub paragraph: Option<NodeId>,
    pub context_key: String,
}

impl CommentHook {
    pub fn new(
        comment: CommentRecord,
        marker: Option<NodeId>,
        paragraph: Option<NodeId>,
        context_key: &str,
    ) -> Self {
        Self {
            comment,
            marker,
            paragraph,
            context_key: context_key.to_string(),
        }
    }

    pub fn run(
        &self,
        part: &mut DocumentPart,
        tree: &mut ContextTree,
        config: &StamperConfiguration,
    ) -> Result<HookOutcome> {
        let branch = tree.find(&self.context_key)?.clone();
        let expression = part
            .comments
            .get(self.comment.id)
            .map(|body| body.text())
            .ok_or_else(|| {
                StampError::MalformedDocument(format!("comment {} has no body", self.comment.id))
            })?;
        let node = self.marker.unwrap_or(self.comment.start);
        let scope = HookScope::locate(part, node, Some(self.comment.clone()), &self.context_key);
        let mut ctx = UnionContext::new(
            branch,
            config.accessors(),
            config.directives().instantiate(&scope),
            config.interfaces(),
            config.functions(),
        );

        if !config.engine().process(&mut ctx, &expression)? {
            return Ok(HookOutcome::Failed);
        }
        ctx.commit(part, &mut CommitScope::new(tree, &scope))?;

        // The directive may already have removed any of these
        if let Some(marker) = self.marker {
            part.discard_subtree(marker);
        }
        part.discard_subtree(self.comment.start);
        part.discard_subtree(self.comment.end);
        if let Some(reference) = self.comment.reference {
            part.discard_subtree(reference);
        }
        part.comments.remove(self.comment.id);
        Ok(HookOutcome::Resolved)
    }
}
