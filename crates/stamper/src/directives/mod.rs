//! Reference directive handlers
//!
//! - `repeat`: `repeatParagraph(list)`, `repeatTableRow(list)`
//! - `displayIf`: conditional removal of paragraphs, rows and tables
//! - `replaceWith`: `replaceWordWith(text)` over a commented range

mod display;
mod repeat;
mod replace;

pub use display::DisplayDirective;
pub use repeat::RepeatDirective;
pub use replace::ReplaceDirective;

use crate::directive::{DirectiveRegistry, HookScope};
use crate::EvaluationError;
use doc_model::NodeId;

/// Register every reference directive under its interface name
pub fn register_defaults(registry: &mut DirectiveRegistry) {
    registry.register("repeat", |scope| Box::new(RepeatDirective::new(scope.clone())));
    registry.register("displayIf", |scope| Box::new(DisplayDirective::new(scope.clone())));
    registry.register("replaceWith", |scope| Box::new(ReplaceDirective::new(scope.clone())));
}

/// Structure around the hook a directive acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Paragraph,
    TableRow,
    Table,
}

impl Target {
    pub(crate) fn locate(self, method: &str, scope: &HookScope) -> Result<NodeId, EvaluationError> {
        let (node, what) = match self {
            Target::Paragraph => (scope.paragraph, "a paragraph"),
            Target::TableRow => (scope.row, "a table row"),
            Target::Table => (scope.table, "a table"),
        };
        node.ok_or_else(|| EvaluationError::Directive(format!("{method} must be used inside {what}")))
    }
}
