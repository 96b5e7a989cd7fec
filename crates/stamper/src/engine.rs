//! Resolution engine - evaluate an expression and turn the outcome into
//! content, routing every failure through the exception policy.

use crate::exception::{ExceptionResolver, Severity};
use crate::expression::{evaluate, parse, EvaluationContext};
use crate::resolver::ObjectResolver;
use crate::{EvaluationError, Result, Value};
use doc_model::{DocumentPart, Run};
use regex_lite::Regex;
use std::sync::{Arc, OnceLock};

fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)^\s*[$#]\{(.*)\}\s*$").ok())
        .as_ref()
}

/// Expression inside `${..}` / `#{..}`; other text is taken as is
pub fn strip_placeholder(raw: &str) -> &str {
    placeholder_pattern()
        .and_then(|re| re.captures(raw))
        .and_then(|caps| caps.get(1))
        .map_or(raw.trim(), |m| m.as_str().trim())
}

/// Outcome of resolving a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Vec<Run>),
    /// Evaluation failed; the runs hold the policy's fallback text
    Fallback(Vec<Run>),
}

impl Resolution {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback(_))
    }

    pub fn into_runs(self) -> Vec<Run> {
        match self {
            Resolution::Resolved(runs) | Resolution::Fallback(runs) => runs,
        }
    }
}

pub struct ResolutionEngine<'a> {
    resolvers: &'a [Arc<dyn ObjectResolver>],
    exceptions: &'a dyn ExceptionResolver,
    severity: Severity,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(
        resolvers: &'a [Arc<dyn ObjectResolver>],
        exceptions: &'a dyn ExceptionResolver,
        severity: Severity,
    ) -> Self {
        Self {
            resolvers,
            exceptions,
            severity,
        }
    }

    /// Evaluate `raw` and render the value as runs.
    ///
    /// Failures become the policy's fallback text; an empty fallback yields
    /// no runs. Errors only when the policy escalates.
    pub fn resolve(
        &self,
        part: &DocumentPart,
        ctx: &mut dyn EvaluationContext,
        raw: &str,
    ) -> Result<Resolution> {
        let expression = strip_placeholder(raw);
        let rendered = evaluate_text(expression, ctx).and_then(|value| self.render(part, expression, &value));
        match rendered {
            Ok(runs) => Ok(Resolution::Resolved(runs)),
            Err(cause) => {
                let text = self.handle(raw, &cause)?;
                let runs = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Run::new(text)]
                };
                Ok(Resolution::Fallback(runs))
            }
        }
    }

    /// Evaluate `raw` for its side effects; `false` if it failed and the
    /// policy let it pass.
    pub fn process(&self, ctx: &mut dyn EvaluationContext, raw: &str) -> Result<bool> {
        match evaluate_text(strip_placeholder(raw), ctx) {
            Ok(_) => Ok(true),
            Err(cause) => {
                self.handle(raw, &cause)?;
                Ok(false)
            }
        }
    }

    fn render(
        &self,
        part: &DocumentPart,
        expression: &str,
        value: &Value,
    ) -> std::result::Result<Vec<Run>, EvaluationError> {
        match self.resolvers.iter().find(|r| r.can_resolve(value)) {
            Some(resolver) => resolver.resolve(part, expression, value),
            None => Err(EvaluationError::NoResolver(value.type_name())),
        }
    }

    fn handle(&self, raw: &str, cause: &EvaluationError) -> Result<String> {
        self.severity.log(raw, cause);
        self.exceptions.resolve(raw, &cause.to_string(), cause)
    }
}

fn evaluate_text(
    expression: &str,
    ctx: &mut dyn EvaluationContext,
) -> std::result::Result<Value, EvaluationError> {
    let expr = parse(expression)?;
    evaluate(&expr, ctx)
}
