//! Exception policies for expressions that could not be resolved

use crate::{EvaluationError, Result, StampError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Level at which handled failures are logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warn,
    Info,
    Debug,
    Off,
}

impl Severity {
    pub fn log(&self, expression: &str, cause: &EvaluationError) {
        match self {
            Severity::Error => error!(expression, %cause, "expression could not be resolved"),
            Severity::Warn => warn!(expression, %cause, "expression could not be resolved"),
            Severity::Info => info!(expression, %cause, "expression could not be resolved"),
            Severity::Debug => debug!(expression, %cause, "expression could not be resolved"),
            Severity::Off => {}
        }
    }
}

/// Decides what an unresolved expression turns into.
///
/// `expression` is the raw placeholder or comment text. Returning `Err`
/// aborts the stamping pass.
pub trait ExceptionResolver: Send + Sync {
    fn resolve(&self, expression: &str, message: &str, cause: &EvaluationError) -> Result<String>;
}

/// Escalates every failure
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrowingExceptionResolver;

impl ExceptionResolver for ThrowingExceptionResolver {
    fn resolve(&self, expression: &str, message: &str, _cause: &EvaluationError) -> Result<String> {
        Err(StampError::Unresolved {
            expression: expression.to_string(),
            message: message.to_string(),
        })
    }
}

/// Leaves the original placeholder text in the document
#[derive(Debug, Clone, Copy, Default)]
pub struct PassingExceptionResolver;

impl ExceptionResolver for PassingExceptionResolver {
    fn resolve(&self, expression: &str, _message: &str, _cause: &EvaluationError) -> Result<String> {
        Ok(expression.to_string())
    }
}

/// Substitutes a fixed text, empty for "remove the placeholder"
#[derive(Debug, Clone, Default)]
pub struct DefaultingExceptionResolver {
    pub text: String,
}

impl DefaultingExceptionResolver {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl ExceptionResolver for DefaultingExceptionResolver {
    fn resolve(&self, _expression: &str, _message: &str, _cause: &EvaluationError) -> Result<String> {
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cause() -> EvaluationError {
        EvaluationError::PropertyNotFound("name".into())
    }

    #[test]
    fn test_policies() {
        let message = cause().to_string();
        assert!(matches!(
            ThrowingExceptionResolver.resolve("${name}", &message, &cause()),
            Err(StampError::Unresolved { expression, .. }) if expression == "${name}"
        ));
        assert_eq!(
            PassingExceptionResolver.resolve("${name}", &message, &cause()).unwrap(),
            "${name}"
        );
        assert_eq!(
            DefaultingExceptionResolver::new("-")
                .resolve("${name}", &message, &cause())
                .unwrap(),
            "-"
        );
    }

    #[test]
    fn test_severity_serde() {
        let severity: Severity = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(severity, Severity::Warn);
        assert_eq!(serde_json::to_string(&Severity::Off).unwrap(), "\"off\"");
        assert_eq!(Severity::default(), Severity::Error);
    }
}
