//! Resolver chain - turning an evaluated value into document runs
//!
//! Resolvers are asked in order; the first whose `can_resolve` accepts the
//! value produces the runs. Runs come back without a format so the splice
//! inherits the placeholder's formatting.

use crate::value::format_date;
use crate::{EvaluationError, Value};
use doc_model::{DocumentPart, Run};

pub trait ObjectResolver: Send + Sync {
    fn can_resolve(&self, value: &Value) -> bool;

    fn resolve(
        &self,
        part: &DocumentPart,
        expression: &str,
        value: &Value,
    ) -> Result<Vec<Run>, EvaluationError>;
}

fn text_runs(text: String) -> Vec<Run> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Run::new(text)]
    }
}

/// Renders `null` as a fixed text (empty by default)
#[derive(Debug, Clone, Default)]
pub struct NullResolver {
    pub replacement: String,
}

impl NullResolver {
    pub fn new(replacement: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
        }
    }
}

impl ObjectResolver for NullResolver {
    fn can_resolve(&self, value: &Value) -> bool {
        value.is_null()
    }

    fn resolve(&self, _: &DocumentPart, _: &str, _: &Value) -> Result<Vec<Run>, EvaluationError> {
        Ok(text_runs(self.replacement.clone()))
    }
}

/// Renders dates with a `chrono` format string
#[derive(Debug, Clone)]
pub struct DateResolver {
    pub format: String,
}

impl DateResolver {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new("%Y-%m-%d")
    }
}

impl ObjectResolver for DateResolver {
    fn can_resolve(&self, value: &Value) -> bool {
        matches!(value, Value::Date(_))
    }

    fn resolve(&self, _: &DocumentPart, _: &str, value: &Value) -> Result<Vec<Run>, EvaluationError> {
        match value {
            Value::Date(date) => format_date(*date, &self.format).map(text_runs),
            other => Err(EvaluationError::type_mismatch("date", other.type_name())),
        }
    }
}

/// Renders any non-null value through its display string
#[derive(Debug, Clone, Copy, Default)]
pub struct ToStringResolver;

impl ObjectResolver for ToStringResolver {
    fn can_resolve(&self, value: &Value) -> bool {
        !value.is_null()
    }

    fn resolve(&self, _: &DocumentPart, _: &str, value: &Value) -> Result<Vec<Run>, EvaluationError> {
        Ok(text_runs(value.to_display_string()))
    }
}
