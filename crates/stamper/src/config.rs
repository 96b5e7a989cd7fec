//! Stamper configuration
//!
//! [`StampOptions`] holds the plain settings and can be loaded from JSON.
//! [`StamperConfiguration`] adds the pluggable parts: accessors, resolvers,
//! the exception policy, directives, interfaces and functions. It is built
//! once and only read while stamping.

use crate::accessor::{default_accessors, PropertyAccessor};
use crate::directive::{DirectiveHandler, DirectiveRegistry, HookScope};
use crate::directives;
use crate::engine::ResolutionEngine;
use crate::exception::{ExceptionResolver, Severity, ThrowingExceptionResolver};
use crate::invoker::{FunctionRegistry, Interface};
use crate::resolver::{DateResolver, NullResolver, ObjectResolver, ToStringResolver};
use crate::{EvaluationError, Result, StampError, Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampOptions {
    /// Join equally formatted neighbour runs after each placeholder splice
    pub merge_similar_runs: bool,
    /// Log level for failures the exception policy handles
    pub unresolved_severity: Severity,
    /// Text rendered for `null` values
    pub null_replacement: String,
    /// `chrono` format for date values
    pub date_format: String,
    /// Upper bound on hook scans per part
    pub max_passes: usize,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            merge_similar_runs: true,
            unresolved_severity: Severity::Error,
            null_replacement: String::new(),
            date_format: "%Y-%m-%d".to_string(),
            max_passes: 10_000,
        }
    }
}

impl StampOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| StampError::Configuration(format!("invalid options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(StampError::Configuration("max_passes must be at least 1".into()));
        }
        Ok(())
    }

    pub fn with_merge_similar_runs(mut self, merge: bool) -> Self {
        self.merge_similar_runs = merge;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.unresolved_severity = severity;
        self
    }

    pub fn with_null_replacement(mut self, text: impl Into<String>) -> Self {
        self.null_replacement = text.into();
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_max_passes(mut self, max: usize) -> Self {
        self.max_passes = max;
        self
    }
}

#[derive(Clone)]
pub struct StamperConfiguration {
    options: StampOptions,
    accessors: Vec<Arc<dyn PropertyAccessor>>,
    custom_resolvers: Vec<Arc<dyn ObjectResolver>>,
    resolvers: Vec<Arc<dyn ObjectResolver>>,
    exception_resolver: Arc<dyn ExceptionResolver>,
    directives: DirectiveRegistry,
    interfaces: Vec<Arc<dyn Interface>>,
    functions: FunctionRegistry,
}

impl StamperConfiguration {
    /// Default accessors and resolvers, throwing policy, no directives
    pub fn new() -> Self {
        let options = StampOptions::default();
        Self {
            resolvers: default_resolvers(&options),
            options,
            accessors: default_accessors(),
            custom_resolvers: Vec::new(),
            exception_resolver: Arc::new(ThrowingExceptionResolver),
            directives: DirectiveRegistry::new(),
            interfaces: Vec::new(),
            functions: FunctionRegistry::new(),
        }
    }

    /// [`new`](Self::new) plus the reference directives
    pub fn standard() -> Self {
        let mut config = Self::new();
        directives::register_defaults(&mut config.directives);
        config
    }

    /// Install options, rejecting them if they fail validation
    pub fn with_options(mut self, options: StampOptions) -> Result<Self> {
        options.validate()?;
        self.options = options;
        self.rebuild_resolvers();
        Ok(self)
    }

    /// Append an accessor after the ones already configured
    pub fn with_accessor(mut self, accessor: impl PropertyAccessor + 'static) -> Self {
        self.accessors.push(Arc::new(accessor));
        self
    }

    /// Replace the accessor chain
    pub fn with_accessors(mut self, accessors: Vec<Arc<dyn PropertyAccessor>>) -> Self {
        self.accessors = accessors;
        self
    }

    /// Add a resolver, asked before the built-in ones
    pub fn with_resolver(mut self, resolver: impl ObjectResolver + 'static) -> Self {
        self.custom_resolvers.push(Arc::new(resolver));
        self.rebuild_resolvers();
        self
    }

    pub fn with_exception_resolver(mut self, resolver: impl ExceptionResolver + 'static) -> Self {
        self.exception_resolver = Arc::new(resolver);
        self
    }

    pub fn with_directive<F>(mut self, interface: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&HookScope) -> Box<dyn DirectiveHandler> + Send + Sync + 'static,
    {
        self.directives.register(interface, factory);
        self
    }

    pub fn with_interface(mut self, interface: impl Interface + 'static) -> Self {
        self.interfaces.push(Arc::new(interface));
        self
    }

    pub fn with_function<F>(
        mut self,
        name: impl Into<String>,
        params: impl Into<Vec<ValueType>>,
        body: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        self.functions.register(name, params, body);
        self
    }

    pub fn options(&self) -> &StampOptions {
        &self.options
    }

    pub fn accessors(&self) -> &[Arc<dyn PropertyAccessor>] {
        &self.accessors
    }

    /// Custom resolvers followed by the null, date and display resolvers
    pub fn resolver_chain(&self) -> &[Arc<dyn ObjectResolver>] {
        &self.resolvers
    }

    pub fn exception_resolver(&self) -> &dyn ExceptionResolver {
        self.exception_resolver.as_ref()
    }

    pub fn directives(&self) -> &DirectiveRegistry {
        &self.directives
    }

    pub fn interfaces(&self) -> &[Arc<dyn Interface>] {
        &self.interfaces
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn engine(&self) -> ResolutionEngine<'_> {
        ResolutionEngine::new(
            &self.resolvers,
            self.exception_resolver.as_ref(),
            self.options.unresolved_severity,
        )
    }

    fn rebuild_resolvers(&mut self) {
        let mut resolvers = self.custom_resolvers.clone();
        resolvers.extend(default_resolvers(&self.options));
        self.resolvers = resolvers;
    }
}

fn default_resolvers(options: &StampOptions) -> Vec<Arc<dyn ObjectResolver>> {
    vec![
        Arc::new(NullResolver::new(options.null_replacement.clone())),
        Arc::new(DateResolver::new(options.date_format.clone())),
        Arc::new(ToStringResolver),
    ]
}

impl Default for StamperConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StamperConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StamperConfiguration")
            .field("options", &self.options)
            .field("accessors", &self.accessors.len())
            .field("resolvers", &self.resolvers.len())
            .field("directives", &self.directives)
            .field("interfaces", &self.interfaces.len())
            .field("functions", &self.functions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_json_fills_defaults() {
        let options = StampOptions::from_json(
            r#"{"merge_similar_runs": false, "unresolved_severity": "warn"}"#,
        )
        .unwrap();
        assert!(!options.merge_similar_runs);
        assert_eq!(options.unresolved_severity, Severity::Warn);
        assert_eq!(options.date_format, "%Y-%m-%d");
        assert_eq!(options.max_passes, 10_000);
    }

    #[test]
    fn test_invalid_options_rejected() {
        assert!(matches!(
            StampOptions::from_json(r#"{"max_passes": 0}"#),
            Err(StampError::Configuration(_))
        ));
        assert!(matches!(
            StampOptions::from_json(r#"{"unresolved_severity": "loud"}"#),
            Err(StampError::Configuration(_))
        ));
    }

    #[derive(Debug)]
    struct Shouting;

    impl ObjectResolver for Shouting {
        fn can_resolve(&self, value: &Value) -> bool {
            matches!(value, Value::Text(_))
        }

        fn resolve(
            &self,
            _: &doc_model::DocumentPart,
            _: &str,
            value: &Value,
        ) -> std::result::Result<Vec<doc_model::Run>, EvaluationError> {
            Ok(vec![doc_model::Run::new(value.to_display_string().to_uppercase())])
        }
    }

    #[test]
    fn test_custom_resolvers_come_first() {
        let config = StamperConfiguration::new()
            .with_resolver(Shouting)
            .with_options(StampOptions::default().with_null_replacement("-"))
            .unwrap();
        let chain = config.resolver_chain();
        assert_eq!(chain.len(), 4);
        assert!(chain[0].can_resolve(&Value::from("x")));
        assert!(chain[1].can_resolve(&Value::Null));
    }

    #[test]
    fn test_with_options_rejects_zero_passes() {
        let result = StamperConfiguration::standard()
            .with_options(StampOptions::default().with_max_passes(0));
        assert!(matches!(result, Err(StampError::Configuration(_))));
    }

    #[test]
    fn test_standard_registers_reference_directives() {
        let config = StamperConfiguration::standard();
        assert!(config.directives().contains("repeat"));
        assert!(config.directives().contains("displayIf"));
        assert!(config.directives().contains("replaceWith"));
        assert!(StamperConfiguration::new().directives().is_empty());
    }
}
