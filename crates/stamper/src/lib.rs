//! Stamper - fills document templates from a data context
//!
//! A template carries expressions in placeholder markers (`${name}`), inline
//! processor markers (`#{displayParagraphIf(flag)}`) and comments attached to
//! content. Stamping walks every part of a document, evaluates each hook
//! against its context branch and writes the results back into the runs.
//!
//! # Example
//!
//! ```rust
//! use doc_model::{Document, PartKind};
//! use stamper::{Stamper, StamperConfiguration, Value};
//!
//! let mut document = Document::new();
//! let part = document.main_mut();
//! let para = part.append_text_paragraph(part.root(), &["Hello, "]).unwrap();
//! part.append_placeholder(para, "${name}", None).unwrap();
//!
//! let stamper = Stamper::new(StamperConfiguration::standard());
//! let report = stamper
//!     .stamp(&mut document, Value::map([("name", "Bart")]))
//!     .unwrap();
//!
//! assert_eq!(report.resolved(), 1);
//! assert_eq!(document.main().text_of(para), "Hello, Bart");
//! assert!(report.part(PartKind::Main).is_some());
//! ```

mod accessor;
mod config;
mod context;
pub mod directive;
pub mod directives;
pub mod discovery;
mod engine;
mod error;
mod evaluation;
mod exception;
pub mod expression;
pub mod hook;
mod invoker;
mod resolver;
mod stamper;
mod value;

pub use accessor::{default_accessors, ListAccessor, MapAccessor, ObjectAccessor, PropertyAccessor};
pub use config::{StampOptions, StamperConfiguration};
pub use context::{ContextBranch, ContextTree, Scope};
pub use directive::{CommitScope, DirectiveHandler, DirectiveRegistry, HookScope};
pub use discovery::{collect_comments, CommentRecord, HookIterator};
pub use engine::{strip_placeholder, Resolution, ResolutionEngine};
pub use error::{ContextError, EvaluationError, Result, StampError};
pub use evaluation::UnionContext;
pub use exception::{
    DefaultingExceptionResolver, ExceptionResolver, PassingExceptionResolver, Severity,
    ThrowingExceptionResolver,
};
pub use hook::{CommentHook, ExpressionHook, Hook, HookOutcome};
pub use invoker::{CustomFunction, FunctionRegistry, Interface, Invoker, InvokerTable, MethodSignature};
pub use resolver::{DateResolver, NullResolver, ObjectResolver, ToStringResolver};
pub use stamper::{PartReport, StampReport, Stamper};
pub use value::{builtin_method, format_date, ContextObject, ObjectRef, Value, ValueType};
