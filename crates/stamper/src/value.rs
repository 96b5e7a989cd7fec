//! Dynamic values that templates are stamped with

use crate::EvaluationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// A user object exposing properties and methods to expressions.
///
/// Methods take `&self`; objects that need to change state on writes or
/// calls use interior mutability.
pub trait ContextObject: fmt::Debug {
    /// Name used in error messages and by `type_name`
    fn type_name(&self) -> &str;

    /// Read a property; `None` if the object has no such property
    fn property(&self, name: &str) -> Option<Value>;

    fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    fn is_writable(&self, _name: &str) -> bool {
        false
    }

    fn set_property(&self, name: &str, _value: Value) -> Result<(), EvaluationError> {
        Err(EvaluationError::PropertyNotWritable(name.to_string()))
    }

    /// Invoke a method; `None` if the object does not offer it
    fn call(&self, _name: &str, _args: &[Value]) -> Option<Result<Value, EvaluationError>> {
        None
    }

    /// Text used when the object itself is rendered
    fn display(&self) -> String {
        self.type_name().to_string()
    }
}

/// Shared handle to a context object
#[derive(Debug, Clone)]
pub struct ObjectRef(pub Rc<dyn ContextObject>);

impl ObjectRef {
    pub fn new(object: impl ContextObject + 'static) -> Self {
        Self(Rc::new(object))
    }
}

impl std::ops::Deref for ObjectRef {
    type Target = dyn ContextObject;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

/// Declared type of a method parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Wildcard, accepts every value
    Any,
    Boolean,
    Number,
    Text,
    Date,
    List,
    Map,
    Object,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Any => "any",
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::Text => "text",
            ValueType::Date => "date",
            ValueType::List => "list",
            ValueType::Map => "map",
            ValueType::Object => "object",
        }
    }

    /// Whether an argument can be passed for a parameter of this type.
    /// `Null` is assignable to every type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value.value_type()) {
            (ValueType::Any, _) | (_, None) => true,
            (expected, Some(actual)) => *expected == actual,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dynamically typed value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(ObjectRef),
}

impl Value {
    /// Build a map value from key/value pairs
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn object(object: impl ContextObject + 'static) -> Self {
        Value::Object(ObjectRef::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type; `None` for null
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Number(_) => Some(ValueType::Number),
            Value::Text(_) => Some(ValueType::Text),
            Value::Date(_) => Some(ValueType::Date),
            Value::List(_) => Some(ValueType::List),
            Value::Map(_) => Some(ValueType::Map),
            Value::Object(_) => Some(ValueType::Object),
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Object(o) => o.type_name().to_string(),
            other => other
                .value_type()
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    /// Truthiness used by conditionals and logical operators
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Date(_) | Value::Object(_) => true,
        }
    }

    /// Convert to the text that lands in the document
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_display_string).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Map(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{k}={}", v.to_display_string()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Object(o) => o.display(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Integers render without a decimal part
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl<V: Into<Value>> From<HashMap<String, V>> for Value {
    fn from(entries: HashMap<String, V>) -> Self {
        Value::map(entries)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// =============================================================================
// Built-in methods
// =============================================================================

/// Methods every value answers to, tried after context-object methods.
/// Returns `None` if the receiver has no such method.
pub fn builtin_method(
    receiver: &Value,
    name: &str,
    args: &[Value],
) -> Option<Result<Value, EvaluationError>> {
    let result = match (receiver, name, args) {
        (Value::List(items), "size" | "length", []) => Ok(Value::from(items.len())),
        (Value::Map(entries), "size", []) => Ok(Value::from(entries.len())),
        (Value::Text(s), "size" | "length", []) => Ok(Value::from(s.chars().count())),
        (Value::List(items), "isEmpty", []) => Ok(Value::Boolean(items.is_empty())),
        (Value::Map(entries), "isEmpty", []) => Ok(Value::Boolean(entries.is_empty())),
        (Value::Text(s), "isEmpty", []) => Ok(Value::Boolean(s.is_empty())),
        (Value::Text(s), "toUpperCase", []) => Ok(Value::Text(s.to_uppercase())),
        (Value::Text(s), "toLowerCase", []) => Ok(Value::Text(s.to_lowercase())),
        (Value::Text(s), "trim", []) => Ok(Value::Text(s.trim().to_string())),
        (Value::Text(s), "contains", [needle]) => {
            Ok(Value::Boolean(s.contains(&needle.to_display_string())))
        }
        (Value::Text(s), "startsWith", [prefix]) => {
            Ok(Value::Boolean(s.starts_with(&prefix.to_display_string())))
        }
        (Value::Text(s), "endsWith", [suffix]) => {
            Ok(Value::Boolean(s.ends_with(&suffix.to_display_string())))
        }
        (Value::List(items), "contains", [needle]) => Ok(Value::Boolean(items.contains(needle))),
        (Value::List(items), "get", [index]) => list_get(items, index),
        (Value::Map(entries), "get", [key]) => Ok(entries
            .get(&key.to_display_string())
            .cloned()
            .unwrap_or(Value::Null)),
        (Value::Map(entries), "containsKey", [key]) => {
            Ok(Value::Boolean(entries.contains_key(&key.to_display_string())))
        }
        (Value::Map(entries), "keys", []) => Ok(Value::List(
            entries.keys().cloned().map(Value::Text).collect(),
        )),
        (Value::Date(d), "format", [Value::Text(pattern)]) => format_date(*d, pattern).map(Value::Text),
        (Value::Date(d), "year", []) => Ok(Value::from(chrono::Datelike::year(d) as i64)),
        (_, "toString", []) => Ok(Value::Text(receiver.to_display_string())),
        _ => return None,
    };
    Some(result)
}

/// Format a date with a `chrono` pattern, rejecting invalid patterns
pub fn format_date(date: NaiveDate, pattern: &str) -> Result<String, EvaluationError> {
    use std::fmt::Write;

    let mut out = String::new();
    write!(out, "{}", date.format(pattern))
        .map_err(|_| EvaluationError::Function(format!("invalid date format '{pattern}'")))?;
    Ok(out)
}

/// Index into a list with a numeric index
pub fn list_get(items: &[Value], index: &Value) -> Result<Value, EvaluationError> {
    let Value::Number(n) = index else {
        return Err(EvaluationError::type_mismatch("number", index.type_name()));
    };
    if !n.is_finite() || n.fract() != 0.0 {
        return Err(EvaluationError::type_mismatch("integer index", n.to_string()));
    }
    let i = *n as i64;
    if i < 0 || i as usize >= items.len() {
        return Err(EvaluationError::IndexOutOfBounds {
            index: i,
            len: items.len(),
        });
    }
    Ok(items[i as usize].clone())
}
