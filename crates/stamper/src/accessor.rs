//! Property accessors - how a name is read from or written to a scope value
//!
//! Accessors are consulted in configured order; the first that declares it
//! can handle a `(target, name)` pair wins.

use crate::{EvaluationError, Value};
use std::sync::Arc;

pub trait PropertyAccessor: Send + Sync {
    fn can_read(&self, target: &Value, name: &str) -> bool;

    fn read(&self, target: &Value, name: &str) -> Result<Value, EvaluationError>;

    fn can_write(&self, _target: &Value, _name: &str) -> bool {
        false
    }

    fn write(&self, _target: &mut Value, name: &str, _value: Value) -> Result<(), EvaluationError> {
        Err(EvaluationError::PropertyNotWritable(name.to_string()))
    }
}

/// Keys of map values; any map accepts writes
#[derive(Debug, Default)]
pub struct MapAccessor;

impl PropertyAccessor for MapAccessor {
    fn can_read(&self, target: &Value, name: &str) -> bool {
        target.as_map().is_some_and(|m| m.contains_key(name))
    }

    fn read(&self, target: &Value, name: &str) -> Result<Value, EvaluationError> {
        target
            .as_map()
            .and_then(|m| m.get(name))
            .cloned()
            .ok_or_else(|| EvaluationError::PropertyNotFound(name.to_string()))
    }

    fn can_write(&self, target: &Value, _name: &str) -> bool {
        matches!(target, Value::Map(_))
    }

    fn write(&self, target: &mut Value, name: &str, value: Value) -> Result<(), EvaluationError> {
        match target {
            Value::Map(entries) => {
                entries.insert(name.to_string(), value);
                Ok(())
            }
            _ => Err(EvaluationError::PropertyNotWritable(name.to_string())),
        }
    }
}

/// Properties of user context objects
#[derive(Debug, Default)]
pub struct ObjectAccessor;

impl PropertyAccessor for ObjectAccessor {
    fn can_read(&self, target: &Value, name: &str) -> bool {
        matches!(target, Value::Object(o) if o.has_property(name))
    }

    fn read(&self, target: &Value, name: &str) -> Result<Value, EvaluationError> {
        match target {
            Value::Object(o) => o
                .property(name)
                .ok_or_else(|| EvaluationError::PropertyNotFound(name.to_string())),
            _ => Err(EvaluationError::PropertyNotFound(name.to_string())),
        }
    }

    fn can_write(&self, target: &Value, name: &str) -> bool {
        matches!(target, Value::Object(o) if o.is_writable(name))
    }

    fn write(&self, target: &mut Value, name: &str, value: Value) -> Result<(), EvaluationError> {
        match target {
            Value::Object(o) => o.set_property(name, value),
            _ => Err(EvaluationError::PropertyNotWritable(name.to_string())),
        }
    }
}

/// `size` and `length` pseudo-properties of lists and text
#[derive(Debug, Default)]
pub struct ListAccessor;

impl PropertyAccessor for ListAccessor {
    fn can_read(&self, target: &Value, name: &str) -> bool {
        matches!(name, "size" | "length") && matches!(target, Value::List(_) | Value::Text(_))
    }

    fn read(&self, target: &Value, name: &str) -> Result<Value, EvaluationError> {
        match target {
            Value::List(items) => Ok(Value::from(items.len())),
            Value::Text(s) => Ok(Value::from(s.chars().count())),
            _ => Err(EvaluationError::PropertyNotFound(name.to_string())),
        }
    }
}

/// The accessor chain used when none is configured
pub fn default_accessors() -> Vec<Arc<dyn PropertyAccessor>> {
    vec![
        Arc::new(MapAccessor),
        Arc::new(ObjectAccessor),
        Arc::new(ListAccessor),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_accessor() {
        let mut target = Value::map([("name", "Bart")]);
        assert!(MapAccessor.can_read(&target, "name"));
        assert!(!MapAccessor.can_read(&target, "age"));
        assert!(MapAccessor.can_write(&target, "age"));
        MapAccessor.write(&mut target, "age", Value::from(10)).unwrap();
        assert_eq!(MapAccessor.read(&target, "age").unwrap(), Value::from(10));
    }

    #[test]
    fn test_list_accessor() {
        let list = Value::from(vec!["a", "b"]);
        assert!(ListAccessor.can_read(&list, "size"));
        assert_eq!(ListAccessor.read(&list, "length").unwrap(), Value::from(2));
        assert!(!ListAccessor.can_write(&list, "size"));
        assert!(!ListAccessor.can_read(&Value::from(3), "size"));
    }

    #[test]
    fn test_object_accessor_rejects_plain_values() {
        assert!(!ObjectAccessor.can_read(&Value::map([("x", 1)]), "x"));
    }
}
