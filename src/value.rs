//! Runtime values available to templates
//!
//! Context values are only known at render time, so they are modeled as a closed
//! tagged union. Contract checks match on it exhaustively.

use std::collections::BTreeMap;
use std::fmt;

/// Name of the root object type every untyped JSON object is given
pub const ROOT_OBJECT_TYPE: &str = "Object";

/// Key consumed from JSON objects to pick the object's type
pub const TYPE_KEY: &str = "@type";

/// A value in the rendering context
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
}

/// An instance of a named type with its fields
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub type_name: String,
    pub fields: BTreeMap<String, Value>,
}

impl Object {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field, builder style
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type name as reported in diagnostics
    ///
    /// Objects report their own type name, everything else its primitive kind.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(obj) => &obj.type_name,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a field on an object value
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(obj) => obj.get(name),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Object(obj) => f.write_str(&obj.type_name),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(mut map) => {
                let type_name = match map.remove(TYPE_KEY) {
                    Some(Json::String(name)) => name,
                    _ => ROOT_OBJECT_TYPE.to_string(),
                };
                let fields = map.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
                Value::Object(Object { type_name, fields })
            }
        }
    }
}

/// The rendering context: variable names mapped to values
pub type Context = BTreeMap<String, Value>;

/// Build a context from a JSON object
///
/// Non-object JSON yields an empty context.
pub fn context_from_json(json: serde_json::Value) -> Context {
    match json {
        serde_json::Value::Object(map) => {
            map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
        }
        _ => Context::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "NULL");
        assert_eq!(Value::Bool(true).type_name(), "boolean");
        assert_eq!(Value::Int(1).type_name(), "integer");
        assert_eq!(Value::Float(1.5).type_name(), "float");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::Array(vec![]).type_name(), "array");
        assert_eq!(Value::from(Object::new("Foo")).type_name(), "Foo");
    }

    #[test]
    fn test_json_numbers_keep_their_kind() {
        assert_eq!(Value::from(json!(3)), Value::Int(3));
        assert_eq!(Value::from(json!(3.0)), Value::Float(3.0));
        assert_eq!(Value::from(json!(1.234)), Value::Float(1.234));
    }

    #[test]
    fn test_json_object_type_key() {
        let value = Value::from(json!({"@type": "Foo", "title": "hello"}));
        match value {
            Value::Object(obj) => {
                assert_eq!(obj.type_name, "Foo");
                assert_eq!(obj.get("title"), Some(&Value::from("hello")));
                assert!(obj.get(TYPE_KEY).is_none());
            }
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_json_object_defaults_to_root_type() {
        let value = Value::from(json!({"a": 1}));
        assert_eq!(value.type_name(), ROOT_OBJECT_TYPE);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "a, b");
        assert_eq!(Value::from(Object::new("Foo")).to_string(), "Foo");
    }

    #[test]
    fn test_context_from_json() {
        let ctx = context_from_json(json!({"VAR": "x", "N": null}));
        assert_eq!(ctx.get("VAR"), Some(&Value::from("x")));
        assert_eq!(ctx.get("N"), Some(&Value::Null));
        assert!(context_from_json(json!([1, 2])).is_empty());
    }
}
