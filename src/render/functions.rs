//! Host functions and filters

use crate::contract::{TypeRegistry, TypeRegistryError};
use crate::parser::ast::{Filter, Function};
use crate::store::RegistryStore;
use crate::value::Value;
use crate::RenderError;

/// Call a host function with evaluated arguments
pub fn call_function(
    function: Function,
    args: Vec<Value>,
    types: &TypeRegistry,
    store: &RegistryStore,
) -> Result<Value, RenderError> {
    match function {
        Function::Registry => {
            let [name] = exact_args::<1>(function, args)?;
            let name = string_arg(function, &name, "registry name")?;
            Ok(Value::Array(
                store.read(name).into_iter().map(Value::from).collect(),
            ))
        }
        Function::New => {
            let mut args = args.into_iter();
            let type_name = match args.next() {
                Some(Value::String(name)) => name,
                Some(other) => {
                    return Err(function_error(
                        function,
                        format!("type name must be a string (got: {})", other.type_name()),
                    ))
                }
                None => return Err(function_error(function, "missing type name")),
            };
            types
                .instantiate(&type_name, args.collect())
                .map_err(|err| match err {
                    TypeRegistryError::NotFound { name } => RenderError::UnknownType { type_name: name },
                    other => function_error(function, other.to_string()),
                })
        }
        Function::InstanceOf => {
            let [value, type_name] = exact_args::<2>(function, args)?;
            let type_name = string_arg(function, &type_name, "type name")?;
            Ok(Value::Bool(types.is_instance(&value, type_name)))
        }
    }
}

/// Apply a filter to its input
pub fn apply_filter(filter: Filter, input: Value, args: Vec<Value>) -> Result<Value, RenderError> {
    match filter {
        Filter::JsonDecode => {
            let Value::String(json) = input else {
                return Err(filter_error(
                    filter,
                    format!("expects a string (got: {})", input.type_name()),
                ));
            };
            serde_json::from_str::<serde_json::Value>(&json)
                .map(Value::from)
                .map_err(|e| filter_error(filter, e.to_string()))
        }
        Filter::Join => {
            let separator = match args.first() {
                Some(Value::String(s)) => s.as_str(),
                Some(other) => {
                    return Err(filter_error(
                        filter,
                        format!("separator must be a string (got: {})", other.type_name()),
                    ))
                }
                None => "",
            };
            match input {
                Value::Array(items) => Ok(Value::String(
                    items
                        .iter()
                        .map(|item| item.to_string())
                        .collect::<Vec<_>>()
                        .join(separator),
                )),
                Value::Null => Ok(Value::String(String::new())),
                other => Err(filter_error(
                    filter,
                    format!("expects an array (got: {})", other.type_name()),
                )),
            }
        }
    }
}

fn exact_args<const N: usize>(function: Function, args: Vec<Value>) -> Result<[Value; N], RenderError> {
    let got = args.len();
    args.try_into()
        .map_err(|_| function_error(function, format!("expects {} argument(s), got {}", N, got)))
}

fn string_arg<'v>(function: Function, value: &'v Value, what: &str) -> Result<&'v str, RenderError> {
    value.as_str().ok_or_else(|| {
        function_error(
            function,
            format!("{} must be a string (got: {})", what, value.type_name()),
        )
    })
}

fn function_error(function: Function, message: impl Into<String>) -> RenderError {
    RenderError::Function {
        function: function.name(),
        message: message.into(),
    }
}

fn filter_error(filter: Filter, message: impl Into<String>) -> RenderError {
    RenderError::Filter {
        filter: filter.name(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TypeDescriptor;
    use crate::value::Object;

    fn types() -> TypeRegistry {
        TypeRegistry::with_builtins()
            .with_type(TypeDescriptor::new("Foo").with_fields(["title"]))
            .expect("valid registry")
    }

    #[test]
    fn test_registry_function_reads_values() {
        let mut store = RegistryStore::new();
        store.register("css", "/b.css", None, Some(2));
        store.register("css", "/a.css", None, Some(1));
        let value = call_function(Function::Registry, vec![Value::from("css")], &types(), &store).unwrap();
        assert_eq!(value, Value::from(vec!["/a.css", "/b.css"]));
    }

    #[test]
    fn test_registry_function_arity() {
        let store = RegistryStore::new();
        let err = call_function(Function::Registry, vec![], &types(), &store).unwrap_err();
        assert_eq!(err.to_string(), "function registry(): expects 1 argument(s), got 0");
    }

    #[test]
    fn test_new_builds_object() {
        let store = RegistryStore::new();
        let value = call_function(
            Function::New,
            vec![Value::from("Foo"), Value::from("Hello")],
            &types(),
            &store,
        )
        .unwrap();
        assert_eq!(value, Value::from(Object::new("Foo").with_field("title", "Hello")));
    }

    #[test]
    fn test_new_unknown_type() {
        let store = RegistryStore::new();
        let err = call_function(Function::New, vec![Value::from("Bar")], &types(), &store).unwrap_err();
        assert!(matches!(err, RenderError::UnknownType { .. }));
    }

    #[test]
    fn test_instanceof() {
        let store = RegistryStore::new();
        let foo = Value::from(Object::new("Foo"));
        let yes = call_function(Function::InstanceOf, vec![foo, Value::from("Foo")], &types(), &store);
        assert_eq!(yes.unwrap(), Value::Bool(true));
        let no = call_function(Function::InstanceOf, vec![Value::Null, Value::from("Foo")], &types(), &store);
        assert_eq!(no.unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_instanceof_unknown_type() {
        let store = RegistryStore::new();
        let foo = Value::from(Object::new("Foo"));
        let result = call_function(Function::InstanceOf, vec![foo, Value::from("Missing")], &types(), &store);
        assert_eq!(result.unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_json_decode() {
        let value = apply_filter(Filter::JsonDecode, Value::from(r#"{"@type": "Foo", "n": [1, 2.5]}"#), vec![])
            .unwrap();
        let expected = Object::new("Foo").with_field("n", Value::Array(vec![Value::Int(1), Value::Float(2.5)]));
        assert_eq!(value, Value::from(expected));
    }

    #[test]
    fn test_json_decode_invalid() {
        let err = apply_filter(Filter::JsonDecode, Value::from("{"), vec![]).unwrap_err();
        assert!(matches!(err, RenderError::Filter { filter: "json_decode", .. }));
    }

    #[test]
    fn test_join() {
        let value = apply_filter(Filter::Join, Value::from(vec!["a", "b"]), vec![Value::from("|")]).unwrap();
        assert_eq!(value, Value::from("a|b"));
        let empty = apply_filter(Filter::Join, Value::Null, vec![]).unwrap();
        assert_eq!(empty, Value::from(""));
    }
}
