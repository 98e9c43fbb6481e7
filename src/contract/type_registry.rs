//! Runtime type registry used for object contracts and instantiation

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::value::{Object, Value, ROOT_OBJECT_TYPE};

/// Errors raised by type registry operations
#[derive(Debug, Error, PartialEq)]
pub enum TypeRegistryError {
    /// Type not found in registry
    #[error("unknown type: {name}")]
    NotFound { name: String },

    /// Duplicate type definition
    #[error("duplicate type definition: {name}")]
    Duplicate { name: String },

    /// A type extends a type that was never declared
    #[error("type {name} extends unknown type {parent}")]
    UnknownParent { name: String, parent: String },

    /// More constructor arguments than declared fields
    #[error("type {name} takes at most {expected} argument(s), got {got}")]
    TooManyArguments {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// A named runtime type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    /// Supertype, if any
    pub parent: Option<String>,
    /// Field names bound positionally on instantiation
    pub fields: Vec<String>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Registry of known types, supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the root `Object` type
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .types
            .insert(ROOT_OBJECT_TYPE.to_string(), TypeDescriptor::new(ROOT_OBJECT_TYPE));
        registry
    }

    /// Register a type
    pub fn register(&mut self, desc: TypeDescriptor) -> Result<(), TypeRegistryError> {
        if self.types.contains_key(&desc.name) {
            return Err(TypeRegistryError::Duplicate { name: desc.name });
        }
        debug!(name = %desc.name, parent = ?desc.parent, "registered type");
        self.types.insert(desc.name.clone(), desc);
        Ok(())
    }

    /// Register a type, builder style
    pub fn with_type(mut self, desc: TypeDescriptor) -> Result<Self, TypeRegistryError> {
        self.register(desc)?;
        Ok(self)
    }

    /// Check that every declared parent resolves
    pub fn check_parents(&self) -> Result<(), TypeRegistryError> {
        let mut names: Vec<_> = self.types.keys().collect();
        names.sort();
        for name in names {
            let desc = &self.types[name];
            if let Some(parent) = &desc.parent {
                if !self.types.contains_key(parent) {
                    return Err(TypeRegistryError::UnknownParent {
                        name: desc.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// Check if a type name resolves
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Whether `actual` is `expected` or one of its subtypes
    pub fn is_subtype(&self, actual: &str, expected: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(actual);
        while let Some(name) = current {
            if name == expected {
                return true;
            }
            if !seen.insert(name) {
                return false;
            }
            current = self.types.get(name).and_then(|d| d.parent.as_deref());
        }
        false
    }

    /// Whether `value` is an instance of `type_name`
    ///
    /// Null and non-object values are never instances.
    pub fn is_instance(&self, value: &Value, type_name: &str) -> bool {
        match value {
            Value::Object(obj) => self.is_subtype(&obj.type_name, type_name),
            _ => false,
        }
    }

    /// Build an instance, binding `args` to the type's fields in order
    pub fn instantiate(&self, name: &str, args: Vec<Value>) -> Result<Value, TypeRegistryError> {
        let desc = self.types.get(name).ok_or_else(|| TypeRegistryError::NotFound {
            name: name.to_string(),
        })?;

        if args.len() > desc.fields.len() {
            return Err(TypeRegistryError::TooManyArguments {
                name: name.to_string(),
                expected: desc.fields.len(),
                got: args.len(),
            });
        }

        let mut args = args.into_iter();
        let mut object = Object::new(name);
        for field in &desc.fields {
            object
                .fields
                .insert(field.clone(), args.next().unwrap_or(Value::Null));
        }
        Ok(Value::Object(object))
    }

    /// Get all type names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|s| s.as_str())
    }
}
