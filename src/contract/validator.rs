//! Contract validation of context values against declared types

use thiserror::Error;
use tracing::debug;

use crate::value::{Context, Value};

use super::type_registry::TypeRegistry;
use super::types::{ContextBinding, ElementType, TypeShape, TypeSpec};

/// Render-time contract violations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContractError {
    /// The declared variable is absent from the context
    #[error("Missing context variable \"{name}\" required by the template")]
    MissingVariable { name: String },

    /// The declared object type does not resolve in the type registry
    #[error("Missing type \"{type_name}\" required by the template")]
    UnknownType { type_name: String },

    /// The value does not have the declared type
    #[error("Context variable \"{name}\" must be {expected} (got: {actual})")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// An array element does not have the declared element type
    #[error("Context variable \"{name}\" must be an array of {expected} (element {index} got: {actual})")]
    ArrayElementMismatch {
        name: String,
        index: usize,
        expected: String,
        actual: String,
    },
}

impl ContractError {
    /// Name of the variable the failing contract was declared for
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::MissingVariable { name }
            | Self::TypeMismatch { name, .. }
            | Self::ArrayElementMismatch { name, .. } => Some(name),
            Self::UnknownType { .. } => None,
        }
    }

    fn mismatch(name: &str, spec: &TypeSpec, value: &Value) -> Self {
        Self::TypeMismatch {
            name: name.to_string(),
            expected: spec.describe(),
            actual: value.type_name().to_string(),
        }
    }
}

/// Check that `name` is present in `context` and conforms to `spec`
///
/// Returns the checked value on success.
pub fn validate(
    spec: &TypeSpec,
    name: &str,
    context: &Context,
    types: &TypeRegistry,
) -> Result<Value, ContractError> {
    let value = context
        .get(name)
        .ok_or_else(|| ContractError::MissingVariable {
            name: name.to_string(),
        })?;

    debug!(variable = name, expected = %spec, actual = value.type_name(), "checking contract");

    if value.is_null() {
        return if spec.nullable {
            Ok(Value::Null)
        } else {
            Err(ContractError::mismatch(name, spec, value))
        };
    }

    match &spec.shape {
        TypeShape::Single(element) => {
            if conforms(element, value, types)? {
                Ok(value.clone())
            } else {
                Err(ContractError::mismatch(name, spec, value))
            }
        }
        TypeShape::ArrayOf {
            element,
            element_nullable,
        } => {
            let Value::Array(items) = value else {
                return Err(ContractError::mismatch(name, spec, value));
            };
            for (index, item) in items.iter().enumerate() {
                let ok = if item.is_null() {
                    *element_nullable
                } else {
                    conforms(element, item, types)?
                };
                if !ok {
                    return Err(ContractError::ArrayElementMismatch {
                        name: name.to_string(),
                        index,
                        expected: element.describe(*element_nullable),
                        actual: item.type_name().to_string(),
                    });
                }
            }
            Ok(value.clone())
        }
    }
}

/// Evaluate a compiled binding against a context
pub fn check_binding(
    binding: &ContextBinding,
    context: &Context,
    types: &TypeRegistry,
) -> Result<Value, ContractError> {
    validate(&binding.spec, &binding.name, context, types)
}

/// Whether a non-null value matches a single element type
fn conforms(element: &ElementType, value: &Value, types: &TypeRegistry) -> Result<bool, ContractError> {
    match element {
        ElementType::Primitive(kind) => Ok(kind.matches(value)),
        ElementType::Object(type_name) => {
            if !types.contains(type_name) {
                return Err(ContractError::UnknownType {
                    type_name: type_name.clone(),
                });
            }
            Ok(types.is_instance(value, type_name))
        }
    }
}
