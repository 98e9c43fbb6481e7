//! Type contracts for context variables
//!
//! A template declares the variables it needs and their types:
//!
//! ```text
//! {% require 'Page' as PAGE %}
//! {% expect nullable array of nullable 'string' as TAGS %}
//! ```
//!
//! Declarations are parsed into [`ContextBinding`]s when the template compiles and
//! checked with [`validate`] each time it renders.

mod type_registry;
mod types;
mod validator;

pub use type_registry::{TypeDescriptor, TypeRegistry, TypeRegistryError};
pub use types::{ContextBinding, ElementType, PrimitiveKind, TypeShape, TypeSpec, DEFAULT_ALIAS};
pub use validator::{check_binding, validate, ContractError};
