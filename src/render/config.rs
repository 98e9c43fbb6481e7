//! Configuration for rendering

use crate::contract::{TypeDescriptor, TypeRegistry, TypeRegistryError, DEFAULT_ALIAS};

/// Configuration options for compiling and rendering templates
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Variable checked by contracts that omit `as NAME`
    pub default_alias: String,

    /// Whether undefined variables in output expressions are errors
    pub strict_variables: bool,

    /// Types known to object contracts and `new()`
    pub types: TypeRegistry,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_alias: DEFAULT_ALIAS.to_string(),
            strict_variables: false,
            types: TypeRegistry::with_builtins(),
        }
    }
}

impl RenderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default contract variable
    pub fn with_default_alias(mut self, alias: impl Into<String>) -> Self {
        self.default_alias = alias.into();
        self
    }

    /// Set whether undefined variables are errors
    pub fn with_strict_variables(mut self, strict: bool) -> Self {
        self.strict_variables = strict;
        self
    }

    /// Replace the type registry
    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    /// Add one type to the registry
    pub fn with_type(mut self, desc: TypeDescriptor) -> Result<Self, TypeRegistryError> {
        self.types.register(desc)?;
        Ok(self)
    }
}
