//! Template Powerpack - context contracts and content registries for templates
//!
//! Templates declare the context variables they need with `require`/`expect`
//! directives, and push fragments such as asset paths into named registries with
//! `register`. A host reads the registries back after rendering.
//!
//! # Example
//!
//! ```rust
//! use template_powerpack::{render, Context, RegistryStore, Value};
//!
//! let mut context = Context::new();
//! context.insert("MODEL".to_string(), Value::from("World"));
//!
//! let mut store = RegistryStore::new();
//! let html = render(
//!     "{% require 'string' %}{% register '/app.css' %}Hello {{ MODEL }}",
//!     &context,
//!     &mut store,
//! )
//! .unwrap();
//!
//! assert_eq!(html, "Hello World");
//! assert_eq!(store.read("css"), vec!["/app.css"]);
//! ```

pub mod config;
pub mod contract;
pub mod error;
pub mod parser;
pub mod render;
pub mod store;
pub mod value;

pub use config::ConfigError;
pub use contract::{ContractError, TypeDescriptor, TypeRegistry, TypeRegistryError, TypeSpec};
pub use error::ParseError;
pub use parser::{parse, Document};
pub use render::{Environment, RenderConfig, Template};
pub use store::{RegistryEntry, RegistryStore};
pub use value::{context_from_json, Context, Object, Value};

use thiserror::Error;

/// Errors that can occur while compiling or rendering a template
#[derive(Debug, Error)]
pub enum RenderError {
    /// Error during parsing
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// A contract directive rejected the context
    #[error("{source} in template \"{template}\"")]
    Contract {
        template: String,
        #[source]
        source: ContractError,
    },

    /// `new()` named a type the registry does not know
    #[error("Missing type \"{type_name}\"")]
    UnknownType { type_name: String },

    /// Undefined variable with `strict_variables` enabled
    #[error("Undefined variable \"{name}\" in template \"{template}\"")]
    UndefinedVariable { template: String, name: String },

    #[error("function {function}(): {message}")]
    Function {
        function: &'static str,
        message: String,
    },

    #[error("filter {filter}: {message}")]
    Filter {
        filter: &'static str,
        message: String,
    },
}

impl From<Vec<ParseError>> for RenderError {
    fn from(errors: Vec<ParseError>) -> Self {
        RenderError::Parse(errors)
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Render a template source with the default configuration
///
/// The template is named `"template"` in error messages.
pub fn render(source: &str, context: &Context, store: &mut RegistryStore) -> Result<String, RenderError> {
    render_with_config(source, context, store, RenderConfig::default())
}

/// Render a template source with a custom configuration
///
/// # Example
///
/// ```rust
/// use template_powerpack::{render_with_config, Context, RegistryStore, RenderConfig, RenderError};
///
/// let config = RenderConfig::new().with_strict_variables(true);
/// let mut store = RegistryStore::new();
///
/// let err = render_with_config("{{ missing }}", &Context::new(), &mut store, config).unwrap_err();
/// assert!(matches!(err, RenderError::UndefinedVariable { .. }));
/// ```
pub fn render_with_config(
    source: &str,
    context: &Context,
    store: &mut RegistryStore,
    config: RenderConfig,
) -> Result<String, RenderError> {
    Environment::new(config).render_source("template", source, context, store)
}
