//! Template compilation and rendering
//!
//! An [`Environment`] owns the render configuration. It compiles sources into
//! [`Template`]s and renders them against a context, writing registrations into a
//! caller-owned [`RegistryStore`].

mod config;
mod functions;
mod interpreter;

pub use config::RenderConfig;
pub use functions::{apply_filter, call_function};

use tracing::debug;

use crate::contract::ContextBinding;
use crate::error::ParseError;
use crate::parser::{parse_with_alias, Document};
use crate::store::RegistryStore;
use crate::value::Context;
use crate::RenderError;

use interpreter::Interpreter;

/// A compiled template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    document: Document,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contracts declared by the template, in source order
    pub fn bindings(&self) -> impl Iterator<Item = &ContextBinding> {
        self.document.bindings()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Compiles and renders templates under one configuration
#[derive(Debug, Clone, Default)]
pub struct Environment {
    config: RenderConfig,
}

impl Environment {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Parse `source` into a template named `name`
    pub fn compile(&self, name: &str, source: &str) -> Result<Template, Vec<ParseError>> {
        let document = parse_with_alias(source, &self.config.default_alias)?;
        debug!(template = name, nodes = document.nodes.len(), "compiled template");
        Ok(Template {
            name: name.to_string(),
            document,
        })
    }

    /// Render a compiled template
    ///
    /// Registrations made before a failure stay in `store`.
    pub fn render(
        &self,
        template: &Template,
        context: &Context,
        store: &mut RegistryStore,
    ) -> Result<String, RenderError> {
        let mut interpreter = Interpreter {
            config: &self.config,
            template_name: &template.name,
            context,
            store,
        };
        let mut out = String::new();
        interpreter.render_nodes(&template.document.nodes, &mut out)?;
        debug!(template = %template.name, bytes = out.len(), "rendered template");
        Ok(out)
    }

    /// Compile and render in one step
    pub fn render_source(
        &self,
        name: &str,
        source: &str,
        context: &Context,
        store: &mut RegistryStore,
    ) -> Result<String, RenderError> {
        let template = self.compile(name, source)?;
        self.render(&template, context, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ContractError, TypeDescriptor};
    use crate::value::{Object, Value};

    fn context(pairs: &[(&str, Value)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_compile_collects_bindings() {
        let env = Environment::default();
        let template = env
            .compile("page", "{% require 'string' as title %}{% expect 'int' %}")
            .unwrap();
        let names: Vec<_> = template.bindings().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["title", "MODEL"]);
        assert_eq!(template.name(), "page");
    }

    #[test]
    fn test_compile_uses_configured_alias() {
        let env = Environment::new(RenderConfig::new().with_default_alias("VIEW"));
        let template = env.compile("page", "{% require 'int' %}").unwrap();
        assert_eq!(template.bindings().next().unwrap().name, "VIEW");
    }

    #[test]
    fn test_render_outputs_text_and_values() {
        let env = Environment::default();
        let mut store = RegistryStore::new();
        let ctx = context(&[("MODEL", Value::from("World"))]);
        let out = env
            .render_source("page", "{% require 'string' %}Hello {{ MODEL }}!", &ctx, &mut store)
            .unwrap();
        assert_eq!(out, "Hello World!");
    }

    #[test]
    fn test_render_contract_failure_names_template() {
        let env = Environment::default();
        let mut store = RegistryStore::new();
        let err = env
            .render_source("page.html", "{% require 'int' %}", &Context::new(), &mut store)
            .unwrap_err();
        match &err {
            RenderError::Contract { template, source } => {
                assert_eq!(template, "page.html");
                assert!(matches!(source, ContractError::MissingVariable { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            r#"Missing context variable "MODEL" required by the template in template "page.html""#
        );
    }

    #[test]
    fn test_block_registration_is_captured() {
        let env = Environment::default();
        let mut store = RegistryStore::new();
        let ctx = context(&[("name", Value::from("app"))]);
        let out = env
            .render_source(
                "page",
                "before{% register in 'js' %}/{{ name }}.js{% endregister %}after",
                &ctx,
                &mut store,
            )
            .unwrap();
        assert_eq!(out, "beforeafter");
        assert_eq!(store.read("js"), vec!["/app.js"]);
    }

    #[test]
    fn test_registrations_survive_failure() {
        let env = Environment::default();
        let mut store = RegistryStore::new();
        let result = env.render_source(
            "page",
            "{% register '/a.css' %}{% require 'int' %}",
            &Context::new(),
            &mut store,
        );
        assert!(result.is_err());
        assert_eq!(store.read("css"), vec!["/a.css"]);
    }

    #[test]
    fn test_object_contract_with_subtype() {
        let config = RenderConfig::new()
            .with_type(TypeDescriptor::new("Foo"))
            .unwrap()
            .with_type(TypeDescriptor::new("Bar").extends("Foo"))
            .unwrap();
        let env = Environment::new(config);
        let mut store = RegistryStore::new();
        let ctx = context(&[("MODEL", Value::from(Object::new("Bar")))]);
        let out = env
            .render_source("page", "{% require 'Foo' %}{{ MODEL }}", &ctx, &mut store)
            .unwrap();
        assert_eq!(out, "Bar");
    }

    #[test]
    fn test_strict_variables() {
        let env = Environment::new(RenderConfig::new().with_strict_variables(true));
        let mut store = RegistryStore::new();
        let err = env
            .render_source("page", "{{ user.name }}", &Context::new(), &mut store)
            .unwrap_err();
        assert!(matches!(err, RenderError::UndefinedVariable { ref name, .. } if name == "user"));

        let lenient = Environment::default();
        let out = lenient
            .render_source("page", "[{{ user.name }}]", &Context::new(), &mut store)
            .unwrap();
        assert_eq!(out, "[]");
    }
}
