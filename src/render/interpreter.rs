//! Executes compiled templates against a context

use std::fmt::Write;

use tracing::{debug, warn};

use crate::contract::check_binding;
use crate::parser::ast::{Expr, Identifier, Node, RegisterContent, RegisterDirective, Spanned};
use crate::store::RegistryStore;
use crate::value::{Context, Value};
use crate::RenderError;

use super::config::RenderConfig;
use super::functions::{apply_filter, call_function};

/// State of one render call
pub(crate) struct Interpreter<'r> {
    pub config: &'r RenderConfig,
    pub template_name: &'r str,
    pub context: &'r Context,
    pub store: &'r mut RegistryStore,
}

impl Interpreter<'_> {
    /// Render nodes in order into `out`; stops at the first failure
    pub fn render_nodes(&mut self, nodes: &[Spanned<Node>], out: &mut String) -> Result<(), RenderError> {
        for node in nodes {
            match &node.node {
                Node::Text(text) => out.push_str(text),
                Node::Output(expr) => {
                    let value = self.eval(expr)?;
                    // Writing to a String cannot fail
                    let _ = write!(out, "{}", value);
                }
                Node::Contract(binding) => {
                    check_binding(binding, self.context, &self.config.types).map_err(|source| {
                        warn!(template = self.template_name, error = %source, "contract violated");
                        RenderError::Contract {
                            template: self.template_name.to_string(),
                            source,
                        }
                    })?;
                }
                Node::Register(directive) => self.register(directive)?,
            }
        }
        Ok(())
    }

    fn register(&mut self, directive: &RegisterDirective) -> Result<(), RenderError> {
        let content = match &directive.content {
            RegisterContent::Inline(data) => data.clone(),
            RegisterContent::Block(body) => {
                // Capture the body instead of emitting it
                let mut captured = String::new();
                self.render_nodes(body, &mut captured)?;
                captured
            }
        };

        debug!(
            template = self.template_name,
            registry = %directive.registry,
            unique = directive.unique,
            "register directive"
        );

        if directive.unique {
            self.store
                .register_once(&directive.registry, &content, directive.priority);
        } else {
            self.store
                .register(&directive.registry, content, None, directive.priority);
        }
        Ok(())
    }

    fn eval(&self, expr: &Spanned<Expr>) -> Result<Value, RenderError> {
        match &expr.node {
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Integer(i) => Ok(Value::Int(*i)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Path(segments) => {
                let mut current: Option<&Value> = None;
                for (i, segment) in segments.iter().enumerate() {
                    current = if i == 0 {
                        self.context.get(segment.as_str())
                    } else {
                        current.and_then(|v| v.field(segment.as_str()))
                    };
                    if current.is_none() {
                        return self.undefined(segments, i);
                    }
                }
                Ok(current.cloned().unwrap_or(Value::Null))
            }
            Expr::Call { function, args } => {
                let args = self.eval_args(args)?;
                call_function(*function, args, &self.config.types, &*self.store)
            }
            Expr::Filter {
                input,
                filter,
                args,
            } => {
                let input = self.eval(input)?;
                let args = self.eval_args(args)?;
                apply_filter(*filter, input, args)
            }
        }
    }

    fn eval_args(&self, args: &[Spanned<Expr>]) -> Result<Vec<Value>, RenderError> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    /// Resolve a missing path segment: null, or an error in strict mode
    fn undefined(&self, segments: &[Identifier], upto: usize) -> Result<Value, RenderError> {
        if !self.config.strict_variables {
            return Ok(Value::Null);
        }
        let name = segments[..=upto]
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(".");
        Err(RenderError::UndefinedVariable {
            template: self.template_name.to_string(),
            name,
        })
    }
}
