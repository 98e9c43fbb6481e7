//! Parser implementation using chumsky
//!
//! Parsing runs in two steps: the chumsky grammar accepts a slightly wider language
//! than is valid, then lowering turns the raw tree into the public AST and reports
//! the directive errors with dedicated messages.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::contract::{ContextBinding, ElementType, TypeShape, TypeSpec, DEFAULT_ALIAS};
use crate::error::ParseError;
use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Template node before lowering
#[derive(Debug, Clone)]
enum RawNode {
    Text(String),
    Output(Spanned<RawExpr>),
    Contract {
        nullable: bool,
        shape: Spanned<RawShape>,
        alias: Option<String>,
    },
    RegisterInline {
        unique: bool,
        data: Spanned<String>,
        registry: Option<String>,
        priority: Option<i64>,
    },
    RegisterBlock {
        unique: bool,
        registry: String,
        priority: Option<i64>,
        body: Vec<Spanned<RawNode>>,
    },
}

#[derive(Debug, Clone)]
enum RawShape {
    Single(Spanned<RawTypeRef>),
    ArrayOf {
        has_of: bool,
        element_nullable: bool,
        element: Spanned<RawTypeRef>,
    },
}

/// Whatever stood where a type literal was expected
#[derive(Debug, Clone)]
enum RawTypeRef {
    Literal(String),
    Name(String),
    Array,
}

#[derive(Debug, Clone)]
enum RawExpr {
    Literal(Expr),
    Path(Vec<Identifier>),
    Call {
        name: Spanned<String>,
        args: Vec<Spanned<RawExpr>>,
    },
    Filter {
        input: Box<Spanned<RawExpr>>,
        name: Spanned<String>,
        args: Vec<Spanned<RawExpr>>,
    },
}

/// Parse a template, checking contracts without `as` against `MODEL`
pub fn parse(input: &str) -> Result<Document, Vec<ParseError>> {
    parse_with_alias(input, DEFAULT_ALIAS)
}

/// Parse a template with a custom default contract variable
pub fn parse_with_alias(input: &str, default_alias: &str) -> Result<Document, Vec<ParseError>> {
    let len = input.len();

    let token_iter = crate::parser::lexer::lex(input)
        .into_iter()
        .map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    let raw = document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect::<Vec<ParseError>>())?;

    lower(raw, default_alias)
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn document_parser<'a, I>(
) -> impl Parser<'a, I, Vec<Spanned<RawNode>>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let ident = select! {
        Token::Ident(s) => s,
    };

    let string_literal = select! {
        Token::String(s) => s,
    };

    let integer = select! {
        Token::Integer(n) => n,
    };

    // Output expressions: primary (| filter)*
    let expr = recursive(|expr| {
        let args = expr
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose));

        let literal = select! {
            Token::String(s) => RawExpr::Literal(Expr::String(s)),
            Token::Integer(n) => RawExpr::Literal(Expr::Integer(n)),
            Token::Float(x) => RawExpr::Literal(Expr::Float(x)),
            Token::True => RawExpr::Literal(Expr::Bool(true)),
            Token::False => RawExpr::Literal(Expr::Bool(false)),
            Token::Null => RawExpr::Literal(Expr::Null),
        };

        let call = ident
            .clone()
            .map_with(|name, e| Spanned::new(name, span_range(&e.span())))
            .then(args.clone())
            .map(|(name, args)| RawExpr::Call { name, args });

        let path = ident
            .clone()
            .map(Identifier::new)
            .separated_by(just(Token::Dot))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(RawExpr::Path);

        // Call must come before path: both start with an identifier
        let primary = choice((literal, call, path))
            .map_with(|node, e| Spanned::new(node, span_range(&e.span())));

        let filter = just(Token::Pipe)
            .ignore_then(
                ident
                    .clone()
                    .map_with(|name, e| Spanned::new(name, span_range(&e.span()))),
            )
            .then(args.or_not())
            .map_with(|(name, args), e| (name, args.unwrap_or_default(), span_range(&e.span())));

        primary.foldl(filter.repeated(), |input, (name, args, span)| {
            let span = input.span.start..span.end;
            Spanned::new(
                RawExpr::Filter {
                    input: Box::new(input),
                    name,
                    args,
                },
                span,
            )
        })
    });

    let nullable = just(Token::Nullable).or_not().map(|n| n.is_some());

    // Anything that may stand where a type literal belongs; lowering rejects non-literals
    let type_ref = choice((
        string_literal.clone().map(RawTypeRef::Literal),
        // Swallow a whole nested declaration so it gets its own error
        just(Token::Array)
            .then(just(Token::Of).or_not())
            .then(just(Token::Nullable).or_not())
            .then(string_literal.clone().or_not())
            .to(RawTypeRef::Array),
        ident.clone().map(RawTypeRef::Name),
    ))
    .map_with(|t, e| Spanned::new(t, span_range(&e.span())));

    let shape = choice((
        just(Token::Array)
            .ignore_then(just(Token::Of).or_not())
            .then(nullable.clone())
            .then(type_ref.clone())
            .map(|((of, element_nullable), element)| RawShape::ArrayOf {
                has_of: of.is_some(),
                element_nullable,
                element,
            }),
        type_ref.map(RawShape::Single),
    ))
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    // {% require|expect [nullable] <shape> [as NAME] %}
    let contract = just(Token::Require)
        .or(just(Token::Expect))
        .ignore_then(nullable)
        .then(shape)
        .then(just(Token::As).ignore_then(ident).or_not())
        .delimited_by(just(Token::BlockOpen), just(Token::BlockClose))
        .map(|((nullable, shape), alias)| RawNode::Contract {
            nullable,
            shape,
            alias,
        });

    let once = just(Token::Once).or_not().map(|o| o.is_some());
    let priority = just(Token::Priority).ignore_then(integer).or_not();

    // {% register [once] '<data>' [in '<registry>'] [priority N] %}
    let register_inline = just(Token::Register)
        .ignore_then(once.clone())
        .then(
            string_literal
                .clone()
                .map_with(|s, e| Spanned::new(s, span_range(&e.span()))),
        )
        .then(just(Token::In).ignore_then(string_literal.clone()).or_not())
        .then(priority.clone())
        .delimited_by(just(Token::BlockOpen), just(Token::BlockClose))
        .map(|(((unique, data), registry), priority)| RawNode::RegisterInline {
            unique,
            data,
            registry,
            priority,
        });

    let text = select! {
        Token::Text(s) => RawNode::Text(s),
    };

    let output = expr
        .delimited_by(just(Token::OutputOpen), just(Token::OutputClose))
        .map(RawNode::Output);

    let node = recursive(|node| {
        // {% register [once] in '<registry>' [priority N] %} ... {% endregister %}
        let register_block = just(Token::Register)
            .ignore_then(once.clone())
            .then_ignore(just(Token::In))
            .then(string_literal.clone())
            .then(priority.clone())
            .delimited_by(just(Token::BlockOpen), just(Token::BlockClose))
            .then(node.repeated().collect::<Vec<_>>())
            .then_ignore(
                just(Token::EndRegister)
                    .delimited_by(just(Token::BlockOpen), just(Token::BlockClose)),
            )
            .map(|(((unique, registry), priority), body)| RawNode::RegisterBlock {
                unique,
                registry,
                priority,
                body,
            });

        choice((
            text.clone(),
            output.clone(),
            contract.clone(),
            register_inline.clone(),
            register_block,
        ))
            .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
            .boxed()
    });

    // A template is a list of nodes
    node.repeated().collect().then_ignore(end())
}

/// Turn the raw tree into the public AST, collecting every directive error
fn lower(nodes: Vec<Spanned<RawNode>>, default_alias: &str) -> Result<Document, Vec<ParseError>> {
    let mut errors = Vec::new();
    let nodes = lower_nodes(nodes, default_alias, &mut errors);
    if errors.is_empty() {
        Ok(Document { nodes })
    } else {
        Err(errors)
    }
}

fn lower_nodes(
    nodes: Vec<Spanned<RawNode>>,
    default_alias: &str,
    errors: &mut Vec<ParseError>,
) -> Vec<Spanned<Node>> {
    nodes
        .into_iter()
        .filter_map(|Spanned { node, span }| {
            lower_node(node, default_alias, errors).map(|n| Spanned::new(n, span))
        })
        .collect()
}

fn lower_node(node: RawNode, default_alias: &str, errors: &mut Vec<ParseError>) -> Option<Node> {
    match node {
        RawNode::Text(text) => Some(Node::Text(text)),
        RawNode::Output(expr) => lower_expr(expr, errors).map(Node::Output),
        RawNode::Contract {
            nullable,
            shape,
            alias,
        } => {
            let shape = lower_shape(shape, errors)?;
            let name = alias.unwrap_or_else(|| default_alias.to_string());
            Some(Node::Contract(ContextBinding::new(
                name,
                TypeSpec { shape, nullable },
            )))
        }
        RawNode::RegisterInline {
            unique,
            data,
            registry,
            priority,
        } => {
            let registry = match registry.or_else(|| infer_registry_name(&data.node)) {
                Some(registry) => registry,
                None => {
                    errors.push(ParseError::syntax(
                        data.span,
                        "Impossible to infer registry name from data, you must define a registry name explicitly.",
                    ));
                    return None;
                }
            };
            Some(Node::Register(RegisterDirective {
                registry,
                unique,
                priority,
                content: RegisterContent::Inline(data.node),
            }))
        }
        RawNode::RegisterBlock {
            unique,
            registry,
            priority,
            body,
        } => Some(Node::Register(RegisterDirective {
            registry,
            unique,
            priority,
            content: RegisterContent::Block(lower_nodes(body, default_alias, errors)),
        })),
    }
}

fn lower_shape(shape: Spanned<RawShape>, errors: &mut Vec<ParseError>) -> Option<TypeShape> {
    match shape.node {
        RawShape::Single(type_ref) => {
            if matches!(type_ref.node, RawTypeRef::Array) {
                errors.push(missing_of(shape.span));
                return None;
            }
            lower_type_ref(type_ref, errors).map(TypeShape::Single)
        }
        RawShape::ArrayOf {
            has_of,
            element_nullable,
            element,
        } => {
            if !has_of {
                errors.push(missing_of(shape.span));
                return None;
            }
            lower_type_ref(element, errors).map(|element| TypeShape::ArrayOf {
                element,
                element_nullable,
            })
        }
    }
}

fn lower_type_ref(type_ref: Spanned<RawTypeRef>, errors: &mut Vec<ParseError>) -> Option<ElementType> {
    match type_ref.node {
        RawTypeRef::Literal(name) => Some(ElementType::from_name(&name)),
        RawTypeRef::Name(name) => {
            errors.push(ParseError::syntax(
                type_ref.span,
                format!("The type reference in a contract must be a string (got: {}).", name),
            ));
            None
        }
        RawTypeRef::Array => {
            errors.push(ParseError::syntax(
                type_ref.span,
                "Arrays of arrays are not supported, \"array of\" takes a single type.",
            ));
            None
        }
    }
}

fn missing_of(span: Span) -> ParseError {
    ParseError::syntax(span, "Missing \"of\" keyword is required after \"array\" in a contract.")
}

fn lower_expr(expr: Spanned<RawExpr>, errors: &mut Vec<ParseError>) -> Option<Spanned<Expr>> {
    let Spanned { node, span } = expr;
    let node = match node {
        RawExpr::Literal(literal) => literal,
        RawExpr::Path(segments) => Expr::Path(segments),
        RawExpr::Call { name, args } => {
            let function = Function::from_name(&name.node);
            if function.is_none() {
                errors.push(ParseError::syntax(
                    name.span,
                    format!("Unknown function \"{}\".", name.node),
                ));
            }
            let args = lower_args(args, errors);
            Expr::Call {
                function: function?,
                args: args?,
            }
        }
        RawExpr::Filter { input, name, args } => {
            let input = lower_expr(*input, errors);
            let filter = Filter::from_name(&name.node);
            if filter.is_none() {
                errors.push(ParseError::syntax(
                    name.span,
                    format!("Unknown filter \"{}\".", name.node),
                ));
            }
            let args = lower_args(args, errors);
            Expr::Filter {
                input: Box::new(input?),
                filter: filter?,
                args: args?,
            }
        }
    };
    Some(Spanned::new(node, span))
}

/// Lower every argument so all errors are reported, then fail if any did
fn lower_args(args: Vec<Spanned<RawExpr>>, errors: &mut Vec<ParseError>) -> Option<Vec<Spanned<Expr>>> {
    let lowered: Vec<_> = args.into_iter().map(|a| lower_expr(a, errors)).collect();
    lowered.into_iter().collect()
}

/// Registry name from a path-like literal's extension: `/styles.css` -> `css`
///
/// Only the last path segment counts, so `.css` and `/assets/.js` have extensions
/// while `dir.d/file` has none.
fn infer_registry_name(data: &str) -> Option<String> {
    let basename = data.rsplit('/').next().unwrap_or(data);
    basename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
}
