//! Compile-time errors for template syntax

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    /// Create a syntax error with no expectation list
    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            span,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);

                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, crate::parser::lexer::Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, crate::parser::lexer::Token>) -> Self {
        use crate::parser::lexer::Token;
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found = found.as_ref().map(|tok| {
                    let tok: &Token = tok;
                    tok
                });
                match found {
                    // Malformed tokens carry their own message
                    Some(Token::Malformed(reason)) => reason.to_string(),
                    Some(tok) => format!("Unexpected {}", format_token(tok)),
                    None => "Unexpected end of input".to_string(),
                }
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        // Format expected tokens nicely
        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::parser::lexer::Token) -> String {
    use crate::parser::lexer::Token;
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::String(s) => format!("string \"{}\"", s),
        Token::Integer(n) => format!("number {}", n),
        Token::Float(n) => format!("number {}", n),
        Token::Text(_) => "template text".to_string(),
        Token::Invalid(s) => format!("character '{}'", s),
        Token::Malformed(err) => err.to_string(),
        Token::BlockOpen => "'{%'".to_string(),
        Token::BlockClose => "'%}'".to_string(),
        Token::OutputOpen => "'{{'".to_string(),
        Token::OutputClose => "'}}'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::Pipe => "'|'".to_string(),
        // Directive keywords
        Token::Require => "keyword 'require'".to_string(),
        Token::Expect => "keyword 'expect'".to_string(),
        Token::Register => "keyword 'register'".to_string(),
        Token::EndRegister => "keyword 'endregister'".to_string(),
        // Modifiers
        Token::Nullable => "keyword 'nullable'".to_string(),
        Token::Array => "keyword 'array'".to_string(),
        Token::Of => "keyword 'of'".to_string(),
        Token::As => "keyword 'as'".to_string(),
        Token::Once => "keyword 'once'".to_string(),
        Token::In => "keyword 'in'".to_string(),
        Token::Priority => "keyword 'priority'".to_string(),
        // Other
        _ => format!("{:?}", tok),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_format_includes_source_context() {
        let source = "{% register 'no_extension' %}";
        let errors = parse(source).unwrap_err();
        let report = errors[0].format(source, "page.html");
        assert!(report.contains("page.html"));
        assert!(report.contains("Impossible to infer registry name"));
    }

    #[test]
    fn test_unexpected_token_message() {
        let errors = parse("{% register once %}").unwrap_err();
        match &errors[0] {
            ParseError::Syntax { message, .. } => assert_eq!(message, "Unexpected '%}'"),
        }
    }

    #[test]
    fn test_unknown_tag_names_the_token() {
        let errors = parse("{% include 'x' %}").unwrap_err();
        assert!(errors[0].to_string().contains("identifier 'include'"));
    }

    #[test]
    fn test_integer_overflow_message() {
        let errors = parse("{% register '/a.css' priority 99999999999999999999 %}").unwrap_err();
        match &errors[0] {
            ParseError::Syntax { message, span, .. } => {
                assert_eq!(message, "Integer literal out of range");
                assert_eq!(span, &(30..50));
            }
        }
    }

    #[test]
    fn test_unclosed_comment_message() {
        let errors = parse("a{# never closed").unwrap_err();
        match &errors[0] {
            ParseError::Syntax { message, span, .. } => {
                assert_eq!(message, "Unclosed comment, expected '#}'");
                assert_eq!(span, &(1..16));
            }
        }
    }
}
