//! Lexer for templates
//!
//! Raw text is scanned by hand; the inside of `{% ... %}` and `{{ ... }}` tags is
//! lexed with logos. `{# ... #}` comments are dropped.

use logos::Logos;
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Input the lexer recognizes but cannot turn into a valid token
#[derive(Error, Debug, Clone, PartialEq, Default)]
pub enum LexError {
    #[default]
    #[error("Invalid character")]
    InvalidCharacter,
    #[error("Integer literal out of range")]
    IntegerOutOfRange,
    #[error("Unclosed comment, expected '#}}'")]
    UnclosedComment,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
#[logos(error = LexError)]
pub enum Token {
    // Tag delimiters. Openers come from the text scanner, closers from logos.
    BlockOpen,
    OutputOpen,
    #[token("%}")]
    BlockClose,
    #[token("}}")]
    OutputClose,

    /// Raw template text between tags
    Text(String),

    /// Character sequence logos could not lex
    Invalid(String),

    /// Malformed literal or comment
    Malformed(LexError),

    // Directive keywords
    #[token("require")]
    Require,
    #[token("expect")]
    Expect,
    #[token("register")]
    Register,
    #[token("endregister")]
    EndRegister,

    // Contract modifiers
    #[token("nullable")]
    Nullable,
    #[token("array")]
    Array,
    #[token("of")]
    Of,
    #[token("as")]
    As,

    // Registration modifiers
    #[token("once")]
    Once,
    #[token("in")]
    In,
    #[token("priority")]
    Priority,

    // Literal keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Delimiters
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("|")]
    Pipe,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unescape(lex.slice()))]
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().map_err(|_| LexError::IntegerOutOfRange))]
    Integer(i64),

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
}

/// Strip the quotes of a string literal and resolve backslash escapes
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Lex a template into tokens with spans
pub fn lex(input: &str) -> Vec<(Token, Span)> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(open) = find_tag_open(rest) else {
            tokens.push((Token::Text(rest.to_string()), pos..input.len()));
            break;
        };

        if open > 0 {
            tokens.push((Token::Text(rest[..open].to_string()), pos..pos + open));
        }
        let tag_start = pos + open;

        match &input[tag_start..tag_start + 2] {
            "{#" => {
                pos = match input[tag_start + 2..].find("#}") {
                    Some(end) => tag_start + 2 + end + 2,
                    None => {
                        let span = tag_start..input.len();
                        tokens.push((Token::Malformed(LexError::UnclosedComment), span));
                        input.len()
                    }
                };
            }
            opener => {
                let token = if opener == "{%" {
                    Token::BlockOpen
                } else {
                    Token::OutputOpen
                };
                tokens.push((token, tag_start..tag_start + 2));
                pos = lex_tag(input, tag_start + 2, &mut tokens);
            }
        }
    }

    tokens
}

/// Find the next `{%`, `{{` or `{#`
fn find_tag_open(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    (0..bytes.len().saturating_sub(1))
        .find(|&i| bytes[i] == b'{' && matches!(bytes[i + 1], b'%' | b'{' | b'#'))
}

/// Lex the inside of a tag up to and including its closer; returns the offset after it
fn lex_tag(input: &str, start: usize, tokens: &mut Vec<(Token, Span)>) -> usize {
    let mut lexer = Token::lexer(&input[start..]);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let span = start + span.start..start + span.end;
        match result {
            Ok(tok) => {
                let closes = matches!(tok, Token::BlockClose | Token::OutputClose);
                tokens.push((tok, span.clone()));
                if closes {
                    return span.end;
                }
            }
            Err(LexError::InvalidCharacter) => {
                tokens.push((Token::Invalid(input[span.clone()].to_string()), span))
            }
            Err(err) => tokens.push((Token::Malformed(err), span)),
        }
    }
    input.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        lex(input).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(kinds("hello world"), vec![Token::Text("hello world".to_string())]);
    }

    #[test]
    fn test_require_tag() {
        assert_eq!(
            kinds("{% require nullable array of 'string' as TAGS %}"),
            vec![
                Token::BlockOpen,
                Token::Require,
                Token::Nullable,
                Token::Array,
                Token::Of,
                Token::String("string".to_string()),
                Token::As,
                Token::Ident("TAGS".to_string()),
                Token::BlockClose,
            ]
        );
    }

    #[test]
    fn test_register_tag() {
        assert_eq!(
            kinds(r#"{% register once "/a.css" in "css" priority -2 %}"#),
            vec![
                Token::BlockOpen,
                Token::Register,
                Token::Once,
                Token::String("/a.css".to_string()),
                Token::In,
                Token::String("css".to_string()),
                Token::Priority,
                Token::Integer(-2),
                Token::BlockClose,
            ]
        );
    }

    #[test]
    fn test_text_around_tags() {
        assert_eq!(
            kinds("a{{ x }}b"),
            vec![
                Token::Text("a".to_string()),
                Token::OutputOpen,
                Token::Ident("x".to_string()),
                Token::OutputClose,
                Token::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans_are_absolute() {
        let tokens = lex("ab{{ x }}");
        assert_eq!(tokens[1].1, 2..4);
        assert_eq!(tokens[2].1, 5..6);
        assert_eq!(tokens[3].1, 7..9);
    }

    #[test]
    fn test_closer_inside_string_does_not_end_tag() {
        assert_eq!(
            kinds("{{ '%}' }}"),
            vec![
                Token::OutputOpen,
                Token::String("%}".to_string()),
                Token::OutputClose,
            ]
        );
    }

    #[test]
    fn test_escaped_backslashes() {
        assert_eq!(
            kinds(r"{% require 'App\\Models\\Page' %}")[2],
            Token::String(r"App\Models\Page".to_string())
        );
    }

    #[test]
    fn test_comments_dropped() {
        assert_eq!(
            kinds("a{# note {% x %} #}b"),
            vec![Token::Text("a".to_string()), Token::Text("b".to_string())]
        );
    }

    #[test]
    fn test_expression_tokens() {
        assert_eq!(
            kinds("{{ registry('css') | join(', ') }}"),
            vec![
                Token::OutputOpen,
                Token::Ident("registry".to_string()),
                Token::ParenOpen,
                Token::String("css".to_string()),
                Token::ParenClose,
                Token::Pipe,
                Token::Ident("join".to_string()),
                Token::ParenOpen,
                Token::String(", ".to_string()),
                Token::ParenClose,
                Token::OutputClose,
            ]
        );
    }

    #[test]
    fn test_numbers_and_paths() {
        assert_eq!(
            kinds("{{ page.title 1.5 42 true null }}")[1..8],
            [
                Token::Ident("page".to_string()),
                Token::Dot,
                Token::Ident("title".to_string()),
                Token::Float(1.5),
                Token::Integer(42),
                Token::True,
                Token::Null,
            ]
        );
    }

    #[test]
    fn test_invalid_characters_are_reported() {
        assert!(kinds("{{ $ }}").contains(&Token::Invalid("$".to_string())));
    }

    #[test]
    fn test_unclosed_tag_runs_to_end() {
        assert_eq!(
            kinds("{% register"),
            vec![Token::BlockOpen, Token::Register]
        );
    }

    #[test]
    fn test_unclosed_comment_is_an_error() {
        let tokens = lex("a{# never closed");
        assert_eq!(
            tokens,
            vec![
                (Token::Text("a".to_string()), 0..1),
                (Token::Malformed(LexError::UnclosedComment), 1..16),
            ]
        );
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        assert_eq!(
            kinds("{% register '/a.css' priority 99999999999999999999 %}")[4],
            Token::Malformed(LexError::IntegerOutOfRange)
        );
        assert_eq!(
            kinds("{{ -9223372036854775808 }}")[1],
            Token::Integer(i64::MIN)
        );
    }
}
