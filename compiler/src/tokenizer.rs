use regex::Regex;
use lazy_static::lazy_static;
use crate::utils::{quote, error};
use crate::error::SchemaError;

lazy_static! {
    pub static ref TOKEN_REGEX:    Regex = Regex::new(r"(//[^\n]*|\s+|\[\]|[{};]|[A-Za-z_][A-Za-z0-9_]*(?:/[A-Za-z_][A-Za-z0-9_]*)*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)").unwrap();
    pub static ref WHITESPACE_RX:  Regex = Regex::new(r"^\s+$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

impl Token {
    pub fn is_comment(&self) -> bool {
        self.text.starts_with("//")
    }
}

/// Splits schema text into tokens, dropping whitespace and comments. The
/// last token is always an empty EOF marker.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, SchemaError> {
    tokenize(text, false)
}

/// Like [`tokenize_schema`], but keeps `//` comments as tokens.
pub fn tokenize_with_comments(text: &str) -> Result<Vec<Token>, SchemaError> {
    tokenize(text, true)
}

fn tokenize(text: &str, keep_comments: bool) -> Result<Vec<Token>, SchemaError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let end   = mat.end();
        let part  = mat.as_str();

        if start > last_end {
            // Unexpected text between last_end and start
            let unexpected = &text[last_end..start];
            return Err(error(
                &format!("Syntax error: {}", quote(unexpected)),
                line,
                column,
            ));
        }

        let is_comment = part.starts_with("//");
        if !WHITESPACE_RX.is_match(part) && (keep_comments || !is_comment) {
            tokens.push(Token {
                text:   part.trim_end().to_string(),
                line,
                column,
            });
        }

        // Update line/column
        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.chars().count() + 1;
            }
        } else {
            column += part.chars().count();
        }

        last_end = end;
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(error(
            &format!("Syntax error: {}", quote(unexpected)),
            line,
            column,
        ));
    }

    // Append EOF token
    tokens.push(Token {
        text:   "".to_string(),
        line,
        column,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_simple() {
        let input = "package demo\nstruct x { a uint32; }";
        let expected = vec![
            Token { text: "package".into(), line: 1, column: 1 },
            Token { text: "demo".into(),    line: 1, column: 9 },
            Token { text: "struct".into(),  line: 2, column: 1 },
            Token { text: "x".into(),       line: 2, column: 8 },
            Token { text: "{".into(),       line: 2, column: 10 },
            Token { text: "a".into(),       line: 2, column: 12 },
            Token { text: "uint32".into(),  line: 2, column: 14 },
            Token { text: ";".into(),       line: 2, column: 20 },
            Token { text: "}".into(),       line: 2, column: 22 },
            Token { text: "".into(),        line: 2, column: 23 },
        ];
        let got = tokenize_schema(input).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_tokenize_paths_and_lists() {
        let input = "package com/example/api\nfriends []other/pkg.user;";
        let got = tokenize_schema(input).unwrap();
        assert_eq!(
            texts(&got),
            vec!["package", "com/example/api", "friends", "[]", "other/pkg.user", ";", ""]
        );
    }

    #[test]
    fn test_tokenize_comments() {
        let input = "// header\nstruct a { // trailing\n}";
        let got = tokenize_schema(input).unwrap();
        assert_eq!(texts(&got), vec!["struct", "a", "{", "}", ""]);

        let got = tokenize_with_comments(input).unwrap();
        assert_eq!(texts(&got), vec!["// header", "struct", "a", "{", "// trailing", "}", ""]);
        assert_eq!(got[4].line, 2);
        assert!(got[4].is_comment());
    }

    #[test]
    fn test_tokenize_unexpected_text() {
        let input = "struct x { a uint32 = 1; }";
        let err = tokenize_schema(input).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 21);
        assert!(err.msg.starts_with("Syntax error"), "got {:?}", err);
    }
}
