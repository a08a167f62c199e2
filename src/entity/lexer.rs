//! Tokenizer for entity declaration sources.
//!
//! Understands just enough of a typed scripting language to read a class with
//! decorators: identifiers, string/number literals, punctuation, `=>`, and
//! both comment styles. Everything is tracked by line for error reporting.

use crate::core::{MarshalError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Str(String),
    Number(String),
    Arrow,
    Punct(char),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct(ch)
    }

    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(ident) => format!("identifier '{}'", ident),
            TokenKind::Str(s) => format!("string \"{}\"", s),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Arrow => "'=>'".to_string(),
            TokenKind::Punct(ch) => format!("'{}'", ch),
        }
    }
}

pub(crate) fn tokenize(location: &str, source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch == '\n' {
            line += 1;
            i += 1;
            continue;
        }
        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        // comments
        if ch == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if ch == '/' && chars.get(i + 1) == Some(&'*') {
            let start_line = line;
            i += 2;
            loop {
                match chars.get(i) {
                    None => {
                        return Err(MarshalError::parse(
                            location,
                            start_line,
                            "unterminated block comment",
                        ));
                    }
                    Some('*') if chars.get(i + 1) == Some(&'/') => {
                        i += 2;
                        break;
                    }
                    Some('\n') => {
                        line += 1;
                        i += 1;
                    }
                    Some(_) => i += 1,
                }
            }
            continue;
        }

        if ch == '"' || ch == '\'' || ch == '`' {
            let start_line = line;
            let mut text = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => {
                        return Err(MarshalError::parse(
                            location,
                            start_line,
                            "unterminated string literal",
                        ));
                    }
                    Some(&c) if c == ch => {
                        i += 1;
                        break;
                    }
                    Some('\\') => {
                        let escaped = chars.get(i + 1).copied().ok_or_else(|| {
                            MarshalError::parse(location, line, "dangling escape in string literal")
                        })?;
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '0' => '\0',
                            other => other,
                        });
                        i += 2;
                    }
                    Some('\n') if ch != '`' => {
                        return Err(MarshalError::parse(
                            location,
                            start_line,
                            "newline inside string literal",
                        ));
                    }
                    Some(&c) => {
                        if c == '\n' {
                            line += 1;
                        }
                        text.push(c);
                        i += 1;
                    }
                }
            }
            tokens.push(Token {
                kind: TokenKind::Str(text),
                line: start_line,
            });
            continue;
        }

        if ch.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_') {
                // exponent sign, e.g. 1e-3
                if (chars[i] == 'e' || chars[i] == 'E')
                    && matches!(chars.get(i + 1), Some('+') | Some('-'))
                {
                    i += 1;
                }
                i += 1;
            }
            let literal: String = chars[start..i].iter().filter(|c| **c != '_').collect();
            tokens.push(Token {
                kind: TokenKind::Number(literal),
                line,
            });
            continue;
        }

        if ch.is_alphabetic() || ch == '_' || ch == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(chars[start..i].iter().collect()),
                line,
            });
            continue;
        }

        if ch == '=' && chars.get(i + 1) == Some(&'>') {
            tokens.push(Token {
                kind: TokenKind::Arrow,
                line,
            });
            i += 2;
            continue;
        }

        tokens.push(Token {
            kind: TokenKind::Punct(ch),
            line,
        });
        i += 1;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize("test", source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_decorator_tokens() {
        assert_eq!(
            kinds(r#"@Column({ name: "NAME", length: 20 })"#),
            vec![
                TokenKind::Punct('@'),
                TokenKind::Ident("Column".into()),
                TokenKind::Punct('('),
                TokenKind::Punct('{'),
                TokenKind::Ident("name".into()),
                TokenKind::Punct(':'),
                TokenKind::Str("NAME".into()),
                TokenKind::Punct(','),
                TokenKind::Ident("length".into()),
                TokenKind::Punct(':'),
                TokenKind::Number("20".into()),
                TokenKind::Punct('}'),
                TokenKind::Punct(')'),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped_and_lines_counted() {
        let tokens = tokenize("test", "// header\n/* block\n comment */\nclass").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].line, 4);
    }

    #[test]
    fn test_arrow_and_escapes() {
        assert_eq!(
            kinds(r#"() => 'it\'s'"#),
            vec![
                TokenKind::Punct('('),
                TokenKind::Punct(')'),
                TokenKind::Arrow,
                TokenKind::Str("it's".into()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_reports_line() {
        let err = tokenize("Order.ts", "\n\n@Table(\"ORDERS").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }
}
