//! Tokenizer for the configuration dialect.
//!
//! Comments are stripped first (replaced by spaces so that line and column
//! positions survive), then the remaining text is split into tokens.
//! Parenthesised expressions such as `list(string)` or `toset([...])` are
//! kept verbatim as a single [`TokenKind::Expr`] once their parentheses
//! balance; the parser decides where they may appear.

use crate::error::{CompilerError, Result};

/// Kind of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// Bare word: keyword, attribute key, literal word or dotted reference.
    Ident(String),
    /// Quoted string with escapes processed.
    Str(String),
    /// Numeric literal.
    Number(f64),
    /// Balanced parenthesised expression, optionally prefixed by a function name.
    Expr(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Equals,
    Colon,
    Comma,
}

impl TokenKind {
    /// Short description used in error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Ident(s) => format!("'{s}'"),
            Self::Str(s) => format!("string \"{s}\""),
            Self::Number(n) => format!("number {n}"),
            Self::Expr(s) => format!("expression '{s}'"),
            Self::LBrace => "'{'".to_string(),
            Self::RBrace => "'}'".to_string(),
            Self::LBracket => "'['".to_string(),
            Self::RBracket => "']'".to_string(),
            Self::Equals => "'='".to_string(),
            Self::Colon => "':'".to_string(),
            Self::Comma => "','".to_string(),
        }
    }
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

fn parse_error(file: &str, line: usize, column: usize, message: impl Into<String>) -> CompilerError {
    CompilerError::ParseError {
        file: file.to_string(),
        line,
        column,
        message: message.into(),
    }
}

/// Replaces `#`, `//` and `/* */` comments with spaces, keeping newlines.
///
/// Comment markers inside quoted strings are left alone.
pub(crate) fn strip_comments(source: &str, file: &str) -> Result<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;
    let mut line = 1;
    let mut column = 1;
    let mut in_string = false;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = next {
                    if escaped != '\n' {
                        out.push(escaped);
                        i += 2;
                        column += 2;
                        continue;
                    }
                }
            } else if c == '"' || c == '\n' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == '#' || (c == '/' && next == Some('/')) {
            while i < chars.len() && chars[i] != '\n' {
                out.push(' ');
                i += 1;
                column += 1;
            }
            continue;
        } else if c == '/' && next == Some('*') {
            let (start_line, start_column) = (line, column);
            out.push_str("  ");
            i += 2;
            column += 2;
            loop {
                match chars.get(i) {
                    None => {
                        return Err(parse_error(
                            file,
                            start_line,
                            start_column,
                            "unterminated block comment",
                        ))
                    }
                    Some('*') if chars.get(i + 1) == Some(&'/') => {
                        out.push_str("  ");
                        i += 2;
                        column += 2;
                        break;
                    }
                    Some('\n') => {
                        out.push('\n');
                        i += 1;
                        line += 1;
                        column = 1;
                    }
                    Some(_) => {
                        out.push(' ');
                        i += 1;
                        column += 1;
                    }
                }
            }
            continue;
        } else {
            out.push(c);
        }

        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
        i += 1;
    }

    Ok(out)
}

/// Splits comment-free source text into tokens.
pub(crate) fn tokenize(source: &str, file: &str) -> Result<Vec<Token>> {
    Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
        file,
    }
    .run()
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    file: &'a str,
}

impl Lexer<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
                continue;
            }

            let (line, column) = (self.line, self.column);
            let kind = match c {
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                '=' => self.single(TokenKind::Equals),
                ':' => self.single(TokenKind::Colon),
                ',' => self.single(TokenKind::Comma),
                '"' => self.string(line, column)?,
                '-' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                    self.number(line, column)?
                }
                d if d.is_ascii_digit() => self.number(line, column)?,
                a if a.is_ascii_alphabetic() || a == '_' => self.ident(line, column)?,
                '(' => self.expression(String::new(), line, column)?,
                other => {
                    let message = if other == '?' || other == '$' {
                        format!("unsupported expression syntax '{other}'")
                    } else {
                        format!("unexpected character '{other}'")
                    };
                    return Err(parse_error(self.file, line, column, message));
                }
            };
            tokens.push(Token { kind, line, column });
        }

        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn string(&mut self, line: usize, column: usize) -> Result<TokenKind> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(parse_error(
                        self.file,
                        line,
                        column,
                        "unterminated string literal",
                    ))
                }
                Some('"') => return Ok(TokenKind::Str(value)),
                Some('\\') => match self.bump() {
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        return Err(parse_error(
                            self.file,
                            line,
                            column,
                            "unterminated string literal",
                        ))
                    }
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn number(&mut self, line: usize, column: usize) -> Result<TokenKind> {
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.bump();
        }
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '-' || c == '+') && text.ends_with(['e', 'E']);
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        text.parse::<f64>().map(TokenKind::Number).map_err(|_| {
            parse_error(self.file, line, column, format!("invalid number '{text}'"))
        })
    }

    fn ident(&mut self, line: usize, column: usize) -> Result<TokenKind> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                text.push(c);
                self.bump();
            } else if c == '[' && text.contains('.') && self.index_suffix_len().is_some() {
                let len = self.index_suffix_len().unwrap_or(0);
                for _ in 0..len {
                    if let Some(ch) = self.bump() {
                        text.push(ch);
                    }
                }
            } else {
                break;
            }
        }
        if self.peek() == Some('(') {
            return self.expression(text, line, column);
        }
        Ok(TokenKind::Ident(text))
    }

    /// Appends a parenthesised expression at the cursor to `text`.
    fn expression(&mut self, mut text: String, line: usize, column: usize) -> Result<TokenKind> {
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            text.push(c);
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(TokenKind::Expr(text));
                    }
                }
                '"' => self.quoted_verbatim(&mut text, line, column)?,
                _ => {}
            }
        }
        Err(parse_error(
            self.file,
            line,
            column,
            "unbalanced '(' in expression",
        ))
    }

    /// Copies the rest of a quoted string inside an expression, escapes untouched.
    fn quoted_verbatim(&mut self, text: &mut String, line: usize, column: usize) -> Result<()> {
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(parse_error(
                        self.file,
                        line,
                        column,
                        "unterminated string literal",
                    ))
                }
                Some('"') => {
                    text.push('"');
                    return Ok(());
                }
                Some('\\') => {
                    text.push('\\');
                    if let Some(escaped) = self.bump() {
                        text.push(escaped);
                    }
                }
                Some(c) => text.push(c),
            }
        }
    }

    /// Length of an index accessor like `[0]` or `[*]` at the cursor.
    fn index_suffix_len(&self) -> Option<usize> {
        let mut offset = 1;
        while let Some(c) = self.peek_at(offset) {
            match c {
                ']' if offset > 1 => return Some(offset + 1),
                d if d.is_ascii_digit() || d == '*' => offset += 1,
                _ => return None,
            }
        }
        None
    }
}
