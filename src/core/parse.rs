//! Tokenizer for the declarative config format.
//!
//! The format is `key = value` lines with `#` comments, where a value is a
//! quoted string, an integer, `true`/`false`, or a bracketed list of
//! strings that may span lines. Parsing is lenient: anything malformed is
//! reported with a warning and skipped, never fatal.
//!
//! Tokenizing happens in passes:
//! 1. characters become [`Token`]s (symbols, strings, ints, bools)
//! 2. `name =` pairs collapse into [`Token::Assign`]
//! 3. bracketed runs collapse into [`Token::List`]

use std::iter::Peekable;
use std::str::Chars;

/// A lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare word or punctuation (`[`, `]`, `,`, `=`).
    Symbol(String),
    Bool(bool),
    Str(String),
    Int(i64),
    /// A `name =` prefix awaiting its value.
    Assign(String),
    /// A collapsed `[ ... ]` run.
    List(Vec<String>),
}

impl Token {
    /// Short description for warnings.
    pub fn describe(&self) -> String {
        match self {
            Token::Symbol(s) => format!("`{}`", s),
            Token::Bool(b) => format!("boolean {}", b),
            Token::Str(s) => format!("string \"{}\"", s),
            Token::Int(i) => format!("integer {}", i),
            Token::Assign(name) => format!("assignment to `{}`", name),
            Token::List(items) => format!("list of {} items", items.len()),
        }
    }

    fn is_symbol(&self, s: &str) -> bool {
        matches!(self, Token::Symbol(sym) if sym == s)
    }
}

/// A fully collapsed `key = value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: String,
    pub value: Token,
}

/// Turn config text into assignments, warning about anything unusable.
pub fn assignments(content: &str) -> Vec<Assignment> {
    let tokens = collapse_lists(collapse_assignments(lex(content)));

    let mut result = Vec::new();
    let mut iter = tokens.into_iter().peekable();
    while let Some(token) = iter.next() {
        match token {
            Token::Assign(key) => match iter.peek() {
                Some(Token::Assign(_)) | None => {
                    tracing::warn!("missing value for `{}`", key);
                }
                Some(_) => {
                    if let Some(value) = iter.next() {
                        result.push(Assignment { key, value });
                    }
                }
            },
            other => tracing::warn!("ignoring stray {}", other.describe()),
        }
    }
    result
}

/// Pass 1: characters to raw tokens.
fn lex(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = content.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' | '\'' => {
                chars.next();
                tokens.push(Token::Str(lex_string(&mut chars, c)));
            }
            '[' | ']' | ',' | '=' => {
                chars.next();
                tokens.push(Token::Symbol(c.to_string()));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '[' | ']' | ',' | '=' | '#' | '"' | '\'') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(classify_word(word));
            }
        }
    }
    tokens
}

/// Read a quoted string; the opening quote is already consumed.
///
/// A backslash escapes the quote character or another backslash. A string
/// left open at end of line is closed there.
fn lex_string(chars: &mut Peekable<Chars<'_>>, quote: char) -> String {
    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == quote {
            return value;
        }
        if c == '\n' {
            break;
        }
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == quote || next == '\\' {
                    value.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        value.push(c);
    }
    tracing::warn!("unterminated string: {}{}", quote, value);
    value
}

fn classify_word(word: String) -> Token {
    match word.as_str() {
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        _ => match word.parse::<i64>() {
            Ok(i) => Token::Int(i),
            Err(_) => Token::Symbol(word),
        },
    }
}

/// Pass 2: `name` followed by `=` becomes `Assign(name)`.
fn collapse_assignments(tokens: Vec<Token>) -> Vec<Token> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();
    while let Some(token) = iter.next() {
        let is_name = matches!(&token, Token::Symbol(s) if !matches!(s.as_str(), "[" | "]" | "," | "="));
        if is_name && iter.peek().is_some_and(|t| t.is_symbol("=")) {
            iter.next();
            if let Token::Symbol(name) = token {
                result.push(Token::Assign(name));
            }
        } else if token.is_symbol("=") {
            tracing::warn!("ignoring `=` without a key");
        } else {
            result.push(token);
        }
    }
    result
}

/// Pass 3: `[` ... `]` runs become `List`.
///
/// Items must be strings; anything else inside the brackets is dropped
/// with a warning. A list with no closing bracket extends to end of input.
fn collapse_lists(tokens: Vec<Token>) -> Vec<Token> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        if !token.is_symbol("[") {
            result.push(token);
            continue;
        }

        let mut items = Vec::new();
        let mut closed = false;
        for inner in iter.by_ref() {
            match inner {
                Token::Symbol(s) if s == "]" => {
                    closed = true;
                    break;
                }
                Token::Symbol(s) if s == "," => {}
                Token::Str(s) => items.push(s),
                other => tracing::warn!("ignoring non-string list item: {}", other.describe()),
            }
        }
        if !closed {
            tracing::warn!("unterminated list; treating it as extending to end of file");
        }
        result.push(Token::List(items));
    }
    result
}
