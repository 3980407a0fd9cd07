//! Line tokenizer.
//!
//! Every rewriting pass works on the token stream produced here instead of
//! on raw substrings. A value substituted by one pass is a `Number` token and
//! can never be re-matched as a name by a later pass, and `x` never matches
//! inside `max`.

use std::fmt;

use super::currency;

/// Arithmetic operators understood by the evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    /// `%`: a percent sign for the percent pass, remainder otherwise.
    Percent,
    BitAnd,
    BitOr,
    BitXor,
}

impl Op {
    /// Operator spelling in the arithmetic evaluator's syntax.
    pub fn as_script(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Pow => "**",
            Op::Percent => "%",
            Op::BitAnd => "&",
            Op::BitOr => "|",
            Op::BitXor => "^",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    /// A currency symbol such as `$`, `€` or `NZ$`.
    Currency(&'static str),
    Op(Op),
    LParen,
    RParen,
    Comma,
    Equals,
    Colon,
    Other(char),
}

impl Token {
    pub fn ident(name: &str) -> Token {
        Token::Ident(name.to_string())
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Token::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Token::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// True for an identifier equal to `word`, ignoring ASCII case.
    pub fn is_word(&self, word: &str) -> bool {
        self.as_ident().is_some_and(|name| name.eq_ignore_ascii_case(word))
    }

    /// True if the token can end an operand (`2`, `x`, `)`).
    pub fn ends_operand(&self) -> bool {
        matches!(self, Token::Number(_) | Token::Ident(_) | Token::RParen)
    }

    /// True if the token can start an operand (`2`, `x`, `(`).
    pub fn starts_operand(&self) -> bool {
        matches!(self, Token::Number(_) | Token::Ident(_) | Token::LParen)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Currency(symbol) => write!(f, "{}", symbol),
            Token::Op(op) => match op {
                Op::Pow => write!(f, "^"),
                other => write!(f, "{}", other.as_script()),
            },
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Equals => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::Other(c) => write!(f, "{}", c),
        }
    }
}

/// Render tokens back to a readable, space separated line.
pub fn join_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a line into tokens. Whitespace is dropped; it never carries meaning
/// once words and numbers are separated.
pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let starts_number = c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()));
        if starts_number {
            let end = scan_number(&chars, i);
            let text: String = chars[i..end].iter().collect();
            match text.parse::<f64>() {
                Ok(n) => tokens.push(Token::Number(n)),
                Err(_) => tokens.extend(text.chars().map(Token::Other)),
            }
            i = end;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();

            // Prefixed dollar symbols: `A$`, `NZ$`, `HK$`, ...
            if chars.get(i) == Some(&'$')
                && let Some(symbol) = currency::lookup_symbol(&format!("{}$", word))
            {
                tokens.push(Token::Currency(symbol));
                i += 1;
                continue;
            }

            tokens.push(Token::Ident(word));
            continue;
        }

        let mut buf = [0u8; 4];
        if let Some(symbol) = currency::lookup_symbol(c.encode_utf8(&mut buf)) {
            tokens.push(Token::Currency(symbol));
            i += 1;
            continue;
        }

        let token = match c {
            '+' => Token::Op(Op::Add),
            '-' | '−' => Token::Op(Op::Sub),
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::Op(Op::Pow)
            }
            '*' | '×' => Token::Op(Op::Mul),
            '/' | '÷' => Token::Op(Op::Div),
            '^' => Token::Op(Op::Pow),
            '%' => Token::Op(Op::Percent),
            '&' => Token::Op(Op::BitAnd),
            '|' => Token::Op(Op::BitOr),
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '=' => Token::Equals,
            ':' => Token::Colon,
            other => Token::Other(other),
        };
        tokens.push(token);
        i += 1;
    }

    tokens
}

/// Return the index one past the end of the numeric literal starting at `start`.
fn scan_number(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }

    // Exponent only when digits follow, so `2e` and `5em` stay a number + word.
    if matches!(chars.get(i), Some('e' | 'E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+' | '-')) {
            j += 1;
        }
        if chars.get(j).is_some_and(|d| d.is_ascii_digit()) {
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            // `2e3x` is not a literal either.
            if !chars.get(j).is_some_and(|d| d.is_alphabetic()) {
                i = j;
            }
        }
    }
    i
}
