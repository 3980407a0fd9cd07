//! Arithmetic evaluation through Rhai.
//!
//! The engine is created raw: no standard packages, only the math built-ins
//! from [`crate::builtins`]. The rewritten token stream is checked and
//! rendered into a plain arithmetic script before it is handed over, so
//! nothing but numbers, operators, parentheses and whitelisted function calls
//! ever reaches the script engine.

use rhai::{Dynamic, Engine};

use super::token::{Op, Token};
use crate::builtins::is_math_builtin;
use crate::error::{CalcError, Result};

const MAX_OPERATIONS: u64 = 100_000;
const MAX_EXPR_DEPTH: usize = 64;

/// Create the arithmetic engine with the math built-ins registered.
pub fn create_engine() -> Engine {
    let mut engine = Engine::new_raw();
    engine.set_max_operations(MAX_OPERATIONS);
    engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH);
    crate::builtins::register_builtins(&mut engine);
    engine
}

/// Render tokens as an arithmetic script.
///
/// Fails with `UnknownSymbol` for an identifier that is not a function call
/// and with `Syntax` for characters outside the arithmetic alphabet.
pub fn render_script(tokens: &[Token]) -> Result<String> {
    if tokens.is_empty() {
        return Err(CalcError::Syntax("Empty expression".to_string()));
    }

    let mut out = String::new();
    render_into(tokens, &mut out)?;
    Ok(out)
}

fn render_into(tokens: &[Token], out: &mut String) -> Result<()> {
    let mut idx = 0usize;
    while idx < tokens.len() {
        let closes = matches!(tokens[idx], Token::RParen | Token::Comma);
        if !out.is_empty() && !out.ends_with('(') && !closes {
            out.push(' ');
        }

        // A negated operand keeps its power chain inside the negation:
        // `-2 ^ 2` is `-(2 ** 2)`.
        if tokens[idx] == Token::Op(Op::Sub) && is_unary_position(tokens, idx) {
            let end = operand_end(tokens, idx + 1);
            out.push_str("-(");
            render_into(&tokens[idx + 1..end], out)?;
            out.push(')');
            idx = end;
            continue;
        }

        match &tokens[idx] {
            Token::Number(n) => out.push_str(&float_literal(*n)?),
            Token::Ident(name) => {
                let is_call = matches!(tokens.get(idx + 1), Some(Token::LParen));
                if !(is_call && is_math_builtin(name)) {
                    return Err(CalcError::UnknownSymbol(name.clone()));
                }
                out.push_str(name);
            }
            Token::Op(op) => out.push_str(op.as_script()),
            Token::LParen => out.push('('),
            Token::RParen => out.push(')'),
            Token::Comma => out.push(','),
            Token::Currency(symbol) => {
                return Err(CalcError::Syntax(format!(
                    "Unexpected currency symbol '{}'",
                    symbol
                )));
            }
            Token::Equals => return Err(CalcError::Syntax("Unexpected '='".to_string())),
            Token::Colon => return Err(CalcError::Syntax("Unexpected ':'".to_string())),
            Token::Other(c) => {
                return Err(CalcError::Syntax(format!("Unexpected character '{}'", c)));
            }
        }
        idx += 1;
    }
    Ok(())
}

/// A sign is unary at the start, or after an operator, `(` or `,`.
fn is_unary_position(tokens: &[Token], idx: usize) -> bool {
    idx == 0
        || matches!(
            tokens[idx - 1],
            Token::Op(_) | Token::LParen | Token::Comma
        )
}

/// One past the end of the operand starting at `start`, including any
/// `** <operand>` chain that follows it.
fn operand_end(tokens: &[Token], start: usize) -> usize {
    let mut pos = start;
    while matches!(tokens.get(pos), Some(Token::Op(Op::Sub | Op::Add))) {
        pos += 1;
    }

    pos = match tokens.get(pos) {
        None => return pos,
        Some(Token::LParen) => group_end(tokens, pos),
        Some(Token::Ident(_)) if tokens.get(pos + 1) == Some(&Token::LParen) => {
            group_end(tokens, pos + 1)
        }
        Some(_) => pos + 1,
    };

    if tokens.get(pos) == Some(&Token::Op(Op::Pow)) {
        return operand_end(tokens, pos + 1);
    }
    pos
}

/// One past the `)` matching the `(` at `open`, or the end of the slice.
fn group_end(tokens: &[Token], open: usize) -> usize {
    let mut depth = 0usize;
    for (offset, token) in tokens[open..].iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth == 0 {
                    return open + offset + 1;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

/// Evaluate fully rewritten tokens to a number.
pub fn evaluate_tokens(engine: &Engine, tokens: &[Token]) -> Result<f64> {
    let script = render_script(tokens)?;
    tracing::trace!(%script, "delegating to arithmetic engine");

    let value = engine
        .eval::<Dynamic>(&script)
        .map_err(|e| CalcError::Syntax(e.to_string()))?;

    if let Ok(n) = value.as_float() {
        return Ok(n);
    }
    if let Ok(n) = value.as_int() {
        return Ok(n as f64);
    }
    Err(CalcError::Syntax(format!(
        "Expression produced a {} instead of a number",
        value.type_name()
    )))
}

/// A float literal the script engine always reads as FLOAT, never INT.
fn float_literal(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(CalcError::NonFinite(value));
    }

    let mut text = format!("{:?}", value.abs());
    if !text.contains('.') {
        // `1e21` -> `1.0e21`
        match text.find('e') {
            Some(pos) => text.insert_str(pos, ".0"),
            None => text.push_str(".0"),
        }
    }

    if value.is_sign_negative() && value != 0.0 {
        Ok(format!("(-{})", text))
    } else {
        Ok(text)
    }
}
