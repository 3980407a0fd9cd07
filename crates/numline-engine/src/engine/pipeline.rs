//! The line transformation pipeline.
//!
//! Passes run in a fixed order over the token stream; each one assumes the
//! syntax handled by earlier passes is already gone:
//!
//! 1. `prev` substitution
//! 2. variable substitution
//! 3. named constants (`pi`, `e`)
//! 4. date arithmetic (returns directly)
//! 5. timezone shape (returns directly)
//! 6. unit conversion (returns directly, or splices and recurses)
//! 7. currency conversion (returns directly, or strips codes and recurses)
//! 8. percent phrases (returns directly)
//! 9. word operators
//! 10. scale suffixes
//! 11. function names
//! 12. arithmetic evaluation
//!
//! A pass that does not match is a no-op.

use std::f64::consts::{E, PI};

use super::context::{EvalContext, Quantity};
use super::currency::{self, looks_like_code};
use super::dates;
use super::eval::evaluate_tokens;
use super::token::{Op, Token, join_tokens};
use super::units::{self, TemperatureScale};
use crate::error::{CalcError, Result};

/// How many times a line may re-enter the pipeline after a partial rewrite.
pub const MAX_PIPELINE_DEPTH: usize = 8;

pub(crate) fn run(ctx: &EvalContext, tokens: Vec<Token>, depth: usize) -> Result<Quantity> {
    if depth > MAX_PIPELINE_DEPTH {
        return Err(CalcError::TooDeep);
    }

    let tokens = substitute_prev(tokens, ctx.previous());
    let tokens = substitute_variables(tokens, ctx);
    let tokens = substitute_constants(tokens);

    if let Some(ms) = dates::date_arithmetic(&tokens, ctx.now())? {
        return Ok(Quantity::plain(ms));
    }
    if let Some(ms) = dates::timezone_placeholder(&tokens, ctx.now()) {
        return Ok(Quantity::plain(ms));
    }
    if let Some(result) = convert_units(ctx, &tokens, depth)? {
        return Ok(result);
    }
    if let Some(result) = convert_currency(ctx, &tokens, depth)? {
        return Ok(result);
    }
    if let Some(value) = apply_percent(&tokens) {
        return Ok(Quantity::plain(value));
    }

    let tokens = replace_word_operators(tokens);
    let tokens = expand_scales(tokens);
    let tokens = normalize_functions(tokens);

    evaluate_tokens(ctx.engine(), &tokens).map(Quantity::plain)
}

fn substitute_prev(tokens: Vec<Token>, previous: Option<f64>) -> Vec<Token> {
    let Some(previous) = previous else {
        // Left in place; it fails later as an undefined symbol.
        return tokens;
    };
    tokens
        .into_iter()
        .map(|t| match t {
            Token::Ident(ref name) if name == "prev" => Token::Number(previous),
            other => other,
        })
        .collect()
}

fn substitute_variables(tokens: Vec<Token>, ctx: &EvalContext) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|t| {
            let value = t.as_ident().and_then(|name| ctx.variable(name)).map(|v| v.value);
            match value {
                Some(value) => Token::Number(value),
                None => t,
            }
        })
        .collect()
}

fn substitute_constants(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|t| match t {
            Token::Ident(ref name) if name.eq_ignore_ascii_case("pi") => Token::Number(PI),
            Token::Ident(ref name) if name == "e" => Token::Number(E),
            other => other,
        })
        .collect()
}

fn is_conversion_keyword(token: &Token) -> bool {
    ["in", "to", "as", "into"].iter().any(|kw| token.is_word(kw))
}

/// A currency name, or something shaped like an ISO code.
fn is_currency_like(ctx: &EvalContext, word: &str) -> bool {
    currency::name_code(word).is_some()
        || looks_like_code(word)
        || (word.len() == 3 && ctx.currency().is_currency_code(word))
}

/// `<n> <unit> in <unit>` with temperature, category and currency routing.
fn convert_pair(ctx: &EvalContext, value: f64, from: &str, to: &str) -> Result<Option<Quantity>> {
    if TemperatureScale::from_alias(from).is_some() || TemperatureScale::from_alias(to).is_some() {
        let converted = units::convert_temperature(value, from, to)?;
        let symbol = TemperatureScale::from_alias(to).map(|s| s.symbol()).unwrap_or(to);
        return Ok(Some(Quantity::with_unit(converted, symbol)));
    }

    if is_currency_like(ctx, from) && is_currency_like(ctx, to) {
        return Ok(None);
    }

    let converted = units::convert(value, from, to)?;
    let symbol = units::lookup(to).map(|u| u.symbol).unwrap_or(to);
    Ok(Some(Quantity::with_unit(converted, symbol)))
}

/// The signed number a conversion starts with, and the tokens after it.
fn leading_number(tokens: &[Token]) -> Option<(f64, &[Token])> {
    match tokens {
        [Token::Op(Op::Sub), first, rest @ ..] => first.as_number().map(|n| (-n, rest)),
        [first, rest @ ..] => first.as_number().map(|n| (n, rest)),
        [] => None,
    }
}

fn convert_units(ctx: &EvalContext, tokens: &[Token], depth: usize) -> Result<Option<Quantity>> {
    let Some((value, rest)) = leading_number(tokens) else {
        return Ok(None);
    };

    // Whole line: "20 inches in cm". Failures are errors.
    if let [Token::Ident(from), keyword, Token::Ident(to)] = rest
        && is_conversion_keyword(keyword)
    {
        return convert_pair(ctx, value, from, to);
    }

    // Leading conversion inside a longer line: "20 inches in cm + 5".
    // Failures make the pass a no-op.
    if let [Token::Ident(from), keyword, Token::Ident(to), tail @ ..] = rest
        && is_conversion_keyword(keyword)
        && !tail.is_empty()
    {
        let Ok(Some(converted)) = convert_pair(ctx, value, from, to) else {
            return Ok(None);
        };
        let mut spliced = Vec::with_capacity(tail.len() + 1);
        spliced.push(Token::Number(converted.value));
        spliced.extend_from_slice(tail);
        tracing::debug!(line = %join_tokens(&spliced), "spliced leading unit conversion");
        return run(ctx, spliced, depth + 1).map(Some);
    }

    Ok(None)
}

/// Turn currency symbols and names into ISO code identifiers. A symbol in
/// front of a number moves behind it (`$20` -> `20 USD`).
fn normalize_currency(tokens: &[Token]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0usize;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Currency(symbol) => {
                let code = currency::symbol_code(symbol).unwrap_or("USD");
                if let Some(Token::Number(n)) = tokens.get(i + 1) {
                    out.push(Token::Number(*n));
                    out.push(Token::ident(code));
                    i += 2;
                    continue;
                }
                out.push(Token::ident(code));
            }
            Token::Ident(name) => match currency::name_code(name) {
                Some(code) => out.push(Token::ident(code)),
                None => out.push(tokens[i].clone()),
            },
            other => out.push(other.clone()),
        }
        i += 1;
    }
    out
}

fn is_code_token(token: &Token) -> bool {
    token.as_ident().is_some_and(looks_like_code)
}

fn convert_currency(ctx: &EvalContext, tokens: &[Token], depth: usize) -> Result<Option<Quantity>> {
    let normalized = normalize_currency(tokens);

    if let Some((value, rest)) = leading_number(&normalized)
        && let [Token::Ident(from), keyword, Token::Ident(to)] = rest
        && from.len() == 3
        && to.len() == 3
        && from.chars().all(|c| c.is_ascii_alphabetic())
        && to.chars().all(|c| c.is_ascii_alphabetic())
        && ["in", "to", "as"].iter().any(|kw| keyword.is_word(kw))
    {
        let converted = ctx.currency().convert(value, from, to)?;
        return Ok(Some(Quantity::with_unit(converted, to.to_uppercase())));
    }

    // Compound lines drop every code and evaluate the arithmetic that is left.
    if normalized.iter().any(is_code_token) {
        let stripped: Vec<Token> = normalized.into_iter().filter(|t| !is_code_token(t)).collect();
        tracing::debug!(line = %join_tokens(&stripped), "evaluating currency line without codes");
        return match run(ctx, stripped, depth + 1) {
            Ok(result) => Ok(Some(Quantity::plain(result.value))),
            Err(CalcError::TooDeep) => Err(CalcError::TooDeep),
            Err(_) => Ok(None),
        };
    }

    Ok(None)
}

fn apply_percent(tokens: &[Token]) -> Option<f64> {
    use Token::{Number, Op as Operator};

    match tokens {
        [Number(p), Operator(Op::Percent), of, Number(v)] if of.is_word("of") => {
            Some((p / 100.0) * v)
        }
        [Number(v), Operator(Op::Add), Number(p), Operator(Op::Percent)] => {
            Some(v * (1.0 + p / 100.0))
        }
        [Number(v), Operator(Op::Sub), Number(p), Operator(Op::Percent)] => {
            Some(v * (1.0 - p / 100.0))
        }
        [Number(p), Operator(Op::Percent)] => Some(p / 100.0),
        _ => None,
    }
}

fn replace_word_operators(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0usize;
    while i < tokens.len() {
        let token = &tokens[i];
        let replacement = match token.as_ident().map(|w| w.to_lowercase()).as_deref() {
            Some("plus") => Some(Op::Add),
            Some("minus") => Some(Op::Sub),
            Some("times") => Some(Op::Mul),
            Some("mod") => Some(Op::Percent),
            Some("and") => Some(Op::BitAnd),
            Some("or") => Some(Op::BitOr),
            Some("xor") => Some(Op::BitXor),
            Some("x") => {
                let left = out.last().is_some_and(Token::ends_operand);
                let right = tokens.get(i + 1).is_some_and(Token::starts_operand);
                (left && right).then_some(Op::Mul)
            }
            Some("divided") if tokens.get(i + 1).is_some_and(|t| t.is_word("by")) => {
                i += 1;
                Some(Op::Div)
            }
            _ => None,
        };
        match replacement {
            Some(op) => out.push(Token::Op(op)),
            None => out.push(token.clone()),
        }
        i += 1;
    }
    out
}

fn scale_factor(word: &str) -> Option<f64> {
    match word {
        "M" => return Some(1e6),
        "B" => return Some(1e9),
        _ => {}
    }
    match word.to_lowercase().as_str() {
        "k" | "thousand" => Some(1e3),
        "million" => Some(1e6),
        "billion" => Some(1e9),
        "trillion" => Some(1e12),
        _ => None,
    }
}

fn expand_scales(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Some(factor) = token.as_ident().and_then(scale_factor)
            && let Some(Token::Number(n)) = out.last_mut()
        {
            *n *= factor;
            continue;
        }
        out.push(token);
    }
    out
}

fn function_name(word: &str) -> Option<&'static str> {
    match word.to_lowercase().as_str() {
        "log" => Some("log10"),
        "ln" => Some("log"),
        "sqrt" => Some("sqrt"),
        "sin" => Some("sin"),
        "cos" => Some("cos"),
        "tan" => Some("tan"),
        "asin" => Some("asin"),
        "acos" => Some("acos"),
        "atan" => Some("atan"),
        "abs" => Some("abs"),
        "round" => Some("round"),
        "ceil" => Some("ceil"),
        "floor" => Some("floor"),
        _ => None,
    }
}

fn normalize_functions(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = tokens.clone();
    for (idx, token) in tokens.iter().enumerate() {
        if !matches!(tokens.get(idx + 1), Some(Token::LParen)) {
            continue;
        }
        if let Some(name) = token.as_ident().and_then(function_name) {
            out[idx] = Token::ident(name);
        }
    }
    out
}
