//! Built-in math functions registered on the arithmetic engine.
//!
//! Conventions:
//! - Names are the evaluator-facing spellings (`log10`, `log` = natural log);
//!   calculator spellings such as `ln` are rewritten by the pipeline first.
//! - Every function takes and returns `f64`; the pipeline renders all numeric
//!   literals as floats.
//! - If you add a function here, add it to `MATH_BUILTINS` too, or the
//!   pipeline will reject calls to it as undefined symbols.

use rhai::Engine;

pub struct MathBuiltin {
    pub name: &'static str,
    pub description: &'static str,
}

pub const MATH_BUILTINS: &[MathBuiltin] = &[
    MathBuiltin {
        name: "sqrt",
        description: "Square root",
    },
    MathBuiltin {
        name: "sin",
        description: "Sine (radians)",
    },
    MathBuiltin {
        name: "cos",
        description: "Cosine (radians)",
    },
    MathBuiltin {
        name: "tan",
        description: "Tangent (radians)",
    },
    MathBuiltin {
        name: "asin",
        description: "Arc sine",
    },
    MathBuiltin {
        name: "acos",
        description: "Arc cosine",
    },
    MathBuiltin {
        name: "atan",
        description: "Arc tangent",
    },
    MathBuiltin {
        name: "abs",
        description: "Absolute value",
    },
    MathBuiltin {
        name: "log10",
        description: "Base-10 logarithm",
    },
    MathBuiltin {
        name: "log",
        description: "Natural logarithm",
    },
    MathBuiltin {
        name: "round",
        description: "Round half away from zero, optionally to N decimals",
    },
    MathBuiltin {
        name: "ceil",
        description: "Round up",
    },
    MathBuiltin {
        name: "floor",
        description: "Round down",
    },
];

pub fn is_math_builtin(name: &str) -> bool {
    MATH_BUILTINS.iter().any(|b| b.name == name)
}

/// Bitwise operators on floats truncate both operands to integers.
fn bitwise(a: f64, b: f64, op: fn(i64, i64) -> i64) -> f64 {
    op(a.trunc() as i64, b.trunc() as i64) as f64
}

pub fn register_builtins(engine: &mut Engine) {
    engine.register_fn("sqrt", |x: f64| x.sqrt());
    engine.register_fn("sin", |x: f64| x.sin());
    engine.register_fn("cos", |x: f64| x.cos());
    engine.register_fn("tan", |x: f64| x.tan());
    engine.register_fn("asin", |x: f64| x.asin());
    engine.register_fn("acos", |x: f64| x.acos());
    engine.register_fn("atan", |x: f64| x.atan());
    engine.register_fn("abs", |x: f64| x.abs());
    engine.register_fn("log10", |x: f64| x.log10());
    engine.register_fn("log", |x: f64| x.ln());
    engine.register_fn("round", |x: f64| x.round());
    engine.register_fn("round", |x: f64, places: f64| {
        let factor = 10f64.powi(places.trunc().clamp(0.0, 15.0) as i32);
        (x * factor).round() / factor
    });
    engine.register_fn("ceil", |x: f64| x.ceil());
    engine.register_fn("floor", |x: f64| x.floor());

    // Unary sign and power/remainder for float operands. Binary arithmetic on
    // FLOAT is otherwise built into the engine.
    engine.register_fn("-", |x: f64| -x);
    engine.register_fn("+", |x: f64| x);
    engine.register_fn("**", |a: f64, b: f64| a.powf(b));
    engine.register_fn("%", |a: f64, b: f64| a % b);

    engine.register_fn("&", |a: f64, b: f64| bitwise(a, b, |x, y| x & y));
    engine.register_fn("|", |a: f64, b: f64| bitwise(a, b, |x, y| x | y));
    engine.register_fn("^", |a: f64, b: f64| bitwise(a, b, |x, y| x ^ y));
}
