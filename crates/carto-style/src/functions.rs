//! Built-in Functions
//!
//! Color manipulation and math helpers callable from expressions. Arguments
//! arrive fully evaluated; percentages are plain numbers (`lighten(@c, 10)`
//! lightens by ten percentage points).

use std::collections::HashMap;

use carto_tree::{Color, Hsla, SourceLocation, Value};

use crate::error::{StyleError, StyleResult};

/// Signature of a built-in function
pub type BuiltinFn = fn(&FunctionCall<'_>) -> StyleResult<Value>;

/// A single call site, handed to the function implementation
#[derive(Debug, Clone, Copy)]
pub struct FunctionCall<'a> {
    pub name: &'a str,
    pub args: &'a [Value],
    pub location: &'a SourceLocation,
}

impl FunctionCall<'_> {
    /// Fail unless exactly `n` arguments were passed
    pub fn expect_arity(&self, n: usize) -> StyleResult<()> {
        self.expect_arity_range(n, n)
    }

    pub fn expect_arity_range(&self, min: usize, max: usize) -> StyleResult<()> {
        let got = self.args.len();
        if got < min || got > max {
            let expected = if min == max {
                format!("{}", min)
            } else if max == usize::MAX {
                format!("at least {}", min)
            } else {
                format!("{} to {}", min, max)
            };
            return Err(self.error(format!("expected {} arguments, got {}", expected, got)));
        }
        Ok(())
    }

    /// Numeric argument at `index`
    pub fn number(&self, index: usize) -> StyleResult<f64> {
        match self.args.get(index) {
            Some(value) => value.as_f64().ok_or_else(|| {
                self.error(format!(
                    "argument {} must be a number, got {}",
                    index + 1,
                    value.value_type()
                ))
            }),
            None => Err(self.error(format!("missing argument {}", index + 1))),
        }
    }

    /// Color argument at `index`
    pub fn color(&self, index: usize) -> StyleResult<Color> {
        match self.args.get(index) {
            Some(value) => value.as_color().ok_or_else(|| {
                self.error(format!(
                    "argument {} must be a color, got {}",
                    index + 1,
                    value.value_type()
                ))
            }),
            None => Err(self.error(format!("missing argument {}", index + 1))),
        }
    }

    pub fn error(&self, message: impl Into<String>) -> StyleError {
        StyleError::invalid_argument(self.name, message, self.location)
    }
}

/// Name to implementation table consulted for function-call nodes
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, BuiltinFn>,
}

impl FunctionRegistry {
    /// Registry without any functions
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registry with every built-in function
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        // Constructors
        registry.register("rgb", rgb);
        registry.register("rgba", rgba);
        registry.register("hsl", hsl);
        registry.register("hsla", hsla);

        // Channel accessors
        registry.register("red", red);
        registry.register("green", green);
        registry.register("blue", blue);
        registry.register("alpha", alpha);
        registry.register("hue", hue);
        registry.register("saturation", saturation);
        registry.register("lightness", lightness);

        // Color operations
        registry.register("lighten", lighten);
        registry.register("darken", darken);
        registry.register("saturate", saturate);
        registry.register("desaturate", desaturate);
        registry.register("fadein", fadein);
        registry.register("fadeout", fadeout);
        registry.register("spin", spin);
        registry.register("mix", mix);
        registry.register("greyscale", greyscale);

        // Math
        registry.register("round", round);
        registry.register("ceil", ceil);
        registry.register("floor", floor);
        registry.register("abs", abs);
        registry.register("sqrt", sqrt);
        registry.register("min", min);
        registry.register("max", max);
        registry.register("percentage", percentage);

        registry
    }

    /// Add or replace a function
    pub fn register(&mut self, name: impl Into<String>, function: BuiltinFn) {
        self.functions.insert(name.into(), function);
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.functions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn channel(v: f64) -> u8 {
    if v.is_nan() { 0 } else { v.round().clamp(0.0, 255.0) as u8 }
}

fn fraction_to_channel(v: f64) -> u8 {
    channel(v * 255.0)
}

fn rgb(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(3)?;
    Ok(Value::Color(Color::rgb(
        channel(call.number(0)?),
        channel(call.number(1)?),
        channel(call.number(2)?),
    )))
}

fn rgba(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(4)?;
    Ok(Value::Color(Color::rgba(
        channel(call.number(0)?),
        channel(call.number(1)?),
        channel(call.number(2)?),
        fraction_to_channel(call.number(3)?),
    )))
}

fn hsl(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(3)?;
    Ok(Value::Color(Color::from_hsla(Hsla {
        h: call.number(0)?,
        s: call.number(1)? / 100.0,
        l: call.number(2)? / 100.0,
        a: 1.0,
    })))
}

fn hsla(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(4)?;
    Ok(Value::Color(Color::from_hsla(Hsla {
        h: call.number(0)?,
        s: call.number(1)? / 100.0,
        l: call.number(2)? / 100.0,
        a: call.number(3)?,
    })))
}

fn red(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(1)?;
    Ok(Value::Double(call.color(0)?.r as f64))
}

fn green(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(1)?;
    Ok(Value::Double(call.color(0)?.g as f64))
}

fn blue(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(1)?;
    Ok(Value::Double(call.color(0)?.b as f64))
}

fn alpha(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(1)?;
    Ok(Value::Double(call.color(0)?.alpha_fraction()))
}

fn hue(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(1)?;
    Ok(Value::Double(call.color(0)?.to_hsla().h.round()))
}

fn saturation(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(1)?;
    Ok(Value::Double((call.color(0)?.to_hsla().s * 100.0).round()))
}

fn lightness(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(1)?;
    Ok(Value::Double((call.color(0)?.to_hsla().l * 100.0).round()))
}

/// Apply `adjust` to the HSLA form of the first argument, the second
/// argument being the amount
fn adjust_hsla(call: &FunctionCall<'_>, adjust: impl Fn(&mut Hsla, f64)) -> StyleResult<Value> {
    call.expect_arity(2)?;
    let mut hsla = call.color(0)?.to_hsla();
    adjust(&mut hsla, call.number(1)?);
    Ok(Value::Color(Color::from_hsla(hsla)))
}

fn lighten(call: &FunctionCall<'_>) -> StyleResult<Value> {
    adjust_hsla(call, |c, amount| c.l = (c.l + amount / 100.0).clamp(0.0, 1.0))
}

fn darken(call: &FunctionCall<'_>) -> StyleResult<Value> {
    adjust_hsla(call, |c, amount| c.l = (c.l - amount / 100.0).clamp(0.0, 1.0))
}

fn saturate(call: &FunctionCall<'_>) -> StyleResult<Value> {
    adjust_hsla(call, |c, amount| c.s = (c.s + amount / 100.0).clamp(0.0, 1.0))
}

fn desaturate(call: &FunctionCall<'_>) -> StyleResult<Value> {
    adjust_hsla(call, |c, amount| c.s = (c.s - amount / 100.0).clamp(0.0, 1.0))
}

fn fadein(call: &FunctionCall<'_>) -> StyleResult<Value> {
    adjust_hsla(call, |c, amount| c.a = (c.a + amount / 100.0).clamp(0.0, 1.0))
}

fn fadeout(call: &FunctionCall<'_>) -> StyleResult<Value> {
    adjust_hsla(call, |c, amount| c.a = (c.a - amount / 100.0).clamp(0.0, 1.0))
}

fn spin(call: &FunctionCall<'_>) -> StyleResult<Value> {
    adjust_hsla(call, |c, degrees| c.h = (c.h + degrees).rem_euclid(360.0))
}

fn greyscale(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity(1)?;
    let mut hsla = call.color(0)?.to_hsla();
    hsla.s = 0.0;
    Ok(Value::Color(Color::from_hsla(hsla)))
}

/// Weighted mix of two colors, alpha-aware
fn mix(call: &FunctionCall<'_>) -> StyleResult<Value> {
    call.expect_arity_range(2, 3)?;
    let c1 = call.color(0)?;
    let c2 = call.color(1)?;
    let weight = if call.args.len() == 3 { call.number(2)? } else { 50.0 };

    let p = (weight / 100.0).clamp(0.0, 1.0);
    let w = p * 2.0 - 1.0;
    let a = c1.alpha_fraction() - c2.alpha_fraction();

    let ratio = if w * a == -1.0 { w } else { (w + a) / (1.0 + w * a) };
    let w1 = (ratio + 1.0) / 2.0;
    let w2 = 1.0 - w1;

    let mixed = |x: u8, y: u8| channel(x as f64 * w1 + y as f64 * w2);
    Ok(Value::Color(Color::rgba(
        mixed(c1.r, c2.r),
        mixed(c1.g, c2.g),
        mixed(c1.b, c2.b),
        fraction_to_channel(c1.alpha_fraction() * p + c2.alpha_fraction() * (1.0 - p)),
    )))
}

fn unary_math(call: &FunctionCall<'_>, f: fn(f64) -> f64) -> StyleResult<Value> {
    call.expect_arity(1)?;
    Ok(Value::Double(f(call.number(0)?)))
}

fn round(call: &FunctionCall<'_>) -> StyleResult<Value> {
    unary_math(call, f64::round)
}

fn ceil(call: &FunctionCall<'_>) -> StyleResult<Value> {
    unary_math(call, f64::ceil)
}

fn floor(call: &FunctionCall<'_>) -> StyleResult<Value> {
    unary_math(call, f64::floor)
}

fn abs(call: &FunctionCall<'_>) -> StyleResult<Value> {
    unary_math(call, f64::abs)
}

fn sqrt(call: &FunctionCall<'_>) -> StyleResult<Value> {
    unary_math(call, f64::sqrt)
}

fn percentage(call: &FunctionCall<'_>) -> StyleResult<Value> {
    unary_math(call, |n| n * 100.0)
}

fn fold_numbers(call: &FunctionCall<'_>, init: f64, f: fn(f64, f64) -> f64) -> StyleResult<Value> {
    call.expect_arity_range(1, usize::MAX)?;
    let mut acc = init;
    for i in 0..call.args.len() {
        acc = f(acc, call.number(i)?);
    }
    Ok(Value::Double(acc))
}

fn min(call: &FunctionCall<'_>) -> StyleResult<Value> {
    fold_numbers(call, f64::INFINITY, f64::min)
}

fn max(call: &FunctionCall<'_>) -> StyleResult<Value> {
    fold_numbers(call, f64::NEG_INFINITY, f64::max)
}
