//! Tree-walking evaluator for parsed formulas.
//!
//! Names resolve against a fixed set of utilities only; after parent
//! substitution a formula has no other free names, so anything else is an
//! unbound-name error.

use chrono::{Datelike, NaiveDate};

use crate::clock::Clock;
use crate::error::{FormulaError, Result};
use crate::parser::{self, BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::value::{MathFn, Native, Value, iso_string, string_to_number, to_datetime};

/// Deepest expression tree the evaluator walks. Operator chains
/// (`1 + 1 + ...`) are folded in a loop and do not count against it; long
/// member and call chains (`s.trim().trim()...`) do.
pub const MAX_EVAL_DEPTH: usize = 256;

const MS_PER_DAY: f64 = 86_400_000.0;
const MAX_TIME: f64 = 8.64e15;

/// Parses and evaluates formula text with only the utility bindings in scope.
pub fn evaluate(source: &str, clock: &dyn Clock) -> Result<Value> {
    let expr = parser::parse(source)?;
    Interpreter::new(clock).eval(&expr)
}

/// One operator of a left-leaning chain with its right operand.
enum ChainStep<'a> {
    Binary(BinaryOp, &'a Expr),
    Logical(LogicalOp, &'a Expr),
}

/// Evaluates expressions against the utility bindings.
pub struct Interpreter {
    current_year: f64,
    today: f64,
    depth: usize,
}

impl Interpreter {
    pub fn new(clock: &dyn Clock) -> Self {
        Self {
            current_year: f64::from(clock.current_year()),
            today: clock.today_millis(),
            depth: 0,
        }
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value> {
        self.depth += 1;
        if self.depth > MAX_EVAL_DEPTH {
            self.depth -= 1;
            return Err(FormulaError::TooComplex(MAX_EVAL_DEPTH));
        }
        let result = self.eval_inner(expr);
        self.depth -= 1;
        result
    }

    fn eval_inner(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Ident(name) => self.lookup(name),
            Expr::Array(items) => Ok(Value::Array(self.eval_all(items)?)),
            Expr::Unary(op, operand) => {
                let v = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-v.to_number()),
                    UnaryOp::Plus => Value::Number(v.to_number()),
                    UnaryOp::Not => Value::Bool(!v.is_truthy()),
                })
            }
            Expr::Binary(..) | Expr::Logical(..) => self.eval_chain(expr),
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Member(object, name) => {
                let object = self.eval(object)?;
                member(&object, name)
            }
            Expr::Index(object, index) => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                index_into(&object, &index)
            }
            Expr::Call(callee, args) => self.call(callee, args),
            Expr::New(callee, args) => match self.eval(callee)? {
                Value::Native(Native::Date) => {
                    let args = self.eval_all(args)?;
                    construct_date(&args)
                }
                _ => Err(FormulaError::Type(format!(
                    "{} is not a constructor",
                    describe(callee)
                ))),
            },
        }
    }

    /// Evaluates a left-leaning run of operators bottom-up, so `a + b + c`
    /// costs one level of depth however long it is.
    fn eval_chain(&mut self, expr: &Expr) -> Result<Value> {
        let mut steps = Vec::new();
        let mut leftmost = expr;
        loop {
            match leftmost {
                Expr::Binary(op, lhs, rhs) => {
                    steps.push(ChainStep::Binary(*op, rhs.as_ref()));
                    leftmost = lhs.as_ref();
                }
                Expr::Logical(op, lhs, rhs) => {
                    steps.push(ChainStep::Logical(*op, rhs.as_ref()));
                    leftmost = lhs.as_ref();
                }
                _ => break,
            }
        }

        let mut acc = self.eval(leftmost)?;
        for step in steps.into_iter().rev() {
            acc = match step {
                ChainStep::Binary(op, rhs) => {
                    let r = self.eval(rhs)?;
                    binary(op, acc, r)
                }
                ChainStep::Logical(op, rhs) => {
                    let short_circuit = match op {
                        LogicalOp::And => !acc.is_truthy(),
                        LogicalOp::Or => acc.is_truthy(),
                    };
                    if short_circuit { acc } else { self.eval(rhs)? }
                }
            };
        }
        Ok(acc)
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn lookup(&self, name: &str) -> Result<Value> {
        let value = match name {
            "currentYear" => Value::Number(self.current_year),
            "today" => Value::Date(self.today),
            "NaN" => Value::Number(f64::NAN),
            "Infinity" => Value::Number(f64::INFINITY),
            "Math" => Value::Native(Native::Math),
            "Date" => Value::Native(Native::Date),
            "String" => Value::Native(Native::String),
            "Number" => Value::Native(Native::Number),
            "parseInt" => Value::Native(Native::ParseInt),
            "parseFloat" => Value::Native(Native::ParseFloat),
            "isNaN" => Value::Native(Native::IsNaN),
            _ => return Err(FormulaError::UnboundName(name.to_owned())),
        };
        Ok(value)
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value> {
        if let Expr::Member(object, name) = callee {
            let receiver = self.eval(object)?;
            if !matches!(receiver, Value::Native(_)) {
                let args = self.eval_all(args)?;
                return call_method(&receiver, name, &args);
            }
            let function = member(&receiver, name)?;
            let args = self.eval_all(args)?;
            return call_value(&function, &args, callee);
        }
        let function = self.eval(callee)?;
        let args = self.eval_all(args)?;
        call_value(&function, &args, callee)
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Member(object, name) => format!("{}.{}", describe(object), name),
        _ => "expression".to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Converts objects to primitives. Dates and arrays become strings (the
/// default hint), except that dates become numbers when `numeric` is set.
fn to_primitive(v: Value, numeric: bool) -> Value {
    match v {
        Value::Date(ms) if numeric => Value::Number(ms),
        Value::Date(_) | Value::Array(_) | Value::Native(_) => Value::Str(v.to_display()),
        other => other,
    }
}

fn binary(op: BinaryOp, l: Value, r: Value) -> Value {
    match op {
        BinaryOp::Add => {
            let l = to_primitive(l, false);
            let r = to_primitive(r, false);
            if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
                Value::Str(l.to_display() + &r.to_display())
            } else {
                Value::Number(l.to_number() + r.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
        BinaryOp::Rem => Value::Number(l.to_number() % r.to_number()),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            Value::Bool(compare(op, to_primitive(l, true), to_primitive(r, true)))
        }
        BinaryOp::Eq => Value::Bool(loose_eq(&l, &r)),
        BinaryOp::NotEq => Value::Bool(!loose_eq(&l, &r)),
        BinaryOp::StrictEq => Value::Bool(strict_eq(&l, &r)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_eq(&l, &r)),
    }
}

fn compare(op: BinaryOp, l: Value, r: Value) -> bool {
    if let (Value::Str(a), Value::Str(b)) = (&l, &r) {
        return match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        };
    }
    let (a, b) = (l.to_number(), r.to_number());
    // Every comparison with NaN is false.
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    }
}

fn strict_eq(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) | (Value::Date(a), Value::Date(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_eq(x, y))
        }
        _ => l == r,
    }
}

fn loose_eq(l: &Value, r: &Value) -> bool {
    use Value::*;
    match (l, r) {
        (Undefined | Null, Undefined | Null) => true,
        (Undefined | Null, _) | (_, Undefined | Null) => false,
        (Number(_), Str(_)) | (Str(_), Number(_)) => l.to_number() == r.to_number(),
        (Bool(_), Bool(_)) => l == r,
        (Bool(_), _) => loose_eq(&Number(l.to_number()), r),
        (_, Bool(_)) => loose_eq(l, &Number(r.to_number())),
        (Date(_) | Array(_), Number(_) | Str(_)) => loose_eq(&to_primitive(l.clone(), false), r),
        (Number(_) | Str(_), Date(_) | Array(_)) => loose_eq(l, &to_primitive(r.clone(), false)),
        _ => strict_eq(l, r),
    }
}

// ---------------------------------------------------------------------------
// Property access
// ---------------------------------------------------------------------------

fn member(object: &Value, name: &str) -> Result<Value> {
    let value = match object {
        Value::Undefined | Value::Null => {
            return Err(FormulaError::Type(format!(
                "cannot read property {:?} of {}",
                name,
                object.type_name()
            )));
        }
        Value::Native(Native::Math) => match name {
            "PI" => Value::Number(std::f64::consts::PI),
            "E" => Value::Number(std::f64::consts::E),
            _ => MathFn::lookup(name).map_or(Value::Undefined, |f| Value::Native(Native::MathFn(f))),
        },
        Value::Str(s) if name == "length" => Value::Number(s.encode_utf16().count() as f64),
        Value::Array(items) if name == "length" => Value::Number(items.len() as f64),
        _ => Value::Undefined,
    };
    Ok(value)
}

fn index_into(object: &Value, index: &Value) -> Result<Value> {
    let position = |len: usize| {
        let i = index.to_number();
        (i >= 0.0 && i == i.trunc() && (i as usize) < len).then_some(i as usize)
    };
    let value = match object {
        Value::Undefined | Value::Null => {
            return Err(FormulaError::Type(format!(
                "cannot index into {}",
                object.type_name()
            )));
        }
        Value::Array(items) => position(items.len()).map_or(Value::Undefined, |i| items[i].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            position(chars.len()).map_or(Value::Undefined, |i| Value::Str(chars[i].to_string()))
        }
        other => match index {
            Value::Str(name) => member(other, name)?,
            _ => Value::Undefined,
        },
    };
    Ok(value)
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&Value::Undefined)
}

fn call_value(function: &Value, args: &[Value], callee: &Expr) -> Result<Value> {
    let Value::Native(native) = function else {
        return Err(FormulaError::NotCallable(describe(callee)));
    };
    match native {
        Native::Math => Err(FormulaError::NotCallable(describe(callee))),
        Native::Date => construct_date(args),
        Native::MathFn(f) => Ok(Value::Number(call_math(*f, args))),
        Native::String => Ok(Value::Str(
            args.first().map(Value::to_display).unwrap_or_default(),
        )),
        Native::Number => Ok(Value::Number(args.first().map_or(0.0, Value::to_number))),
        Native::ParseInt => Ok(Value::Number(parse_int(
            &arg(args, 0).to_display(),
            arg(args, 1).to_number(),
        ))),
        Native::ParseFloat => Ok(Value::Number(parse_float(&arg(args, 0).to_display()))),
        Native::IsNaN => Ok(Value::Bool(arg(args, 0).to_number().is_nan())),
    }
}

fn call_math(f: MathFn, args: &[Value]) -> f64 {
    let x = arg(args, 0).to_number();
    match f {
        MathFn::Abs => x.abs(),
        MathFn::Ceil => x.ceil(),
        MathFn::Floor => x.floor(),
        MathFn::Trunc => x.trunc(),
        MathFn::Sqrt => x.sqrt(),
        MathFn::Round => {
            // Halves round towards +Infinity.
            let floor = x.floor();
            if x - floor >= 0.5 { floor + 1.0 } else { floor }
        }
        MathFn::Sign => {
            if x.is_nan() || x == 0.0 {
                x
            } else {
                x.signum()
            }
        }
        MathFn::Pow => {
            let y = arg(args, 1).to_number();
            if y.is_nan() || (x.abs() == 1.0 && y.is_infinite()) {
                f64::NAN
            } else {
                x.powf(y)
            }
        }
        MathFn::Min => fold_numbers(args, f64::INFINITY, f64::min),
        MathFn::Max => fold_numbers(args, f64::NEG_INFINITY, f64::max),
    }
}

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for v in args {
        let n = v.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Result<Value> {
    let not_a_function = || FormulaError::NotCallable(format!("{}.{}", receiver.type_name(), name));
    let text_arg = |i: usize| arg(args, i).to_display();

    match receiver {
        Value::Undefined | Value::Null => Err(FormulaError::Type(format!(
            "cannot call {} on {}",
            name,
            receiver.type_name()
        ))),
        Value::Str(s) => match name {
            "toUpperCase" => Ok(Value::Str(s.to_uppercase())),
            "toLowerCase" => Ok(Value::Str(s.to_lowercase())),
            "trim" => Ok(Value::Str(s.trim().to_owned())),
            "includes" => Ok(Value::Bool(s.contains(text_arg(0).as_str()))),
            "startsWith" => Ok(Value::Bool(s.starts_with(text_arg(0).as_str()))),
            "endsWith" => Ok(Value::Bool(s.ends_with(text_arg(0).as_str()))),
            "toString" => Ok(receiver.clone()),
            _ => Err(not_a_function()),
        },
        Value::Number(n) => match name {
            "toFixed" => to_fixed(*n, arg(args, 0)).map(Value::Str),
            "toString" => Ok(Value::Str(receiver.to_display())),
            _ => Err(not_a_function()),
        },
        Value::Bool(_) if name == "toString" => Ok(Value::Str(receiver.to_display())),
        Value::Array(items) => match name {
            "join" => {
                let sep = match arg(args, 0) {
                    Value::Undefined => ",".to_owned(),
                    other => other.to_display(),
                };
                let parts: Vec<String> = items
                    .iter()
                    .map(|v| match v {
                        Value::Undefined | Value::Null => String::new(),
                        other => other.to_display(),
                    })
                    .collect();
                Ok(Value::Str(parts.join(&sep)))
            }
            "includes" => Ok(Value::Bool(items.iter().any(|v| same_value_zero(v, arg(args, 0))))),
            "toString" => Ok(Value::Str(receiver.to_display())),
            _ => Err(not_a_function()),
        },
        Value::Date(ms) => date_method(*ms, name).ok_or_else(not_a_function)?,
        _ => Err(not_a_function()),
    }
}

fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_eq(a, b),
    }
}

fn to_fixed(n: f64, digits: &Value) -> Result<String> {
    let digits = match digits {
        Value::Undefined => 0.0,
        other => other.to_number().trunc(),
    };
    if !(0.0..=100.0).contains(&digits) {
        return Err(FormulaError::Type(format!(
            "toFixed() digits argument must be between 0 and 100, got {}",
            digits
        )));
    }
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(Value::Number(n).to_display());
    }
    let digits = digits as usize;
    // Exact ties round away from zero.
    let scaled = n.abs() * 10f64.powi(digits as i32);
    let nudged = if scaled.fract() == 0.5 {
        n + n.signum() * 0.5 / 10f64.powi(digits as i32)
    } else {
        n
    };
    Ok(format!("{:.*}", digits, nudged))
}

/// Returns `None` when dates have no method called `name`.
fn date_method(ms: f64, name: &str) -> Option<Result<Value>> {
    let dt = to_datetime(ms);
    let field = |f: fn(&chrono::DateTime<chrono::Utc>) -> f64| -> Result<Value> {
        Ok(Value::Number(dt.as_ref().map_or(f64::NAN, f)))
    };
    let result = match name {
        "getFullYear" => field(|d| f64::from(d.year())),
        "getMonth" => field(|d| f64::from(d.month0())),
        "getDate" => field(|d| f64::from(d.day())),
        "getDay" => field(|d| f64::from(d.weekday().num_days_from_sunday())),
        "getTime" | "valueOf" => Ok(Value::Number(ms)),
        "toISOString" => iso_string(ms).map(Value::Str).ok_or(FormulaError::InvalidDate),
        "toString" => Ok(Value::Str(Value::Date(ms).to_display())),
        _ => return None,
    };
    Some(result)
}

// ---------------------------------------------------------------------------
// Dates and number parsing
// ---------------------------------------------------------------------------

fn time_clip(ms: f64) -> f64 {
    if !ms.is_finite() || ms.abs() > MAX_TIME {
        f64::NAN
    } else {
        ms.trunc() + 0.0
    }
}

/// `new Date(..)` / `Date(..)`. All times are UTC.
fn construct_date(args: &[Value]) -> Result<Value> {
    let ms = match args {
        [] => {
            return Err(FormulaError::Type(
                "Date needs an argument; the current time is not available, use today".to_owned(),
            ));
        }
        [Value::Date(ms)] => *ms,
        [Value::Str(s)] => parse_date_string(s),
        [single] => time_clip(single.to_number()),
        parts => date_from_parts(parts),
    };
    Ok(Value::Date(ms))
}

fn midnight_millis(date: NaiveDate) -> f64 {
    date.and_hms_opt(0, 0, 0)
        .map_or(f64::NAN, |dt| dt.and_utc().timestamp_millis() as f64)
}

fn parse_date_string(s: &str) -> f64 {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return time_clip(dt.timestamp_millis() as f64);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return time_clip(dt.and_utc().timestamp_millis() as f64);
        }
    }
    let padded = match s.len() {
        4 => format!("{s}-01-01"),
        7 => format!("{s}-01"),
        _ => s.to_owned(),
    };
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d").map_or(f64::NAN, |d| time_clip(midnight_millis(d)))
}

/// `Date(year, month, day?, hours?, minutes?, seconds?, ms?)` with a
/// zero-based month; out-of-range parts carry over as in JavaScript.
fn date_from_parts(parts: &[Value]) -> f64 {
    let nums: Vec<f64> = parts.iter().take(7).map(Value::to_number).collect();
    if nums.iter().any(|n| !n.is_finite()) {
        return f64::NAN;
    }
    let get = |i: usize, default: f64| nums.get(i).map_or(default, |n| n.trunc());

    let mut year = get(0, f64::NAN);
    if (0.0..=99.0).contains(&year) {
        year += 1900.0;
    }
    let total_months = year * 12.0 + get(1, 0.0);
    let y = (total_months / 12.0).floor();
    let m = total_months - y * 12.0;
    if y.abs() > 275_000.0 {
        return f64::NAN;
    }
    let Some(first) = NaiveDate::from_ymd_opt(y as i32, m as u32 + 1, 1) else {
        return f64::NAN;
    };
    let ms = midnight_millis(first)
        + (get(2, 1.0) - 1.0) * MS_PER_DAY
        + get(3, 0.0) * 3_600_000.0
        + get(4, 0.0) * 60_000.0
        + get(5, 0.0) * 1_000.0
        + get(6, 0.0);
    time_clip(ms)
}

/// `parseInt(text, radix)`.
fn parse_int(text: &str, radix: f64) -> f64 {
    let s = text.trim_start();
    let (sign, mut s) = match s.as_bytes().first() {
        Some(b'-') => (-1.0, &s[1..]),
        Some(b'+') => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    let mut radix = if radix.is_nan() { 0 } else { radix.trunc() as i64 };
    let has_hex_prefix = s.starts_with("0x") || s.starts_with("0X");
    if radix == 0 {
        radix = if has_hex_prefix { 16 } else { 10 };
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    if radix == 16 && has_hex_prefix {
        s = &s[2..];
    }

    let mut acc = 0.0;
    let mut any = false;
    for c in s.chars() {
        let Some(d) = c.to_digit(radix as u32) else { break };
        acc = acc * radix as f64 + f64::from(d);
        any = true;
    }
    if any { sign * acc } else { f64::NAN }
}

/// `parseFloat(text)`: the longest numeric prefix.
fn parse_float(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i = 1;
    }
    if s[i..].starts_with("Infinity") {
        return string_to_number(&s[..i + "Infinity".len()]);
    }
    let digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i - start
    };
    let mut count = digits(&mut i);
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        count += digits(&mut i);
    }
    if count == 0 {
        return f64::NAN;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        if digits(&mut j) > 0 {
            i = j;
        }
    }
    s[..i].parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::ymd(2024, 6, 15).unwrap()
    }

    fn eval(src: &str) -> Value {
        evaluate(src, &clock()).unwrap_or_else(|e| panic!("{src}: {e}"))
    }

    fn num(src: &str) -> f64 {
        match eval(src) {
            Value::Number(n) => n,
            other => panic!("{src}: expected number, got {:?}", other),
        }
    }

    fn text(src: &str) -> String {
        match eval(src) {
            Value::Str(s) => s,
            other => panic!("{src}: expected string, got {:?}", other),
        }
    }

    #[test]
    fn arithmetic() {
        assert_eq!(num("1 + 2 * 3"), 7.0);
        assert_eq!(num("(1 + 2) * 3"), 9.0);
        assert_eq!(num("7 % 3"), 1.0);
        assert_eq!(num("-7 % 3"), -1.0);
        assert_eq!(num("10 / 4"), 2.5);
        assert_eq!(num("1 / 0"), f64::INFINITY);
        assert!(num("0 / 0").is_nan());
        assert_eq!(num("- -3"), 3.0);
    }

    #[test]
    fn js_coercions() {
        assert_eq!(num("\"5\" * 2"), 10.0);
        assert_eq!(text("\"5\" + 2"), "52");
        assert_eq!(text("1 + 2 + \"3\""), "33");
        assert!(num("undefined + 1").is_nan());
        assert_eq!(num("null + 1"), 1.0);
        assert_eq!(num("true + true"), 2.0);
        assert_eq!(num("+\"42\""), 42.0);
        assert_eq!(text("[1, 2] + \"\""), "1,2");
    }

    #[test]
    fn comparisons_and_equality() {
        assert_eq!(eval("2 < 10"), Value::Bool(true));
        assert_eq!(eval("\"2\" < \"10\""), Value::Bool(false));
        assert_eq!(eval("\"5\" == 5"), Value::Bool(true));
        assert_eq!(eval("\"5\" === 5"), Value::Bool(false));
        assert_eq!(eval("null == undefined"), Value::Bool(true));
        assert_eq!(eval("null === undefined"), Value::Bool(false));
        assert_eq!(eval("0 == false"), Value::Bool(true));
        assert_eq!(eval("NaN == NaN"), Value::Bool(false));
        assert_eq!(eval("undefined < 1"), Value::Bool(false));
    }

    #[test]
    fn logical_operators_return_operands() {
        assert_eq!(text("\"\" || \"fallback\""), "fallback");
        assert_eq!(num("0 && 5"), 0.0);
        assert_eq!(num("3 && 5"), 5.0);
        assert_eq!(eval("!0"), Value::Bool(true));
        assert_eq!(text("1 > 2 ? \"yes\" : \"no\""), "no");
    }

    #[test]
    fn short_circuit_skips_errors() {
        assert_eq!(num("1 || missing"), 1.0);
        assert_eq!(eval("false && missing"), Value::Bool(false));
        assert_eq!(num("true ? 1 : missing"), 1.0);
    }

    #[test]
    fn math_namespace() {
        assert_eq!(num("Math.round(2.5)"), 3.0);
        assert_eq!(num("Math.round(-2.5)"), -2.0);
        assert_eq!(num("Math.round(0.49999999999999994)"), 0.0);
        assert_eq!(num("Math.max(1, 5, 3)"), 5.0);
        assert_eq!(num("Math.min()"), f64::INFINITY);
        assert!(num("Math.max(1, \"x\")").is_nan());
        assert_eq!(num("Math.pow(2, 10)"), 1024.0);
        assert!(num("Math.pow(1, NaN)").is_nan());
        assert_eq!(num("Math.floor(Math.PI)"), 3.0);
        assert_eq!(num("Math.sign(-4)"), -1.0);
        assert_eq!(num("Math.abs(-2) + Math.sqrt(16) + Math.trunc(-1.7) + Math.ceil(1.1)"), 7.0);
    }

    #[test]
    fn math_random_is_not_available() {
        assert_eq!(
            evaluate("Math.random()", &clock()),
            Err(FormulaError::NotCallable("Math.random".into()))
        );
    }

    #[test]
    fn utility_bindings() {
        assert_eq!(num("currentYear"), 2024.0);
        assert_eq!(num("today.getFullYear()"), 2024.0);
        assert_eq!(num("today.getMonth()"), 5.0);
        assert_eq!(num("today.getDate()"), 15.0);
        assert_eq!(text("today.toISOString()"), "2024-06-15T00:00:00.000Z");
    }

    #[test]
    fn age_from_birth_date() {
        assert_eq!(num("currentYear - new Date(\"1990-05-20\").getFullYear()"), 34.0);
        assert_eq!(num("currentYear - Date(\"1990-05-20\").getFullYear()"), 34.0);
    }

    #[test]
    fn dates() {
        assert_eq!(num("new Date(0).getTime()"), 0.0);
        assert_eq!(num("new Date(\"2024-01-02\") - new Date(\"2024-01-01\")"), 86_400_000.0);
        assert_eq!(num("new Date(2024, 0, 31).getDay()"), 3.0);
        // Month overflow carries into the next year.
        assert_eq!(text("new Date(2023, 12, 1).toISOString()"), "2024-01-01T00:00:00.000Z");
        assert_eq!(num("new Date(\"2024-02-29T10:30:00Z\").getDate()"), 29.0);
        assert!(num("new Date(\"garbage\").getFullYear()").is_nan());
        assert_eq!(
            evaluate("new Date(\"garbage\").toISOString()", &clock()),
            Err(FormulaError::InvalidDate)
        );
        assert!(matches!(evaluate("new Date()", &clock()), Err(FormulaError::Type(_))));
        assert_eq!(
            evaluate("Date.now()", &clock()),
            Err(FormulaError::NotCallable("Date.now".into()))
        );
    }

    #[test]
    fn string_and_array_members() {
        assert_eq!(num("\"hello\".length"), 5.0);
        assert_eq!(text("\" Ada \".trim().toUpperCase()"), "ADA");
        assert_eq!(eval("\"hello\".startsWith(\"he\")"), Value::Bool(true));
        assert_eq!(eval("\"hello\".includes(\"z\")"), Value::Bool(false));
        assert_eq!(text("[\"a\", \"b\"].join(\" & \")"), "a & b");
        assert_eq!(num("[1, 2, 3].length"), 3.0);
        assert_eq!(eval("[1, 2][5]"), Value::Undefined);
        assert_eq!(text("\"abc\"[1]"), "b");
        assert_eq!(eval("[1, NaN].includes(NaN)"), Value::Bool(true));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(text("(1.005 * 1000).toFixed(0)"), "1005");
        assert_eq!(text("(2.5).toFixed(0)"), "3");
        assert_eq!(text("(10 / 3).toFixed(2)"), "3.33");
        assert_eq!(text("String(3)"), "3");
        assert_eq!(text("String(0.1 + 0.2)"), "0.30000000000000004");
        assert_eq!(text("\"x\" + 0.0000001"), "x1e-7");
        assert_eq!(text("String(1e21)"), "1e+21");
        assert!(matches!(evaluate("(1).toFixed(101)", &clock()), Err(FormulaError::Type(_))));
    }

    #[test]
    fn conversion_functions() {
        assert_eq!(num("Number(\"12\")"), 12.0);
        assert_eq!(num("Number()"), 0.0);
        assert_eq!(num("parseInt(\"42px\")"), 42.0);
        assert_eq!(num("parseInt(\"0x1F\")"), 31.0);
        assert_eq!(num("parseInt(\"101\", 2)"), 5.0);
        assert!(num("parseInt(\"px\")").is_nan());
        assert_eq!(num("parseFloat(\"3.5kg\")"), 3.5);
        assert_eq!(num("parseFloat(\"-1e3x\")"), -1000.0);
        assert_eq!(num("parseFloat(\"2e\")"), 2.0);
        assert_eq!(eval("isNaN(\"abc\")"), Value::Bool(true));
        assert_eq!(eval("isNaN(\"12\")"), Value::Bool(false));
    }

    #[test]
    fn unbound_names_fail() {
        assert_eq!(
            evaluate("window", &clock()),
            Err(FormulaError::UnboundName("window".into()))
        );
        assert_eq!(
            evaluate("process.exit(1)", &clock()),
            Err(FormulaError::UnboundName("process".into()))
        );
    }

    #[test]
    fn type_errors() {
        assert!(matches!(evaluate("undefined.x", &clock()), Err(FormulaError::Type(_))));
        assert!(matches!(evaluate("null.toFixed(2)", &clock()), Err(FormulaError::Type(_))));
        assert_eq!(
            evaluate("(5)()", &clock()),
            Err(FormulaError::NotCallable("expression".into()))
        );
        assert_eq!(
            evaluate("\"x\".nope()", &clock()),
            Err(FormulaError::NotCallable("string.nope".into()))
        );
        assert!(matches!(evaluate("new Math()", &clock()), Err(FormulaError::Type(_))));
    }

    #[test]
    fn long_operator_chains_evaluate() {
        let sum = vec!["1"; 300].join(" + ");
        assert!(sum.len() < 4096);
        assert_eq!(num(&sum), 300.0);

        let mixed = vec!["0"; 300].join(" || ") + " || 7";
        assert_eq!(num(&mixed), 7.0);
        let guarded = vec!["1"; 300].join(" && ") + " && undefined.x";
        assert!(matches!(evaluate(&guarded, &clock()), Err(FormulaError::Type(_))));
        let short = String::from("0 && ") + &vec!["undefined.x"; 200].join(" && ");
        assert_eq!(num(&short), 0.0);
    }

    #[test]
    fn long_method_chains_are_bounded() {
        let long = String::from("\"a\"") + &".trim()".repeat(300);
        assert_eq!(evaluate(&long, &clock()), Err(FormulaError::TooComplex(MAX_EVAL_DEPTH)));
        let ok = String::from("\"a\"") + &".trim()".repeat(50);
        assert_eq!(eval(&ok), Value::Str("a".into()));
    }

    #[test]
    fn deterministic_for_fixed_clock() {
        let src = "currentYear * 2 + today.getDate()";
        assert_eq!(eval(src), eval(src));
    }
}
