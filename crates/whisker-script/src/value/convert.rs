use std::cmp::Ordering;

use crate::error::WhiskerError;

use super::value::Value;

/// Spec §4.1 `to_number`.
pub fn to_number(v: &Value) -> Result<f64, WhiskerError> {
    match v {
        Value::Num(n) => Ok(*n),
        Value::Str(s) => parse_lua_number(s.trim())
            .ok_or_else(|| WhiskerError::TypeMismatch(format!("cannot convert {s:?} to a number"))),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Nil => Ok(0.0),
        Value::Table(_) | Value::Function(_) => Err(WhiskerError::TypeMismatch(format!(
            "cannot convert a {} to a number",
            v.type_name()
        ))),
    }
}

/// Parses decimal and `0x`-hex numeric literals, per spec §4.4 primaries.
pub fn parse_lua_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(hex) = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix("-0x").map(|_| &s[3..]))
        .or_else(|| s.strip_prefix("-0X").map(|_| &s[3..]))
    {
        let sign = if s.starts_with('-') { -1.0 } else { 1.0 };
        return i64::from_str_radix(hex, 16).ok().map(|n| sign * n as f64);
    }
    s.parse::<f64>().ok()
}

/// Spec §4.1 `to_string`.
pub fn to_string(v: &Value) -> String {
    match v {
        Value::Nil => "nil".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Num(n) => canonical_number(*n),
        Value::Str(s) => s.to_string(),
        Value::Table(_) => "table".to_string(),
        Value::Function(_) => "function".to_string(),
    }
}

/// Canonical base-10 formatting: integral floats print without a trailing
/// `.0`, matching Lua's `%.14g`-ish default `tostring` for numbers.
pub fn canonical_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        return buf.format(n as i64).to_string();
    }
    format!("{n}")
}

/// Spec §3: numeric equality is bit-identical f64 equality; the caller
/// handles type dispatch via `Value::eq`.
pub fn equals(a: &Value, b: &Value) -> bool {
    a == b
}

/// Spec §4.1 `compare`: both operands must be the same ordered kind.
pub fn compare(a: &Value, b: &Value) -> Result<Ordering, WhiskerError> {
    match (a, b) {
        (Value::Num(x), Value::Num(y)) => x
            .partial_cmp(y)
            .ok_or_else(|| WhiskerError::TypeMismatch("NaN is not ordered".to_string())),
        (Value::Str(x), Value::Str(y)) => Ok(x.as_str().cmp(y.as_str())),
        _ => Err(WhiskerError::TypeMismatch(format!(
            "attempt to compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}
