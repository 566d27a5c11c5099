//! `string.*` (spec §4.6), including pattern-backed `find`/`match`/`gsub`.

use crate::context::ExecutionContext;
use crate::error::{WhiskerError, WhiskerResult};
use crate::pattern;
use crate::value::{self, Table, Value};

fn arg_str(args: &[Value], i: usize, fname: &str) -> WhiskerResult<String> {
    args.get(i)
        .map(value::to_string)
        .ok_or_else(|| WhiskerError::ArgumentType(format!("bad argument #{} to '{fname}'", i + 1)))
}

fn arg_num(args: &[Value], i: usize, fname: &str, default: f64) -> WhiskerResult<f64> {
    match args.get(i) {
        Some(v) => value::to_number(v),
        None => Ok(default),
    }
    .map_err(|_| WhiskerError::ArgumentType(format!("bad argument #{} to '{fname}'", i + 1)))
}

/// Lua's 1-based, negative-from-end string index, clamped into `[0, len]`.
fn resolve_index(idx: f64, len: usize) -> usize {
    let i = idx as i64;
    if i > 0 {
        ((i - 1) as usize).min(len)
    } else if i == 0 {
        0
    } else {
        len.saturating_sub((-i) as usize)
    }
}

pub fn upper(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::str(arg_str(args, 0, "upper")?.to_uppercase()))
}

pub fn lower(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::str(arg_str(args, 0, "lower")?.to_lowercase()))
}

pub fn len(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::Num(arg_str(args, 0, "len")?.chars().count() as f64))
}

pub fn rep(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let s = arg_str(args, 0, "rep")?;
    let n = arg_num(args, 1, "rep", 0.0)? as usize;
    Ok(Value::str(s.repeat(n)))
}

pub fn reverse(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::str(arg_str(args, 0, "reverse")?.chars().rev().collect::<String>()))
}

pub fn char_fn(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let mut s = String::new();
    for v in args {
        let n = value::to_number(v)? as u32;
        let c = char::from_u32(n)
            .ok_or_else(|| WhiskerError::ArgumentType(format!("invalid char code {n}")))?;
        s.push(c);
    }
    Ok(Value::str(s))
}

pub fn byte(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let s = arg_str(args, 0, "byte")?;
    let bytes: Vec<char> = s.chars().collect();
    let i = arg_num(args, 1, "byte", 1.0)?;
    let idx = resolve_index(i, bytes.len());
    Ok(bytes
        .get(idx)
        .map(|c| Value::Num(*c as u32 as f64))
        .unwrap_or(Value::Nil))
}

pub fn sub(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let s = arg_str(args, 0, "sub")?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let i = arg_num(args, 1, "sub", 1.0)?;
    let j = arg_num(args, 2, "sub", -1.0)?;
    let start = resolve_index(i, len);
    let end = if j as i64 >= 0 {
        (j as i64 as usize).min(len)
    } else {
        len.saturating_sub((-(j as i64)) as usize - 1)
    };
    if start >= end || start >= len {
        return Ok(Value::str(""));
    }
    Ok(Value::str(chars[start..end].iter().collect::<String>()))
}

pub fn find(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let s = arg_str(args, 0, "find")?;
    let pat = arg_str(args, 1, "find")?;
    let init = arg_num(args, 2, "find", 1.0)?.max(1.0) as usize - 1;
    match pattern::find(&s, &pat, init.min(s.len())) {
        Some(m) => {
            let out = Table::new();
            let out = Value::table(out);
            if let Value::Table(t) = &out {
                let mut t = t.borrow_mut();
                t.set("1", Value::Num((m.start + 1) as f64));
                t.set("2", Value::Num(m.end as f64));
                for (i, c) in m.captures.iter().enumerate() {
                    t.set((i + 3).to_string(), Value::str(c.clone()));
                }
            }
            Ok(out)
        }
        None => Ok(Value::Nil),
    }
}

pub fn matches(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let s = arg_str(args, 0, "match")?;
    let pat = arg_str(args, 1, "match")?;
    let init = arg_num(args, 2, "match", 1.0)?.max(1.0) as usize - 1;
    match pattern::find(&s, &pat, init.min(s.len())) {
        Some(m) if !m.captures.is_empty() => {
            if m.captures.len() == 1 {
                Ok(Value::str(m.captures[0].clone()))
            } else {
                let out = Table::new();
                let out = Value::table(out);
                if let Value::Table(t) = &out {
                    for (i, c) in m.captures.iter().enumerate() {
                        t.borrow_mut().set((i + 1).to_string(), Value::str(c.clone()));
                    }
                }
                Ok(out)
            }
        }
        Some(m) => Ok(Value::str(s[m.start..m.end].to_string())),
        None => Ok(Value::Nil),
    }
}

pub fn gsub(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let s = arg_str(args, 0, "gsub")?;
    let pat = arg_str(args, 1, "gsub")?;
    let repl = arg_str(args, 2, "gsub")?;
    let max = match args.get(3) {
        Some(v) => value::to_number(v)? as usize,
        None => usize::MAX,
    };
    let (result, count) = pattern::gsub(&s, &pat, &repl, max);
    let out = Table::new();
    let out = Value::table(out);
    if let Value::Table(t) = &out {
        t.borrow_mut().set("1", Value::str(result));
        t.borrow_mut().set("2", Value::Num(count as f64));
    }
    Ok(out)
}

/// A practical subset of `string.format`: `%s %d %i %f %g %x %X %% %q`.
pub fn format(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let fmt = arg_str(args, 0, "format")?;
    let mut out = String::new();
    let mut arg_idx = 1;
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut spec = String::from("%");
        while let Some(&p) = chars.peek() {
            spec.push(p);
            chars.next();
            if p.is_alphabetic() || p == '%' {
                break;
            }
        }
        match spec.chars().last() {
            Some('%') => out.push('%'),
            Some('s') => {
                let v = args.get(arg_idx).cloned().unwrap_or(Value::Nil);
                out.push_str(&value::to_string(&v));
                arg_idx += 1;
            }
            Some('q') => {
                let v = args.get(arg_idx).cloned().unwrap_or(Value::Nil);
                out.push('"');
                out.push_str(&value::to_string(&v).replace('"', "\\\""));
                out.push('"');
                arg_idx += 1;
            }
            Some('d') | Some('i') => {
                let n = value::to_number(args.get(arg_idx).unwrap_or(&Value::Nil))?;
                out.push_str(&format!("{}", n as i64));
                arg_idx += 1;
            }
            Some('x') => {
                let n = value::to_number(args.get(arg_idx).unwrap_or(&Value::Nil))?;
                out.push_str(&format!("{:x}", n as i64));
                arg_idx += 1;
            }
            Some('X') => {
                let n = value::to_number(args.get(arg_idx).unwrap_or(&Value::Nil))?;
                out.push_str(&format!("{:X}", n as i64));
                arg_idx += 1;
            }
            Some('f') | Some('g') => {
                let n = value::to_number(args.get(arg_idx).unwrap_or(&Value::Nil))?;
                out.push_str(&format!("{n}"));
                arg_idx += 1;
            }
            _ => out.push_str(&spec),
        }
    }
    Ok(Value::str(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::str(text)
    }

    #[test]
    fn sub_handles_negative_indices() {
        let mut ctx = ExecutionContext::new();
        let out = sub(&mut ctx, &[s("hello world"), Value::Num(-5.0)]).unwrap();
        assert_eq!(out.as_str(), Some("world"));
    }

    #[test]
    fn byte_and_char_round_trip() {
        let mut ctx = ExecutionContext::new();
        let code = byte(&mut ctx, &[s("A")]).unwrap();
        assert_eq!(code.as_num(), Some(65.0));
        let back = char_fn(&mut ctx, &[Value::Num(65.0), Value::Num(66.0)]).unwrap();
        assert_eq!(back.as_str(), Some("AB"));
    }

    #[test]
    fn find_returns_one_based_start_and_end() {
        let mut ctx = ExecutionContext::new();
        let out = find(&mut ctx, &[s("hello world"), s("world")]).unwrap();
        let t = out.as_table().unwrap();
        assert_eq!(t.borrow().get("1").as_num(), Some(7.0));
        assert_eq!(t.borrow().get("2").as_num(), Some(11.0));
    }

    #[test]
    fn gsub_reports_replacement_count() {
        let mut ctx = ExecutionContext::new();
        let out = gsub(&mut ctx, &[s("a,b,c"), s(","), s(";")]).unwrap();
        let t = out.as_table().unwrap();
        assert_eq!(t.borrow().get("1").as_str(), Some("a;b;c"));
        assert_eq!(t.borrow().get("2").as_num(), Some(2.0));
    }

    #[test]
    fn format_supports_s_and_d() {
        let mut ctx = ExecutionContext::new();
        let out = format(&mut ctx, &[s("%s scored %d"), s("alice"), Value::Num(42.0)]).unwrap();
        assert_eq!(out.as_str(), Some("alice scored 42"));
    }

    #[test]
    fn rep_repeats_n_times() {
        let mut ctx = ExecutionContext::new();
        let out = rep(&mut ctx, &[s("ab"), Value::Num(3.0)]).unwrap();
        assert_eq!(out.as_str(), Some("ababab"));
    }
}
