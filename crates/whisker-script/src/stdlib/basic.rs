//! Basic global functions (spec §4.6): print, type, assert, error,
//! tonumber, tostring, select, pairs/ipairs/next, rawget/rawset/rawequal,
//! setmetatable/getmetatable.

use crate::context::ExecutionContext;
use crate::error::{WhiskerError, WhiskerResult};
use crate::value::{self, Table, Value};

pub fn print(ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    ctx.print(args);
    Ok(Value::Nil)
}

pub fn type_of(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let v = args.first().unwrap_or(&Value::Nil);
    Ok(Value::str(v.type_name()))
}

pub fn tostring(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let v = args.first().unwrap_or(&Value::Nil);
    Ok(Value::str(value::to_string(v)))
}

pub fn tonumber(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let v = args.first().unwrap_or(&Value::Nil);
    if let Some(base_v) = args.get(1) {
        let base = value::to_number(base_v)? as u32;
        let s = v
            .as_str()
            .ok_or_else(|| WhiskerError::ArgumentType("tonumber: expected a string with a base".to_string()))?;
        return Ok(i64::from_str_radix(s.trim(), base)
            .map(|n| Value::Num(n as f64))
            .unwrap_or(Value::Nil));
    }
    match v {
        Value::Num(n) => Ok(Value::Num(*n)),
        Value::Str(s) => Ok(value::parse_lua_number(s).map(Value::Num).unwrap_or(Value::Nil)),
        _ => Ok(Value::Nil),
    }
}

pub fn assert(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let v = args.first().cloned().unwrap_or(Value::Nil);
    if v.is_truthy() {
        Ok(v)
    } else {
        let msg = args
            .get(1)
            .map(value::to_string)
            .unwrap_or_else(|| "assertion failed!".to_string());
        Err(WhiskerError::NameError(msg))
    }
}

pub fn error(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let msg = args.first().map(value::to_string).unwrap_or_default();
    Err(WhiskerError::NameError(msg))
}

pub fn pairs(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    require_table(args, "pairs").map(Value::Table)
}

pub fn ipairs(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = require_table(args, "ipairs")?;
    let only_array = Table::new();
    let wrapped = Value::table(only_array);
    if let Value::Table(out) = &wrapped {
        for (i, v) in t.borrow().array_part() {
            out.borrow_mut().set(i.to_string(), v);
        }
    }
    Ok(wrapped)
}

pub fn next(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = require_table(args, "next")?;
    let table = t.borrow();
    let key = args.get(1).map(value::to_string);
    match table.next_key(key.as_deref()) {
        Some((k, v)) => {
            let key_value = value::parse_lua_number(k).map(Value::Num).unwrap_or(Value::str(k.clone()));
            let out = Table::new();
            let out = Value::table(out);
            if let Value::Table(o) = &out {
                o.borrow_mut().set("1", key_value);
                o.borrow_mut().set("2", v.clone());
            }
            Ok(out)
        }
        None => Ok(Value::Nil),
    }
}

fn require_table(args: &[Value], fname: &str) -> WhiskerResult<std::rc::Rc<std::cell::RefCell<Table>>> {
    match args.first() {
        Some(Value::Table(t)) => Ok(std::rc::Rc::clone(t)),
        _ => Err(WhiskerError::ArgumentType(format!(
            "bad argument #1 to '{fname}' (table expected)"
        ))),
    }
}

pub fn select(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let selector = args.first().ok_or_else(|| {
        WhiskerError::ArgumentType("bad argument #1 to 'select' (number or '#' expected)".to_string())
    })?;
    if let Value::Str(s) = selector
        && s.as_str() == "#"
    {
        return Ok(Value::Num((args.len() - 1) as f64));
    }
    let n = value::to_number(selector)? as usize;
    Ok(args.get(n).cloned().unwrap_or(Value::Nil))
}

pub fn rawget(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = require_table(args, "rawget")?;
    let key = value::to_string(args.get(1).unwrap_or(&Value::Nil));
    Ok(t.borrow().get(&key))
}

pub fn rawset(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = require_table(args, "rawset")?;
    let key = value::to_string(args.get(1).unwrap_or(&Value::Nil));
    let v = args.get(2).cloned().unwrap_or(Value::Nil);
    t.borrow_mut().set(key, v);
    Ok(Value::Table(t))
}

pub fn rawequal(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let a = args.first().unwrap_or(&Value::Nil);
    let b = args.get(1).unwrap_or(&Value::Nil);
    Ok(Value::Bool(value::equals(a, b)))
}

pub fn setmetatable(ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = args.first().cloned().unwrap_or(Value::Nil);
    let meta = args.get(1).cloned();
    let meta = match meta {
        Some(Value::Nil) | None => None,
        Some(m) => Some(m),
    };
    ctx.set_metatable(&t, meta);
    Ok(t)
}

pub fn getmetatable(ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = args.first().cloned().unwrap_or(Value::Nil);
    Ok(ctx.get_metatable(&t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tonumber_parses_decimal_and_rejects_garbage() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(tonumber(&mut ctx, &[Value::str("42")]).unwrap().as_num(), Some(42.0));
        assert!(matches!(tonumber(&mut ctx, &[Value::str("nope")]).unwrap(), Value::Nil));
    }

    #[test]
    fn tonumber_with_base_parses_hex() {
        let mut ctx = ExecutionContext::new();
        let out = tonumber(&mut ctx, &[Value::str("ff"), Value::Num(16.0)]).unwrap();
        assert_eq!(out.as_num(), Some(255.0));
    }

    #[test]
    fn assert_passes_through_truthy_value_and_errors_on_falsy() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(assert(&mut ctx, &[Value::Num(1.0)]).unwrap().as_num(), Some(1.0));
        assert!(assert(&mut ctx, &[Value::Bool(false), Value::str("custom")]).is_err());
    }

    #[test]
    fn select_hash_returns_count_and_index_returns_positional() {
        let mut ctx = ExecutionContext::new();
        let args = [Value::str("#"), Value::Num(1.0), Value::Num(2.0), Value::Num(3.0)];
        assert_eq!(select(&mut ctx, &args).unwrap().as_num(), Some(3.0));
        let args = [Value::Num(2.0), Value::Num(10.0), Value::Num(20.0), Value::Num(30.0)];
        assert_eq!(select(&mut ctx, &args).unwrap().as_num(), Some(20.0));
    }

    #[test]
    fn ipairs_wraps_only_the_consecutive_array_part() {
        let mut ctx = ExecutionContext::new();
        let t = Value::new_table();
        if let Value::Table(inner) = &t {
            inner.borrow_mut().push_array(Value::Num(1.0));
            inner.borrow_mut().push_array(Value::Num(2.0));
            inner.borrow_mut().set("name", Value::str("x"));
        }
        let wrapped = ipairs(&mut ctx, &[t]).unwrap();
        let wt = wrapped.as_table().unwrap();
        assert_eq!(wt.borrow().length(), 2);
        assert!(!wt.borrow().contains("name"));
    }

    #[test]
    fn rawequal_compares_tables_by_identity() {
        let mut ctx = ExecutionContext::new();
        let a = Value::new_table();
        let b = Value::new_table();
        assert!(!rawequal(&mut ctx, &[a.clone(), b]).unwrap().is_truthy());
        assert!(rawequal(&mut ctx, &[a.clone(), a]).unwrap().is_truthy());
    }
}
