//! `table.*` (spec §4.6).

use crate::context::ExecutionContext;
use crate::error::{WhiskerError, WhiskerResult};
use crate::value::{self, Value};

fn require_table(args: &[Value], fname: &str) -> WhiskerResult<std::rc::Rc<std::cell::RefCell<crate::value::Table>>> {
    match args.first() {
        Some(Value::Table(t)) => Ok(std::rc::Rc::clone(t)),
        _ => Err(WhiskerError::ArgumentType(format!(
            "bad argument #1 to '{fname}' (table expected)"
        ))),
    }
}

pub fn insert(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = require_table(args, "insert")?;
    match args.len() {
        2 => {
            t.borrow_mut().push_array(args[1].clone());
        }
        3 => {
            let len = t.borrow().length();
            let pos = value::to_number(&args[1])? as i64;
            let mut i = len + 1;
            while i > pos {
                let prev = t.borrow().get(&(i - 1).to_string());
                t.borrow_mut().set(i.to_string(), prev);
                i -= 1;
            }
            t.borrow_mut().set(pos.to_string(), args[2].clone());
        }
        _ => {
            return Err(WhiskerError::ArgumentType(
                "wrong number of arguments to 'insert'".to_string(),
            ))
        }
    }
    Ok(Value::Nil)
}

pub fn remove(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = require_table(args, "remove")?;
    let len = t.borrow().length();
    if len == 0 {
        return Ok(Value::Nil);
    }
    let pos = match args.get(1) {
        Some(v) => value::to_number(v)? as i64,
        None => len,
    };
    let removed = t.borrow().get(&pos.to_string());
    let mut i = pos;
    while i < len {
        let next = t.borrow().get(&(i + 1).to_string());
        t.borrow_mut().set(i.to_string(), next);
        i += 1;
    }
    t.borrow_mut().set(len.to_string(), Value::Nil);
    Ok(removed)
}

pub fn concat(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = require_table(args, "concat")?;
    let sep = args.get(1).map(value::to_string).unwrap_or_default();
    let table = t.borrow();
    let len = table.length();
    let i = args
        .get(2)
        .map(value::to_number)
        .transpose()?
        .map(|n| n as i64)
        .unwrap_or(1);
    let j = args
        .get(3)
        .map(value::to_number)
        .transpose()?
        .map(|n| n as i64)
        .unwrap_or(len);
    let mut parts = Vec::new();
    let mut k = i;
    while k <= j {
        parts.push(value::to_string(&table.get(&k.to_string())));
        k += 1;
    }
    Ok(Value::str(parts.join(&sep)))
}

pub fn sort(ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = require_table(args, "sort")?;
    let comparator = args.get(1).cloned();
    let len = t.borrow().length();
    let mut items: Vec<Value> = (1..=len).map(|i| t.borrow().get(&i.to_string())).collect();

    let mut sort_err = None;
    items.sort_by(|a, b| {
        if sort_err.is_some() {
            return std::cmp::Ordering::Equal;
        }
        let less = match &comparator {
            Some(Value::Function(f)) => {
                match crate::interpreter::call_function(ctx, f.clone(), &[a.clone(), b.clone()]) {
                    Ok(v) => v.is_truthy(),
                    Err(e) => {
                        sort_err = Some(e);
                        false
                    }
                }
            }
            _ => match value::compare(a, b) {
                Ok(o) => o == std::cmp::Ordering::Less,
                Err(e) => {
                    sort_err = Some(e);
                    false
                }
            },
        };
        if less {
            std::cmp::Ordering::Less
        } else {
            std::cmp::Ordering::Greater
        }
    });
    if let Some(e) = sort_err {
        return Err(e);
    }

    let mut t_mut = t.borrow_mut();
    for (i, v) in items.into_iter().enumerate() {
        t_mut.set((i + 1).to_string(), v);
    }
    Ok(Value::Nil)
}

pub fn maxn(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let t = require_table(args, "maxn")?;
    Ok(Value::Num(t.borrow().length() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Table;

    fn array(values: &[f64]) -> Value {
        let t = Table::new();
        let v = Value::table(t);
        if let Value::Table(t) = &v {
            for n in values {
                t.borrow_mut().push_array(Value::Num(*n));
            }
        }
        v
    }

    fn nums(v: &Value) -> Vec<f64> {
        let t = v.as_table().unwrap().borrow();
        (1..=t.length()).map(|i| t.get(&i.to_string()).as_num().unwrap()).collect()
    }

    #[test]
    fn insert_without_position_appends() {
        let mut ctx = ExecutionContext::new();
        let t = array(&[1.0, 2.0]);
        insert(&mut ctx, &[t.clone(), Value::Num(3.0)]).unwrap();
        assert_eq!(nums(&t), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn insert_at_position_shifts_right() {
        let mut ctx = ExecutionContext::new();
        let t = array(&[1.0, 2.0, 3.0]);
        insert(&mut ctx, &[t.clone(), Value::Num(2.0), Value::Num(9.0)]).unwrap();
        assert_eq!(nums(&t), vec![1.0, 9.0, 2.0, 3.0]);
    }

    #[test]
    fn remove_defaults_to_last_element() {
        let mut ctx = ExecutionContext::new();
        let t = array(&[1.0, 2.0, 3.0]);
        let removed = remove(&mut ctx, std::slice::from_ref(&t)).unwrap();
        assert_eq!(removed.as_num(), Some(3.0));
        assert_eq!(nums(&t), vec![1.0, 2.0]);
    }

    #[test]
    fn concat_joins_with_separator() {
        let mut ctx = ExecutionContext::new();
        let t = array(&[1.0, 2.0, 3.0]);
        let out = concat(&mut ctx, &[t, Value::str(",")]).unwrap();
        assert_eq!(out.as_str(), Some("1,2,3"));
    }

    #[test]
    fn sort_without_comparator_uses_default_ordering() {
        let mut ctx = ExecutionContext::new();
        let t = array(&[3.0, 1.0, 2.0]);
        sort(&mut ctx, std::slice::from_ref(&t)).unwrap();
        assert_eq!(nums(&t), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn sort_with_user_comparator_records_its_error_on_the_context() {
        let mut ctx = ExecutionContext::new();
        let t = array(&[2.0, 1.0]);
        let bad_comparator = Value::Function(std::rc::Rc::new(crate::value::FunctionObject::User {
            name: None,
            params: vec!["a".into(), "b".into()],
            body: "return a < undefined_global_fn_call()".to_string(),
        }));
        // Statement-level errors are recorded on the context rather than
        // aborting the call (spec §7), so the comparator just sees a Nil
        // comparison result and sort still completes.
        let result = sort(&mut ctx, &[t, bad_comparator]);
        assert!(result.is_ok());
        assert!(!ctx.errors.is_empty());
    }
}
