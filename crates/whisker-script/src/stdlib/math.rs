//! `math.*` (spec §4.6).

use crate::context::ExecutionContext;
use crate::error::{WhiskerError, WhiskerResult};
use crate::value::{self, Table, Value};

fn arg(args: &[Value], i: usize, fname: &str) -> WhiskerResult<f64> {
    args.get(i)
        .ok_or_else(|| WhiskerError::ArgumentType(format!("bad argument #{} to '{fname}'", i + 1)))
        .and_then(value::to_number)
}

pub fn floor(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::Num(arg(args, 0, "floor")?.floor()))
}

pub fn ceil(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::Num(arg(args, 0, "ceil")?.ceil()))
}

pub fn abs(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::Num(arg(args, 0, "abs")?.abs()))
}

pub fn sqrt(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::Num(arg(args, 0, "sqrt")?.sqrt()))
}

pub fn pow(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::Num(arg(args, 0, "pow")?.powf(arg(args, 1, "pow")?)))
}

pub fn exp(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::Num(arg(args, 0, "exp")?.exp()))
}

pub fn log(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let x = arg(args, 0, "log")?;
    Ok(Value::Num(match args.get(1) {
        Some(_) => x.log(arg(args, 1, "log")?),
        None => x.ln(),
    }))
}

pub fn sin(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::Num(arg(args, 0, "sin")?.sin()))
}

pub fn cos(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::Num(arg(args, 0, "cos")?.cos()))
}

pub fn tan(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    Ok(Value::Num(arg(args, 0, "tan")?.tan()))
}

pub fn fmod(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let a = arg(args, 0, "fmod")?;
    let b = arg(args, 1, "fmod")?;
    Ok(Value::Num(if b == 0.0 { f64::NAN } else { a % b }))
}

pub fn modf(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let x = arg(args, 0, "modf")?;
    let int_part = x.trunc();
    let out = Table::new();
    let out = Value::table(out);
    if let Value::Table(t) = &out {
        t.borrow_mut().set("1", Value::Num(int_part));
        t.borrow_mut().set("2", Value::Num(x - int_part));
    }
    Ok(out)
}

pub fn min(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let mut best = arg(args, 0, "min")?;
    for i in 1..args.len() {
        best = best.min(arg(args, i, "min")?);
    }
    Ok(Value::Num(best))
}

pub fn max(_ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let mut best = arg(args, 0, "max")?;
    for i in 1..args.len() {
        best = best.max(arg(args, i, "max")?);
    }
    Ok(Value::Num(best))
}

pub fn random(ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let r = ctx.next_random();
    match (args.first(), args.get(1)) {
        (None, _) => Ok(Value::Num(r)),
        (Some(m), None) => {
            let m = value::to_number(m)? as i64;
            Ok(Value::Num((1 + (r * m as f64) as i64).clamp(1, m) as f64))
        }
        (Some(lo), Some(hi)) => {
            let lo = value::to_number(lo)? as i64;
            let hi = value::to_number(hi)? as i64;
            Ok(Value::Num((lo + (r * (hi - lo + 1) as f64) as i64).clamp(lo, hi) as f64))
        }
    }
}

pub fn randomseed(ctx: &mut ExecutionContext, args: &[Value]) -> WhiskerResult<Value> {
    let seed = arg(args, 0, "randomseed")? as u64;
    ctx.seed_rng(seed);
    Ok(Value::Nil)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_and_ceil_round_toward_bounds() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(floor(&mut ctx, &[Value::Num(1.9)]).unwrap().as_num(), Some(1.0));
        assert_eq!(ceil(&mut ctx, &[Value::Num(1.1)]).unwrap().as_num(), Some(2.0));
    }

    #[test]
    fn modf_splits_integer_and_fractional_parts() {
        let mut ctx = ExecutionContext::new();
        let out = modf(&mut ctx, &[Value::Num(3.25)]).unwrap();
        let t = out.as_table().unwrap();
        assert_eq!(t.borrow().get("1").as_num(), Some(3.0));
        assert_eq!(t.borrow().get("2").as_num(), Some(0.25));
    }

    #[test]
    fn random_with_two_args_stays_in_range() {
        let mut ctx = ExecutionContext::new();
        for _ in 0..50 {
            let n = random(&mut ctx, &[Value::Num(5.0), Value::Num(10.0)]).unwrap().as_num().unwrap();
            assert!((5.0..=10.0).contains(&n));
        }
    }

    #[test]
    fn randomseed_makes_random_deterministic() {
        let mut a = ExecutionContext::new();
        let mut b = ExecutionContext::new();
        randomseed(&mut a, &[Value::Num(42.0)]).unwrap();
        randomseed(&mut b, &[Value::Num(42.0)]).unwrap();
        let seq_a: Vec<f64> = (0..5).map(|_| random(&mut a, &[]).unwrap().as_num().unwrap()).collect();
        let seq_b: Vec<f64> = (0..5).map(|_| random(&mut b, &[]).unwrap().as_num().unwrap()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn fmod_by_zero_is_nan() {
        let mut ctx = ExecutionContext::new();
        let result = fmod(&mut ctx, &[Value::Num(5.0), Value::Num(0.0)]).unwrap();
        assert!(result.as_num().unwrap().is_nan());
    }
}
