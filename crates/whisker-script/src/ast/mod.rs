//! AST expression evaluator (spec §4.7, §6): a fixed node vocabulary that an
//! external WLS parser is expected to produce; this crate only consumes it.

mod eval;

pub use eval::AstEvaluator;

use crate::error::{WhiskerError, WhiskerResult};
use crate::host::Host;
use crate::value::{self, Value};

fn num(args: &[Value], i: usize) -> WhiskerResult<f64> {
    args.get(i)
        .ok_or_else(|| WhiskerError::ArgumentType(format!("missing argument #{}", i + 1)))
        .and_then(value::to_number)
}

/// `math.*` (spec §4.7): a stricter mirror of §4.6 — `random` only exposes
/// the three fixed arities below, routed through the host's own RNG so a
/// session's randomness stays deterministic per seed regardless of which
/// evaluator touches it.
fn math_call<H: Host>(host: &mut H, path: &[String], args: &[Value]) -> WhiskerResult<Value> {
    let name = path
        .first()
        .ok_or_else(|| WhiskerError::NameError("math: missing function name".to_string()))?
        .as_str();
    Ok(Value::Num(match name {
        "floor" => num(args, 0)?.floor(),
        "ceil" => num(args, 0)?.ceil(),
        "abs" => num(args, 0)?.abs(),
        "sqrt" => num(args, 0)?.sqrt(),
        "pow" => num(args, 0)?.powf(num(args, 1)?),
        "exp" => num(args, 0)?.exp(),
        "log" => match args.get(1) {
            Some(_) => num(args, 0)?.log(num(args, 1)?),
            None => num(args, 0)?.ln(),
        },
        "sin" => num(args, 0)?.sin(),
        "cos" => num(args, 0)?.cos(),
        "tan" => num(args, 0)?.tan(),
        "min" => {
            let mut best = num(args, 0)?;
            for i in 1..args.len() {
                best = best.min(num(args, i)?);
            }
            best
        }
        "max" => {
            let mut best = num(args, 0)?;
            for i in 1..args.len() {
                best = best.max(num(args, i)?);
            }
            best
        }
        "random" => {
            return match args.len() {
                0 => Ok(Value::Num(host.random(0, 1_000_000) as f64 / 1_000_000.0)),
                1 => Ok(Value::Num(host.random(1, num(args, 0)? as i64) as f64)),
                _ => Ok(Value::Num(host.random(num(args, 0)? as i64, num(args, 1)? as i64) as f64)),
            };
        }
        other => return Err(WhiskerError::NameError(format!("math.{other}: unknown function"))),
    }))
}

/// `string.*` (spec §4.7): a documented-reduced-fidelity subset — `format`
/// only supports `%s`/`%d`, `find` is substring-only (no patterns).
fn string_call(path: &[String], args: &[Value]) -> WhiskerResult<Value> {
    let name = path
        .first()
        .ok_or_else(|| WhiskerError::NameError("string: missing function name".to_string()))?
        .as_str();
    let s = args
        .first()
        .map(value::to_string)
        .ok_or_else(|| WhiskerError::ArgumentType("missing string argument".to_string()))?;
    match name {
        "len" => Ok(Value::Num(s.chars().count() as f64)),
        "upper" => Ok(Value::str(s.to_uppercase())),
        "lower" => Ok(Value::str(s.to_lowercase())),
        "reverse" => Ok(Value::str(s.chars().rev().collect::<String>())),
        "rep" => Ok(Value::str(s.repeat(num(args, 1)? as usize))),
        "sub" => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len();
            let i = ((num(args, 1)? as i64 - 1).max(0) as usize).min(len);
            let j = match args.get(2) {
                Some(_) => (num(args, 2)? as i64).clamp(0, len as i64) as usize,
                None => len,
            };
            if i >= j {
                Ok(Value::str(""))
            } else {
                Ok(Value::str(chars[i..j].iter().collect::<String>()))
            }
        }
        "find" => {
            let needle = args
                .get(1)
                .map(value::to_string)
                .ok_or_else(|| WhiskerError::ArgumentType("missing pattern argument".to_string()))?;
            Ok(s.find(&needle)
                .map(|byte_idx| Value::Num((s[..byte_idx].chars().count() + 1) as f64))
                .unwrap_or(Value::Nil))
        }
        "format" => {
            let fmt = s;
            let mut out = String::new();
            let mut arg_idx = 1;
            let mut chars = fmt.chars().peekable();
            while let Some(c) = chars.next() {
                if c != '%' {
                    out.push(c);
                    continue;
                }
                match chars.next() {
                    Some('%') => out.push('%'),
                    Some('s') => {
                        out.push_str(&value::to_string(args.get(arg_idx).unwrap_or(&Value::Nil)));
                        arg_idx += 1;
                    }
                    Some('d') => {
                        out.push_str(&value::to_string(args.get(arg_idx).unwrap_or(&Value::Nil)));
                        arg_idx += 1;
                    }
                    Some(other) => out.push(other),
                    None => {}
                }
            }
            Ok(Value::str(out))
        }
        other => Err(WhiskerError::NameError(format!("string.{other}: unknown function"))),
    }
}

/// Literal tag, mirrors the AST node contract's `valueType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Number,
    String,
    Boolean,
    Nil,
}

#[derive(Debug, Clone)]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Len,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

/// The node vocabulary the evaluator accepts (spec §4.7): `Literal`,
/// `Variable`, `Identifier`, `Binary`, `Unary`, `Call`, `Member`,
/// `Assignment`.
#[derive(Debug, Clone)]
pub enum AstNode {
    Literal {
        value_type: ValueType,
        value: LiteralValue,
    },
    /// A story variable reference, backed by the host's variable map.
    /// `scope` is carried through for diagnostics; this evaluator resolves
    /// every `Variable` against the host regardless of its value.
    Variable {
        name: String,
        scope: Option<String>,
    },
    /// A bare name used as a call target or namespace root (`whisker`,
    /// `math`, `string`, `print`, ...).
    Identifier {
        name: String,
    },
    Binary {
        op: BinaryOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Unary {
        op: UnaryOp,
        arg: Box<AstNode>,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
    },
    Member {
        object: Box<AstNode>,
        property: String,
    },
    Assignment {
        op: AssignOp,
        target: Box<AstNode>,
        value: Box<AstNode>,
    },
}
