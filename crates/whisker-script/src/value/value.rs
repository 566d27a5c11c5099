use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;

use super::table::Table;

/// A user-defined function or a built-in tag (spec §3 Value, §9 "string-based
/// body capture"): the body stays as source text and is re-parsed on each
/// call, the simpler of the two compliant strategies the spec allows.
pub enum FunctionObject {
    User {
        name: Option<String>,
        params: Vec<SmolStr>,
        body: String,
    },
    Builtin {
        name: &'static str,
        func: BuiltinFn,
    },
}

/// Signature every built-in (`math.*`, `string.*`, `table.*`, `print`, ...)
/// implements. Lives behind a function pointer, not a trait object, since
/// none of them close over state beyond the context they're called with.
pub type BuiltinFn = fn(&mut crate::context::ExecutionContext, &[Value]) -> crate::error::WhiskerResult<Value>;

impl fmt::Debug for FunctionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionObject::User { name, params, .. } => f
                .debug_struct("User")
                .field("name", name)
                .field("params", params)
                .finish(),
            FunctionObject::Builtin { name, .. } => {
                f.debug_struct("Builtin").field("name", name).finish()
            }
        }
    }
}

/// The tagged value universe (spec §3). Tables and functions are
/// reference-counted handles into a single owning value graph; they are
/// never deep-cloned on assignment, matching Lua's reference semantics.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Num(f64),
    Str(SmolStr),
    Table(Rc<RefCell<Table>>),
    Function(Rc<FunctionObject>),
}

impl Value {
    pub fn str(s: impl Into<SmolStr>) -> Value {
        Value::Str(s.into())
    }

    pub fn table(t: Table) -> Value {
        Value::Table(Rc::new(RefCell::new(t)))
    }

    pub fn new_table() -> Value {
        Value::table(Table::new())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
            Value::Function(_) => "function",
        }
    }

    /// Spec §3: `Nil` and `Bool(false)` are the only falsy values.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Rc<RefCell<Table>>> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Table(t) => write!(f, "table({:p})", Rc::as_ptr(t)),
            Value::Function(fun) => write!(f, "function({:?})", fun),
        }
    }
}

impl PartialEq for Value {
    /// Spec §4.7: equality is same-reference-or-same-primitive; tables and
    /// functions are compared by identity, never structurally.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
