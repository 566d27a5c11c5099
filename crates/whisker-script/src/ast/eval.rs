//! Evaluates AST nodes against a host-owned [`RuntimeContext`](crate::host::Host)
//! (spec §4.7). Stricter than the string interpreter: `/` and `%` by zero
//! raise, call depth is capped, and only a narrow `math`/`string`/`whisker`
//! surface is reachable.

use ahash::AHashMap;

use crate::error::{WhiskerError, WhiskerResult};
use crate::host::Host;
use crate::value::{self, Value};

use super::{AssignOp, AstNode, BinaryOp, LiteralValue, UnaryOp};

/// Call-stack depth cap (spec §4.7, §5): exceeding it fails with
/// `CallDepthExceeded` rather than overflowing the native stack.
pub const CALL_DEPTH_LIMIT: usize = 100;

pub struct AstEvaluator<'a, H: Host> {
    host: &'a mut H,
    depth: usize,
}

impl<'a, H: Host> AstEvaluator<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        AstEvaluator { host, depth: 0 }
    }

    pub fn eval(&mut self, node: &AstNode, locals: &mut AHashMap<String, Value>) -> WhiskerResult<Value> {
        match node {
            AstNode::Literal { value, .. } => Ok(literal_value(value)),
            AstNode::Variable { name, .. } => {
                Ok(locals.get(name).cloned().unwrap_or_else(|| {
                    self.host.state_get(name).unwrap_or(Value::Nil)
                }))
            }
            AstNode::Identifier { name } => Ok(locals.get(name).cloned().unwrap_or(Value::Nil)),
            AstNode::Unary { op, arg } => self.eval_unary(*op, arg, locals),
            AstNode::Binary { op, left, right } => self.eval_binary(*op, left, right, locals),
            AstNode::Member { .. } => self.resolve_member_value(node, locals),
            AstNode::Call { callee, args } => self.eval_call(callee, args, locals),
            AstNode::Assignment { op, target, value } => self.eval_assignment(*op, target, value, locals),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, arg: &AstNode, locals: &mut AHashMap<String, Value>) -> WhiskerResult<Value> {
        let v = self.eval(arg, locals)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!v.is_truthy()),
            UnaryOp::Neg => Value::Num(-value::to_number(&v)?),
            UnaryOp::Len => match &v {
                Value::Str(s) => Value::Num(s.chars().count() as f64),
                Value::Table(t) => Value::Num(t.borrow().length() as f64),
                other => {
                    return Err(WhiskerError::TypeMismatch(format!(
                        "attempt to get length of a {} value",
                        other.type_name()
                    )));
                }
            },
        })
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &AstNode,
        right: &AstNode,
        locals: &mut AHashMap<String, Value>,
    ) -> WhiskerResult<Value> {
        if op == BinaryOp::And {
            let lv = self.eval(left, locals)?;
            return if lv.is_truthy() { self.eval(right, locals) } else { Ok(lv) };
        }
        if op == BinaryOp::Or {
            let lv = self.eval(left, locals)?;
            return if lv.is_truthy() { Ok(lv) } else { self.eval(right, locals) };
        }

        let lv = self.eval(left, locals)?;
        let rv = self.eval(right, locals)?;
        match op {
            BinaryOp::Add => Ok(Value::Num(value::to_number(&lv)? + value::to_number(&rv)?)),
            BinaryOp::Sub => Ok(Value::Num(value::to_number(&lv)? - value::to_number(&rv)?)),
            BinaryOp::Mul => Ok(Value::Num(value::to_number(&lv)? * value::to_number(&rv)?)),
            BinaryOp::Div => {
                let (a, b) = (value::to_number(&lv)?, value::to_number(&rv)?);
                if b == 0.0 {
                    return Err(WhiskerError::DivisionByZero("'/' by zero".to_string()));
                }
                Ok(Value::Num(a / b))
            }
            BinaryOp::Mod => {
                let (a, b) = (value::to_number(&lv)?, value::to_number(&rv)?);
                if b == 0.0 {
                    return Err(WhiskerError::DivisionByZero("'%' by zero".to_string()));
                }
                Ok(Value::Num(a - (a / b).floor() * b))
            }
            BinaryOp::Pow => Ok(Value::Num(value::to_number(&lv)?.powf(value::to_number(&rv)?))),
            BinaryOp::Concat => Ok(Value::str(format!(
                "{}{}",
                value::to_string(&lv),
                value::to_string(&rv)
            ))),
            BinaryOp::Eq => Ok(Value::Bool(value::equals(&lv, &rv))),
            BinaryOp::Ne => Ok(Value::Bool(!value::equals(&lv, &rv))),
            BinaryOp::Lt => Ok(Value::Bool(value::compare(&lv, &rv)? == std::cmp::Ordering::Less)),
            BinaryOp::Gt => Ok(Value::Bool(value::compare(&lv, &rv)? == std::cmp::Ordering::Greater)),
            BinaryOp::Le => Ok(Value::Bool(value::compare(&lv, &rv)? != std::cmp::Ordering::Greater)),
            BinaryOp::Ge => Ok(Value::Bool(value::compare(&lv, &rv)? != std::cmp::Ordering::Less)),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    /// Resolves a `Member`/`Identifier` chain rooted at a plain local/story
    /// variable into its current `Value` (used when a `Member` expression is
    /// evaluated outside of call position).
    fn resolve_member_value(&mut self, node: &AstNode, locals: &mut AHashMap<String, Value>) -> WhiskerResult<Value> {
        if let AstNode::Member { object, property } = node {
            if let AstNode::Identifier { name } = object.as_ref()
                && name == "math"
            {
                match property.as_str() {
                    "pi" => return Ok(Value::Num(std::f64::consts::PI)),
                    "huge" => return Ok(Value::Num(f64::INFINITY)),
                    _ => {}
                }
            }
            let base = self.eval(object, locals)?;
            match base {
                Value::Table(t) => Ok(t.borrow().get(property)),
                other => Err(WhiskerError::TypeMismatch(format!(
                    "attempt to index a {} value",
                    other.type_name()
                ))),
            }
        } else {
            unreachable!("resolve_member_value called on a non-Member node")
        }
    }

    fn eval_assignment(
        &mut self,
        op: AssignOp,
        target: &AstNode,
        value_node: &AstNode,
        locals: &mut AHashMap<String, Value>,
    ) -> WhiskerResult<Value> {
        let rhs = self.eval(value_node, locals)?;
        let new_value = if op == AssignOp::Assign {
            rhs
        } else {
            let current = self.eval(target, locals)?;
            let (a, b) = (value::to_number(&current)?, value::to_number(&rhs)?);
            Value::Num(match op {
                AssignOp::AddAssign => a + b,
                AssignOp::SubAssign => a - b,
                AssignOp::MulAssign => a * b,
                AssignOp::DivAssign => {
                    if b == 0.0 {
                        return Err(WhiskerError::DivisionByZero("'/=' by zero".to_string()));
                    }
                    a / b
                }
                AssignOp::Assign => unreachable!(),
            })
        };
        self.store(target, new_value.clone(), locals)?;
        Ok(new_value)
    }

    fn store(&mut self, target: &AstNode, value: Value, locals: &mut AHashMap<String, Value>) -> WhiskerResult<()> {
        match target {
            AstNode::Variable { name, .. } => {
                self.host.state_set(name, value);
                Ok(())
            }
            AstNode::Identifier { name } => {
                locals.insert(name.clone(), value);
                Ok(())
            }
            AstNode::Member { object, property } => {
                let base = self.eval(object, locals)?;
                match base {
                    Value::Table(t) => {
                        t.borrow_mut().set(property.clone(), value);
                        Ok(())
                    }
                    other => Err(WhiskerError::TypeMismatch(format!(
                        "attempt to index a {} value",
                        other.type_name()
                    ))),
                }
            }
            other => Err(WhiskerError::Syntax(format!("invalid assignment target: {other:?}"))),
        }
    }

    fn eval_call(
        &mut self,
        callee: &AstNode,
        args: &[AstNode],
        locals: &mut AHashMap<String, Value>,
    ) -> WhiskerResult<Value> {
        self.depth += 1;
        if self.depth > CALL_DEPTH_LIMIT {
            self.depth -= 1;
            return Err(WhiskerError::CallDepthExceeded {
                depth: self.depth + 1,
                limit: CALL_DEPTH_LIMIT,
            });
        }
        let result = self.eval_call_inner(callee, args, locals);
        self.depth -= 1;
        result
    }

    fn eval_call_inner(
        &mut self,
        callee: &AstNode,
        args: &[AstNode],
        locals: &mut AHashMap<String, Value>,
    ) -> WhiskerResult<Value> {
        let path = dotted_path(callee)
            .ok_or_else(|| WhiskerError::Syntax("call target is not a dotted name".to_string()))?;
        let values: Vec<Value> = args.iter().map(|a| self.eval(a, locals)).collect::<WhiskerResult<_>>()?;

        match path.first().map(String::as_str) {
            Some("whisker") => crate::host::dispatch(self.host, &path[1..], &values),
            Some("math") => super::math_call(self.host, &path[1..], &values),
            Some("string") => super::string_call(&path[1..], &values),
            Some("print") if path.len() == 1 => {
                self.host.print(&values);
                Ok(Value::Nil)
            }
            Some("type") if path.len() == 1 => Ok(Value::str(values.first().unwrap_or(&Value::Nil).type_name())),
            Some("tostring") if path.len() == 1 => {
                Ok(Value::str(value::to_string(values.first().unwrap_or(&Value::Nil))))
            }
            Some("tonumber") if path.len() == 1 => Ok(values
                .first()
                .and_then(|v| match v {
                    Value::Num(n) => Some(*n),
                    Value::Str(s) => value::parse_lua_number(s),
                    _ => None,
                })
                .map(Value::Num)
                .unwrap_or(Value::Nil)),
            _ => Err(WhiskerError::NameError(format!("unknown function '{}'", path.join(".")))),
        }
    }
}

fn literal_value(v: &LiteralValue) -> Value {
    match v {
        LiteralValue::Number(n) => Value::Num(*n),
        LiteralValue::String(s) => Value::str(s.clone()),
        LiteralValue::Boolean(b) => Value::Bool(*b),
        LiteralValue::Nil => Value::Nil,
    }
}

/// Flattens a `Member`/`Identifier` chain into its dotted path segments,
/// e.g. `whisker.passage.go` → `["whisker", "passage", "go"]`.
fn dotted_path(node: &AstNode) -> Option<Vec<String>> {
    match node {
        AstNode::Identifier { name } => Some(vec![name.clone()]),
        AstNode::Member { object, property } => {
            let mut path = dotted_path(object)?;
            path.push(property.clone());
            Some(path)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignOp, LiteralValue, ValueType};
    use crate::host::StateApi;
    use crate::runtime::InMemoryRuntime;

    fn num_lit(n: f64) -> AstNode {
        AstNode::Literal {
            value_type: ValueType::Number,
            value: LiteralValue::Number(n),
        }
    }

    #[test]
    fn add_assign_reads_and_writes_host_state() {
        let mut host = InMemoryRuntime::new();
        host.state_set("gold", Value::Num(100.0));
        let mut locals = AHashMap::new();
        let mut eval = AstEvaluator::new(&mut host);

        let node = AstNode::Assignment {
            op: AssignOp::AddAssign,
            target: Box::new(AstNode::Variable { name: "gold".to_string(), scope: None }),
            value: Box::new(num_lit(50.0)),
        };
        let result = eval.eval(&node, &mut locals).unwrap();
        assert_eq!(result.as_num(), Some(150.0));
        assert_eq!(host.state_get("gold").unwrap().as_num(), Some(150.0));
    }

    #[test]
    fn division_by_zero_raises_instead_of_returning_zero() {
        let mut host = InMemoryRuntime::new();
        let mut locals = AHashMap::new();
        let mut eval = AstEvaluator::new(&mut host);
        let node = AstNode::Binary {
            op: BinaryOp::Div,
            left: Box::new(num_lit(1.0)),
            right: Box::new(num_lit(0.0)),
        };
        assert!(matches!(eval.eval(&node, &mut locals), Err(WhiskerError::DivisionByZero(_))));
    }

    #[test]
    fn call_depth_cap_is_enforced() {
        let mut host = InMemoryRuntime::new();
        let mut locals = AHashMap::new();
        let mut eval = AstEvaluator::new(&mut host);
        // string.upper("x") is a cheap, always-resolvable call to drive through eval_call.
        let node = AstNode::Call {
            callee: Box::new(AstNode::Member {
                object: Box::new(AstNode::Identifier { name: "string".to_string() }),
                property: "upper".to_string(),
            }),
            args: vec![AstNode::Literal {
                value_type: ValueType::String,
                value: LiteralValue::String("x".to_string()),
            }],
        };
        eval.depth = CALL_DEPTH_LIMIT;
        assert!(matches!(eval.eval(&node, &mut locals), Err(WhiskerError::CallDepthExceeded { .. })));
        eval.depth = 0;
        assert_eq!(eval.eval(&node, &mut locals).unwrap().as_str(), Some("X"));
    }

    #[test]
    fn math_pi_and_huge_are_reachable_without_a_math_table() {
        let mut host = InMemoryRuntime::new();
        let mut locals = AHashMap::new();
        let mut eval = AstEvaluator::new(&mut host);
        let node = AstNode::Member {
            object: Box::new(AstNode::Identifier { name: "math".to_string() }),
            property: "pi".to_string(),
        };
        let v = eval.eval(&node, &mut locals).unwrap();
        assert!((v.as_num().unwrap() - std::f64::consts::PI).abs() < 1e-12);
    }
}
