//! Control-flow executors (spec §4.5).

use std::rc::Rc;

use crate::context::{ExecutionContext, LocalScopeGuard};
use crate::error::{WhiskerError, WhiskerResult};
use crate::value::{self, FunctionObject, Value};

use super::expr;
use super::scan;
use super::Flow;

/// Hard iteration cap shared by `while`/`repeat`/numeric-`for`/generic-`for`
/// (spec §4.5, §5): exceeding it is a fatal error, not a per-statement one.
pub const ITERATION_CAP: usize = 10_000;

pub fn execute_if(ctx: &mut ExecutionContext, stmt: &str) -> WhiskerResult<Flow> {
    let markers = scan::block_markers(stmt);
    let chars: Vec<char> = stmt.chars().collect();
    // Branch boundaries: "if" COND "then" BODY ("elseif" COND "then" BODY)*
    // ("else" BODY)? "end".
    let mut branch_starts: Vec<usize> = vec![0];
    for m in &markers {
        if m.word == "elseif" || m.word == "else" {
            branch_starts.push(m.start);
        }
    }
    let end = markers
        .last()
        .filter(|m| m.word == "end")
        .map(|m| m.start)
        .ok_or_else(|| WhiskerError::Syntax("missing 'end' in if".to_string()))?;
    branch_starts.push(end);

    for w in branch_starts.windows(2) {
        let (start, stop) = (w[0], w[1]);
        let segment: String = chars[start..stop].iter().collect();
        let seg = segment.trim();
        if let Some(rest) = seg.strip_prefix("else")
            && !rest.trim_start().starts_with("if")
        {
            let body = rest;
            return super::run_block(ctx, body);
        }
        let keyword_len = if seg.starts_with("elseif") { 6 } else { 2 }; // "if" or "elseif"
        // `block_markers` only recognizes "if" as a block opener, so probe
        // with "else" stripped from "elseif" (leaving a leading "if") to get
        // correct block-depth accounting for the `then` search.
        let probe_offset = if keyword_len == 6 { 4 } else { 0 };
        let then_pos = scan::find_top_level_word(&seg[probe_offset..], "then")
            .map(|p| p + probe_offset)
            .ok_or_else(|| WhiskerError::Syntax("missing 'then'".to_string()))?;
        let seg_chars: Vec<char> = seg.chars().collect();
        let cond_text: String = seg_chars[keyword_len..then_pos].iter().collect();
        let cond = expr::eval(ctx, cond_text.trim())?;
        if cond.is_truthy() {
            let body: String = seg_chars[then_pos + 4..].iter().collect();
            return super::run_block(ctx, &body);
        }
    }
    Ok(Flow::Normal)
}

pub fn execute_while(ctx: &mut ExecutionContext, stmt: &str) -> WhiskerResult<Flow> {
    let do_pos = scan::find_top_level_word(stmt, "do")
        .ok_or_else(|| WhiskerError::Syntax("missing 'do' in while".to_string()))?;
    let markers = scan::block_markers(stmt);
    let end = markers
        .last()
        .filter(|m| m.word == "end")
        .map(|m| m.start)
        .ok_or_else(|| WhiskerError::Syntax("missing 'end' in while".to_string()))?;
    let chars: Vec<char> = stmt.chars().collect();
    let cond_text: String = chars[5..do_pos].iter().collect(); // "while".len() == 5
    let body: String = chars[do_pos + 2..end].iter().collect();

    let mut iterations = 0usize;
    loop {
        if !expr::eval(ctx, cond_text.trim())?.is_truthy() {
            break;
        }
        iterations += 1;
        if iterations > ITERATION_CAP {
            return Err(WhiskerError::IterationCapExceeded { limit: ITERATION_CAP });
        }
        match super::run_block(ctx, &body)? {
            Flow::Break => break,
            Flow::Return(v) => return Ok(Flow::Return(v)),
            Flow::Normal => {}
        }
    }
    Ok(Flow::Normal)
}

pub fn execute_repeat(ctx: &mut ExecutionContext, stmt: &str) -> WhiskerResult<Flow> {
    let markers = scan::block_markers(stmt);
    let until = markers
        .last()
        .filter(|m| m.word == "until")
        .ok_or_else(|| WhiskerError::Syntax("missing 'until' in repeat".to_string()))?;
    let chars: Vec<char> = stmt.chars().collect();
    let body: String = chars[6..until.start].iter().collect(); // "repeat".len() == 6
    let cond_text: String = chars[until.end..].iter().collect();

    let mut iterations = 0usize;
    loop {
        iterations += 1;
        if iterations > ITERATION_CAP {
            return Err(WhiskerError::IterationCapExceeded { limit: ITERATION_CAP });
        }
        match super::run_block(ctx, &body)? {
            Flow::Break => break,
            Flow::Return(v) => return Ok(Flow::Return(v)),
            Flow::Normal => {}
        }
        if expr::eval(ctx, cond_text.trim())?.is_truthy() {
            break;
        }
    }
    Ok(Flow::Normal)
}

pub fn execute_for(ctx: &mut ExecutionContext, stmt: &str) -> WhiskerResult<Flow> {
    let do_pos = scan::find_top_level_word(stmt, "do")
        .ok_or_else(|| WhiskerError::Syntax("missing 'do' in for".to_string()))?;
    let markers = scan::block_markers(stmt);
    let end = markers
        .last()
        .filter(|m| m.word == "end")
        .map(|m| m.start)
        .ok_or_else(|| WhiskerError::Syntax("missing 'end' in for".to_string()))?;
    let chars: Vec<char> = stmt.chars().collect();
    let header: String = chars[3..do_pos].iter().collect(); // "for".len() == 3
    let body: String = chars[do_pos + 2..end].iter().collect();

    // Generic-for iff " in " appears at the top level of the header.
    if scan::find_top_level_word_simple(&header, "in").is_some() {
        execute_generic_for(ctx, &header, &body)
    } else {
        execute_numeric_for(ctx, &header, &body)
    }
}

fn execute_numeric_for(ctx: &mut ExecutionContext, header: &str, body: &str) -> WhiskerResult<Flow> {
    let (var, rest) = header
        .split_once('=')
        .ok_or_else(|| WhiskerError::Syntax("malformed numeric for".to_string()))?;
    let var = var.trim().to_string();
    let parts = scan::split_top_level_commas(rest.trim());
    if parts.len() < 2 || parts.len() > 3 {
        return Err(WhiskerError::Syntax(
            "numeric for requires start, stop[, step]".to_string(),
        ));
    }
    let start = value::to_number(&expr::eval(ctx, &parts[0])?)?;
    let stop = value::to_number(&expr::eval(ctx, &parts[1])?)?;
    let step = if parts.len() == 3 {
        value::to_number(&expr::eval(ctx, &parts[2])?)?
    } else {
        1.0
    };
    if step == 0.0 {
        return Err(WhiskerError::Syntax("'for' step is zero".to_string()));
    }

    let mut i = start;
    let mut iterations = 0usize;
    loop {
        if step > 0.0 && i > stop {
            break;
        }
        if step < 0.0 && i < stop {
            break;
        }
        iterations += 1;
        if iterations > ITERATION_CAP {
            return Err(WhiskerError::IterationCapExceeded { limit: ITERATION_CAP });
        }
        let mut guard = LocalScopeGuard::new(ctx);
        guard.ctx().declare_local(&var, Value::Num(i));
        let flow = super::run_block(guard.ctx(), body)?;
        drop(guard);
        match flow {
            Flow::Break => break,
            Flow::Return(v) => return Ok(Flow::Return(v)),
            Flow::Normal => {}
        }
        i += step;
    }
    Ok(Flow::Normal)
}

fn execute_generic_for(ctx: &mut ExecutionContext, header: &str, body: &str) -> WhiskerResult<Flow> {
    let in_pos = scan::find_top_level_word_simple(header, "in")
        .ok_or_else(|| WhiskerError::Syntax("malformed generic for".to_string()))?;
    let chars: Vec<char> = header.chars().collect();
    let vars_text: String = chars[..in_pos].iter().collect();
    let iter_text: String = chars[in_pos + 2..].iter().collect();
    let vars: Vec<String> = scan::split_top_level_commas(&vars_text);
    if vars.is_empty() {
        return Err(WhiskerError::Syntax("generic for needs loop variables".to_string()));
    }

    let iter_value = expr::eval(ctx, iter_text.trim())?;
    let table = match &iter_value {
        Value::Table(t) => Rc::clone(t),
        _ => {
            return Err(WhiskerError::TypeMismatch(
                "generic for requires the result of pairs()/ipairs()".to_string(),
            ));
        }
    };
    let entries: Vec<(String, Value)> = table
        .borrow()
        .ordered_keys()
        .iter()
        .map(|k| (k.clone(), table.borrow().get(k)))
        .collect();

    let mut iterations = 0usize;
    for (k, v) in entries {
        iterations += 1;
        if iterations > ITERATION_CAP {
            return Err(WhiskerError::IterationCapExceeded { limit: ITERATION_CAP });
        }
        let mut guard = LocalScopeGuard::new(ctx);
        let key_value = value::parse_lua_number(&k).map(Value::Num).unwrap_or(Value::str(k));
        guard.ctx().declare_local(&vars[0], key_value);
        if vars.len() > 1 {
            guard.ctx().declare_local(&vars[1], v);
        }
        let flow = super::run_block(guard.ctx(), body)?;
        drop(guard);
        match flow {
            Flow::Break => break,
            Flow::Return(v) => return Ok(Flow::Return(v)),
            Flow::Normal => {}
        }
    }
    Ok(Flow::Normal)
}

/// `function name(...) ... end` / `local function name(...) ... end`:
/// captures the parameter list and raw source body (spec §9), registering
/// the binding in the function registry (spec §4.2 — separate from
/// globals).
pub fn define_function(ctx: &mut ExecutionContext, stmt: &str) -> WhiskerResult<()> {
    let stmt = stmt.trim();
    let text = stmt
        .strip_prefix("local")
        .map(str::trim_start)
        .unwrap_or(stmt);
    let (name, params, body) = parse_function_core(text)?;
    let name = name.ok_or_else(|| WhiskerError::Syntax("function definition needs a name".to_string()))?;
    let func = Rc::new(FunctionObject::User {
        name: Some(name.clone()),
        params,
        body,
    });
    ctx.functions.insert(name, func);
    Ok(())
}

/// Parses `function [name](params) body end`, where `text` must start with
/// the `function` keyword itself (so `block_markers`' opener detection
/// lines up). Shared by named definitions and anonymous function literals.
fn parse_function_core(text: &str) -> WhiskerResult<(Option<String>, Vec<smol_str::SmolStr>, String)> {
    let after_kw = text
        .strip_prefix("function")
        .ok_or_else(|| WhiskerError::Syntax("not a function definition".to_string()))?;
    let paren = after_kw
        .find('(')
        .ok_or_else(|| WhiskerError::Syntax("missing '(' in function definition".to_string()))?;
    let name = after_kw[..paren].trim();
    let name = if name.is_empty() { None } else { Some(name.to_string()) };

    let chars: Vec<char> = text.chars().collect();
    let paren_abs = "function".chars().count() + paren;
    let close = scan::matching_bracket(&chars, paren_abs)
        .ok_or_else(|| WhiskerError::Syntax("missing ')' in function definition".to_string()))?;
    let params: Vec<_> = scan::split_top_level_commas(&chars[paren_abs + 1..close].iter().collect::<String>())
        .into_iter()
        .map(smol_str::SmolStr::new)
        .collect();

    let markers = scan::block_markers(text);
    let end = markers
        .last()
        .filter(|m| m.word == "end")
        .map(|m| m.start)
        .ok_or_else(|| WhiskerError::Syntax("missing 'end' in function definition".to_string()))?;
    let body: String = chars[close + 1..end].iter().collect();
    Ok((name, params, body))
}

/// Anonymous `function(params) body end` expression (spec §4.5 "Function
/// definition" used as a primary by the expression evaluator).
pub fn parse_function_literal(text: &str) -> WhiskerResult<Rc<FunctionObject>> {
    let (_, params, body) = parse_function_core(text)?;
    Ok(Rc::new(FunctionObject::User {
        name: None,
        params,
        body,
    }))
}

/// Invokes a callable value (spec §4.2 "function call prologue pushes a new
/// local scope containing parameter bindings; epilogue pops it even on
/// error").
pub fn call_value(ctx: &mut ExecutionContext, callee: &Value, args: &[Value]) -> WhiskerResult<Value> {
    match callee {
        Value::Function(f) => call_function(ctx, Rc::clone(f), args),
        other => Err(WhiskerError::TypeMismatch(format!(
            "attempt to call a {} value",
            other.type_name()
        ))),
    }
}

pub fn call_function(
    ctx: &mut ExecutionContext,
    func: Rc<FunctionObject>,
    args: &[Value],
) -> WhiskerResult<Value> {
    match func.as_ref() {
        FunctionObject::Builtin { func, .. } => func(ctx, args),
        FunctionObject::User { params, body, .. } => {
            let mut guard = LocalScopeGuard::new(ctx);
            for (i, param) in params.iter().enumerate() {
                guard
                    .ctx()
                    .declare_local(param, args.get(i).cloned().unwrap_or(Value::Nil));
            }
            let flow = super::run_block(guard.ctx(), body)?;
            drop(guard);
            Ok(match flow {
                Flow::Return(v) => v,
                _ => Value::Nil,
            })
        }
    }
}
