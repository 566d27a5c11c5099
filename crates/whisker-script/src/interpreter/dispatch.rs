//! Statement dispatch (spec §4.3 dispatch order).

use crate::context::ExecutionContext;
use crate::error::WhiskerResult;
use crate::value::Value;

use super::control;
use super::expr;
use super::scan;
use super::Flow;

pub fn execute_statement(ctx: &mut ExecutionContext, stmt: &str) -> WhiskerResult<Flow> {
    let stmt = stmt.trim();
    if stmt.is_empty() {
        return Ok(Flow::Normal);
    }

    if stmt == "break" {
        return Ok(Flow::Break);
    }
    if starts_with_word(stmt, "function") || starts_with_word(stmt, "local function") {
        control::define_function(ctx, stmt)?;
        return Ok(Flow::Normal);
    }
    if starts_with_word(stmt, "return") {
        let rest = stmt["return".len()..].trim();
        let value = if rest.is_empty() {
            Value::Nil
        } else {
            // Spec §9 Non-goals: a single primary return value, not a tuple.
            let first = scan::split_top_level_commas(rest);
            expr::eval(ctx, first.first().map(String::as_str).unwrap_or(""))?
        };
        return Ok(Flow::Return(value));
    }
    if starts_with_word(stmt, "if") {
        return control::execute_if(ctx, stmt);
    }
    if starts_with_word(stmt, "while") {
        return control::execute_while(ctx, stmt);
    }
    if starts_with_word(stmt, "repeat") {
        return control::execute_repeat(ctx, stmt);
    }
    if starts_with_word(stmt, "for") {
        return control::execute_for(ctx, stmt);
    }
    if starts_with_word(stmt, "local") {
        execute_local(ctx, stmt)?;
        return Ok(Flow::Normal);
    }
    if let Some((lhs, rhs)) = expr::split_assignment(stmt) {
        execute_assignment(ctx, &lhs, &rhs)?;
        return Ok(Flow::Normal);
    }
    // Function-call expression or bare expression: evaluated for side
    // effects, result discarded.
    expr::eval(ctx, stmt)?;
    Ok(Flow::Normal)
}

fn starts_with_word(stmt: &str, word: &str) -> bool {
    stmt == word
        || stmt
            .strip_prefix(word)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| !c.is_alphanumeric() && c != '_')
}

fn execute_local(ctx: &mut ExecutionContext, stmt: &str) -> WhiskerResult<()> {
    let rest = stmt["local".len()..].trim();
    let (names_part, exprs_part) = expr::split_assignment(rest)
        .map(|(n, e)| (n, Some(e)))
        .unwrap_or((rest.to_string(), None));
    let names = scan::split_top_level_commas(&names_part);
    let values = match exprs_part {
        Some(e) => expr::eval_args(ctx, &e)?,
        None => Vec::new(),
    };
    for (i, name) in names.iter().enumerate() {
        let v = values.get(i).cloned().unwrap_or(Value::Nil);
        ctx.declare_local(name, v);
    }
    Ok(())
}

fn execute_assignment(ctx: &mut ExecutionContext, lhs: &str, rhs: &str) -> WhiskerResult<()> {
    let targets = scan::split_top_level_commas(lhs);
    let values = expr::eval_args(ctx, rhs)?;
    for (i, target) in targets.iter().enumerate() {
        let v = values.get(i).cloned().unwrap_or(Value::Nil);
        expr::assign_to(ctx, target, v)?;
    }
    Ok(())
}
