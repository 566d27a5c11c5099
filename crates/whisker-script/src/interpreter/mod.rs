//! The string-based Lua-5.1-subset interpreter (spec §4.2–§4.6).

mod control;
mod dispatch;
mod expr;
mod scan;
mod splitter;

pub use control::{call_function, call_value};

use crate::context::ExecutionContext;
use crate::error::WhiskerResult;
use crate::value::Value;

/// Structured non-local exit (spec §4.5, §9): `return`/`break` are threaded
/// through statement executors as data instead of being raised as errors.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Break,
    Return(Value),
}

/// Runs `source` against `ctx` to completion. Per-statement errors are
/// caught and appended to `ctx.errors`; execution continues with the next
/// statement (spec §7). A top-level `return`/`break` simply ends the run.
pub fn run(ctx: &mut ExecutionContext, source: &str) -> WhiskerResult<()> {
    run_block(ctx, source)?;
    Ok(())
}

pub(crate) fn run_block(ctx: &mut ExecutionContext, body: &str) -> WhiskerResult<Flow> {
    for stmt in splitter::split_statements(body) {
        match dispatch::execute_statement(ctx, &stmt) {
            Ok(Flow::Normal) => {}
            Ok(flow) => return Ok(flow),
            Err(e) => {
                ctx.errors.push(e.to_string());
            }
        }
    }
    Ok(Flow::Normal)
}

pub use expr::eval as eval_expr;
