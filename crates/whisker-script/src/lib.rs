//! Whisker scripting runtime: a Lua-5.1-subset string interpreter, an AST
//! expression evaluator, the `whisker.*` host API, the LIST state machine,
//! and an INCLUDE module resolver.

pub mod ast;
pub mod context;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod list;
pub mod module;
pub mod pattern;
pub mod runtime;
mod stdlib;
pub mod value;

pub use context::ExecutionContext;
pub use error::{WhiskerError, WhiskerResult};
pub use value::Value;

/// Runs `source` as a full script against a fresh [`ExecutionContext`],
/// returning the context so callers can inspect output/errors/globals.
pub fn run(source: &str) -> ExecutionContext {
    let mut ctx = ExecutionContext::new();
    if let Err(e) = interpreter::run(&mut ctx, source) {
        ctx.errors.push(e.to_string());
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_precedence() {
        let ctx = run("result = 10 + 20 * 2");
        assert!(ctx.success(), "{:?}", ctx.errors);
        assert_eq!(ctx.globals.get("result").unwrap().as_num(), Some(50.0));
    }

    #[test]
    fn numeric_for_loop_accumulates() {
        let ctx = run("total = 0\nfor i = 1,10 do total = total + i end");
        assert!(ctx.success(), "{:?}", ctx.errors);
        assert_eq!(ctx.globals.get("total").unwrap().as_num(), Some(55.0));
    }

    #[test]
    fn user_function_call() {
        let ctx = run(
            "function max(a,b) if a > b then return a else return b end end\nresult = max(15,10)",
        );
        assert!(ctx.success(), "{:?}", ctx.errors);
        assert_eq!(ctx.globals.get("result").unwrap().as_num(), Some(15.0));
    }

    #[test]
    fn pairs_iterates_table_fields() {
        let ctx = run("t = {a=10, b=20}\ns = 0\nfor k,v in pairs(t) do s = s + v end");
        assert!(ctx.success(), "{:?}", ctx.errors);
        assert_eq!(ctx.globals.get("s").unwrap().as_num(), Some(30.0));
    }

    #[test]
    fn array_constructor_length_and_ipairs_match() {
        let ctx = run("t = {10, 20, 30}\nn = #t\nsum = 0\nfor i,v in ipairs(t) do sum = sum + v end");
        assert!(ctx.success(), "{:?}", ctx.errors);
        assert_eq!(ctx.globals.get("n").unwrap().as_num(), Some(3.0));
        assert_eq!(ctx.globals.get("sum").unwrap().as_num(), Some(60.0));
    }
}
