//! Execution context for the string interpreter (spec §3, §4.2).

use std::rc::Rc;

use ahash::AHashMap;

use crate::value::{FunctionObject, Value};

/// A single `local` scope, pushed on function/loop entry and popped on exit
/// (even on error — callers use a guard, see [`LocalScopeGuard`]).
pub type LocalScope = AHashMap<String, Value>;

/// Spec §3 `ExecutionContext`: globals, function registry, local-scope
/// stack, output buffer, per-statement error list, RNG seed, and the
/// metatable slot (reserved — metatables are a Non-goal beyond storage).
pub struct ExecutionContext {
    pub globals: AHashMap<String, Value>,
    pub functions: AHashMap<String, Rc<FunctionObject>>,
    locals: Vec<LocalScope>,
    pub output: Vec<String>,
    pub errors: Vec<String>,
    pub rng_seed: u64,
    rng_state: u64,
    metatables: AHashMap<usize, Value>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        let seed = 0x2545_F491_4F6C_DD1D;
        let mut ctx = ExecutionContext {
            globals: AHashMap::new(),
            functions: AHashMap::new(),
            locals: Vec::new(),
            output: Vec::new(),
            errors: Vec::new(),
            rng_seed: seed,
            rng_state: seed,
            metatables: AHashMap::new(),
        };
        crate::stdlib::install(&mut ctx);
        ctx
    }

    /// Whether every statement run so far succeeded (spec §7 "success").
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_scope(&mut self) {
        self.locals.push(LocalScope::new());
    }

    pub fn pop_scope(&mut self) {
        self.locals.pop();
    }

    pub fn scope_depth(&self) -> usize {
        self.locals.len()
    }

    /// Spec §4.2: name resolution walks innermost local scope outward, then
    /// globals.
    pub fn get(&self, name: &str) -> Value {
        for scope in self.locals.iter().rev() {
            if let Some(v) = scope.get(name) {
                return v.clone();
            }
        }
        self.globals.get(name).cloned().unwrap_or(Value::Nil)
    }

    /// Plain assignment (no `local`): writes into whichever scope already
    /// holds the name, else globals.
    pub fn assign(&mut self, name: &str, value: Value) {
        for scope in self.locals.iter_mut().rev() {
            if scope.contains_key(name) {
                scope.insert(name.to_string(), value);
                return;
            }
        }
        self.globals.insert(name.to_string(), value);
    }

    /// `local x = e`: writes a fresh binding in the topmost local scope,
    /// creating one if none exists (top-level `local` outside any block).
    pub fn declare_local(&mut self, name: &str, value: Value) {
        if self.locals.is_empty() {
            self.push_scope();
        }
        self.locals
            .last_mut()
            .expect("scope pushed above")
            .insert(name.to_string(), value);
    }

    pub fn print(&mut self, parts: &[Value]) {
        let line = parts
            .iter()
            .map(crate::value::to_string)
            .collect::<Vec<_>>()
            .join("\t");
        self.output.push(line);
    }

    pub fn set_metatable(&mut self, table: &Value, meta: Option<Value>) {
        if let Value::Table(t) = table {
            let key = Rc::as_ptr(t) as usize;
            match meta {
                Some(m) => {
                    self.metatables.insert(key, m);
                }
                None => {
                    self.metatables.remove(&key);
                }
            }
        }
    }

    pub fn get_metatable(&self, table: &Value) -> Value {
        if let Value::Table(t) = table {
            let key = Rc::as_ptr(t) as usize;
            return self.metatables.get(&key).cloned().unwrap_or(Value::Nil);
        }
        Value::Nil
    }

    /// `math.randomseed`: mutates only this context's seed (spec §9).
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng_seed = seed;
        self.rng_state = seed | 1;
    }

    /// xorshift64*: small, dependency-free, deterministic per seed.
    pub fn next_random(&mut self) -> f64 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// RAII guard that pushes a local scope and pops it on drop — including
/// during unwinding from `?`, matching spec §4.2's "even on error".
pub struct LocalScopeGuard<'a> {
    ctx: &'a mut ExecutionContext,
}

impl<'a> LocalScopeGuard<'a> {
    pub fn new(ctx: &'a mut ExecutionContext) -> Self {
        ctx.push_scope();
        LocalScopeGuard { ctx }
    }

    pub fn ctx(&mut self) -> &mut ExecutionContext {
        self.ctx
    }
}

impl Drop for LocalScopeGuard<'_> {
    fn drop(&mut self) {
        self.ctx.pop_scope();
    }
}
