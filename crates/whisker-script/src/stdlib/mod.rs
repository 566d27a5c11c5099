//! Standard library installation (spec §4.6): globals `print`, `type`,
//! `tostring`, `tonumber`, `assert`, `error`, `pairs`/`ipairs`/`next`,
//! `select`, `rawget`/`rawset`/`rawequal`, `setmetatable`/`getmetatable`,
//! plus the `math`, `string` and `table` namespace tables.

mod basic;
mod math;
mod string;
mod table;

use std::rc::Rc;

use crate::context::ExecutionContext;
use crate::value::{BuiltinFn, FunctionObject, Table, Value};

fn builtin(name: &'static str, func: BuiltinFn) -> Rc<FunctionObject> {
    Rc::new(FunctionObject::Builtin { name, func })
}

fn namespace(entries: &[(&'static str, BuiltinFn)]) -> Value {
    let mut t = Table::new();
    for (name, func) in entries {
        t.set(*name, Value::Function(builtin(name, *func)));
    }
    Value::table(t)
}

pub fn install(ctx: &mut ExecutionContext) {
    for (name, func) in [
        ("print", basic::print as BuiltinFn),
        ("type", basic::type_of),
        ("tostring", basic::tostring),
        ("tonumber", basic::tonumber),
        ("assert", basic::assert),
        ("error", basic::error),
        ("pairs", basic::pairs),
        ("ipairs", basic::ipairs),
        ("next", basic::next),
        ("select", basic::select),
        ("rawget", basic::rawget),
        ("rawset", basic::rawset),
        ("rawequal", basic::rawequal),
        ("setmetatable", basic::setmetatable),
        ("getmetatable", basic::getmetatable),
    ] {
        ctx.functions.insert(name.to_string(), builtin(name, func));
    }

    ctx.globals.insert(
        "math".to_string(),
        namespace(&[
            ("floor", math::floor),
            ("ceil", math::ceil),
            ("abs", math::abs),
            ("sqrt", math::sqrt),
            ("pow", math::pow),
            ("exp", math::exp),
            ("log", math::log),
            ("sin", math::sin),
            ("cos", math::cos),
            ("tan", math::tan),
            ("fmod", math::fmod),
            ("modf", math::modf),
            ("min", math::min),
            ("max", math::max),
            ("random", math::random),
            ("randomseed", math::randomseed),
        ]),
    );
    if let Value::Table(t) = ctx.globals.get("math").unwrap() {
        t.borrow_mut().set("pi", Value::Num(std::f64::consts::PI));
        t.borrow_mut().set("huge", Value::Num(f64::INFINITY));
    }

    ctx.globals.insert(
        "string".to_string(),
        namespace(&[
            ("upper", string::upper),
            ("lower", string::lower),
            ("len", string::len),
            ("rep", string::rep),
            ("reverse", string::reverse),
            ("char", string::char_fn),
            ("byte", string::byte),
            ("sub", string::sub),
            ("find", string::find),
            ("match", string::matches),
            ("gsub", string::gsub),
            ("format", string::format),
        ]),
    );

    ctx.globals.insert(
        "table".to_string(),
        namespace(&[
            ("insert", table::insert),
            ("remove", table::remove),
            ("concat", table::concat),
            ("sort", table::sort),
            ("maxn", table::maxn),
        ]),
    );
}
