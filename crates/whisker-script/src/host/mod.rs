//! The `whisker.*` host API (spec §4.8): `state`, `passage`, `history`,
//! `choice`, `hook`, plus the top-level `visited/random/pick/print`.

pub mod choice;
pub mod history;
pub mod hook;
pub mod passage;
pub mod state;

pub use choice::{Choice, ChoiceApi};
pub use history::HistoryApi;
pub use hook::{Hook, HookApi};
pub use passage::{Passage, PassageApi};
pub use state::StateApi;

use crate::error::{WhiskerError, WhiskerResult};
use crate::value::{self, Value};

/// Everything the AST evaluator's `whisker.*` call resolution (§4.7) needs
/// from the host-owned story session. A host supplies one concrete
/// implementation (see [`crate::runtime::InMemoryRuntime`] for the reference
/// one) and hands the evaluator a mutable borrow of it; lifecycle is owned
/// entirely by the host.
pub trait Host: StateApi + PassageApi + HistoryApi + ChoiceApi + HookApi {
    /// `whisker.visited([id])`: visit count for `id`, or the current passage
    /// if omitted.
    fn visited(&self, id: Option<&str>) -> i64;
    /// `whisker.random(min, max)`: inclusive uniform integer in `[min, max]`.
    fn random(&mut self, min: i64, max: i64) -> i64;
    /// `whisker.pick(...)`: uniform pick among at least one option.
    fn pick(&mut self, options: &[Value]) -> WhiskerResult<Value>;
    /// `whisker.print(...)`: stringifies and appends TAB-joined.
    fn print(&mut self, parts: &[Value]);
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Nil)
}

fn arg_str(args: &[Value], i: usize) -> String {
    value::to_string(&arg(args, i))
}

fn arg_i64(args: &[Value], i: usize) -> WhiskerResult<i64> {
    value::to_number(&arg(args, i)).map(|n| n as i64)
}

fn table_of(values: Vec<Value>) -> Value {
    let t = crate::value::Table::new();
    let out = Value::table(t);
    if let Value::Table(t) = &out {
        for v in values {
            t.borrow_mut().push_array(v);
        }
    }
    out
}

fn strings_to_values(strings: Vec<String>) -> Value {
    table_of(strings.into_iter().map(Value::str).collect())
}

/// `whisker.state.getList`'s return shape: a table of `values` (possible
/// states) and `active` (the currently active subset).
fn list_to_value(list: &crate::list::ListValue) -> Value {
    let t = crate::value::Table::new();
    let out = Value::table(t);
    if let Value::Table(t) = &out {
        t.borrow_mut().set("values", strings_to_values(list.possible_values().to_vec()));
        t.borrow_mut().set("active", strings_to_values(list.active_values().to_vec()));
    }
    out
}

/// Routes a `whisker.<path>(...)` call (spec §4.7 "`whisker.*` calls route to
/// the host API") into the matching [`Host`] method. `path` excludes the
/// leading `"whisker"` segment.
pub fn dispatch<H: Host>(host: &mut H, path: &[String], args: &[Value]) -> WhiskerResult<Value> {
    let head = path
        .first()
        .ok_or_else(|| WhiskerError::NameError("whisker: missing namespace".to_string()))?
        .as_str();
    let rest = path.get(1).map(String::as_str).unwrap_or("");

    match head {
        "visited" => {
            let id = args.first().map(value::to_string);
            Ok(Value::Num(host.visited(id.as_deref()) as f64))
        }
        "random" => Ok(Value::Num(host.random(arg_i64(args, 0)?, arg_i64(args, 1)?) as f64)),
        "pick" => host.pick(args),
        "print" => {
            host.print(args);
            Ok(Value::Nil)
        }
        "state" => state_dispatch(host, rest, args),
        "passage" => passage_dispatch(host, rest, args),
        "history" => history_dispatch(host, rest, args),
        "choice" => choice_dispatch(host, rest, args),
        "hook" => hook_dispatch(host, rest, args),
        other => Err(WhiskerError::NameError(format!("whisker.{other}: unknown namespace"))),
    }
}

fn state_dispatch<H: Host>(host: &mut H, op: &str, args: &[Value]) -> WhiskerResult<Value> {
    match op {
        "get" => Ok(host.state_get(&arg_str(args, 0)).unwrap_or(Value::Nil)),
        "set" => {
            host.state_set(&arg_str(args, 0), arg(args, 1));
            Ok(Value::Nil)
        }
        "has" => Ok(Value::Bool(host.state_has(&arg_str(args, 0)))),
        "delete" => {
            host.state_delete(&arg_str(args, 0));
            Ok(Value::Nil)
        }
        "all" => Ok(Value::table(host.state_all())),
        "reset" => {
            host.state_reset();
            Ok(Value::Nil)
        }
        "getList" => Ok(host.get_list(&arg_str(args, 0)).map(list_to_value).unwrap_or(Value::Nil)),
        "listValues" => Ok(strings_to_values(host.list_values(&arg_str(args, 0))?)),
        "listActive" => Ok(strings_to_values(host.list_active(&arg_str(args, 0))?)),
        "hasList" => Ok(Value::Bool(host.has_list(&arg_str(args, 0)))),
        "listContains" => Ok(Value::Bool(host.list_contains(&arg_str(args, 0), &arg_str(args, 1))?)),
        "listAdd" => {
            host.list_add(&arg_str(args, 0), &arg_str(args, 1))?;
            Ok(Value::Nil)
        }
        "listRemove" => {
            host.list_remove(&arg_str(args, 0), &arg_str(args, 1))?;
            Ok(Value::Nil)
        }
        "listToggle" => {
            host.list_toggle(&arg_str(args, 0), &arg_str(args, 1))?;
            Ok(Value::Nil)
        }
        "listCount" => Ok(Value::Num(host.list_count(&arg_str(args, 0))? as f64)),
        "getArray" => Ok(host.get_array(&arg_str(args, 0)).unwrap_or(Value::Nil)),
        "hasArray" => Ok(Value::Bool(host.has_array(&arg_str(args, 0)))),
        "arrayGet" => host.array_get(&arg_str(args, 0), arg_i64(args, 1)?),
        "arraySet" => {
            host.array_set(&arg_str(args, 0), arg_i64(args, 1)?, arg(args, 2))?;
            Ok(Value::Nil)
        }
        "arrayLength" => Ok(Value::Num(host.array_length(&arg_str(args, 0))? as f64)),
        "arrayPush" => {
            host.array_push(&arg_str(args, 0), arg(args, 1))?;
            Ok(Value::Nil)
        }
        "arrayPop" => host.array_pop(&arg_str(args, 0)),
        "arrayInsert" => {
            host.array_insert(&arg_str(args, 0), arg_i64(args, 1)?, arg(args, 2))?;
            Ok(Value::Nil)
        }
        "arrayRemove" => host.array_remove(&arg_str(args, 0), arg_i64(args, 1)?),
        "arrayContains" => Ok(Value::Bool(host.array_contains(&arg_str(args, 0), &arg(args, 1))?)),
        "arrayIndexOf" => Ok(Value::Num(host.array_index_of(&arg_str(args, 0), &arg(args, 1))? as f64)),
        "getMap" => Ok(host.get_map(&arg_str(args, 0)).unwrap_or(Value::Nil)),
        "hasMap" => Ok(Value::Bool(host.has_map(&arg_str(args, 0)))),
        "mapGet" => host.map_get(&arg_str(args, 0), &arg_str(args, 1)),
        "mapSet" => {
            host.map_set(&arg_str(args, 0), &arg_str(args, 1), arg(args, 2))?;
            Ok(Value::Nil)
        }
        "mapHas" => Ok(Value::Bool(host.map_has(&arg_str(args, 0), &arg_str(args, 1))?)),
        "mapDelete" => {
            host.map_delete(&arg_str(args, 0), &arg_str(args, 1))?;
            Ok(Value::Nil)
        }
        "mapKeys" => Ok(strings_to_values(host.map_keys(&arg_str(args, 0))?)),
        "mapValues" => Ok(table_of(host.map_values(&arg_str(args, 0))?)),
        "mapSize" => Ok(Value::Num(host.map_size(&arg_str(args, 0))? as f64)),
        other => Err(WhiskerError::NameError(format!("whisker.state.{other}: unknown operation"))),
    }
}

fn passage_table(p: &Passage) -> Value {
    let t = crate::value::Table::new();
    let out = Value::table(t);
    if let Value::Table(t) = &out {
        let mut t = t.borrow_mut();
        t.set("id", Value::str(p.id.clone()));
        t.set("content", Value::str(p.content.clone()));
        t.set("tags", strings_to_values(p.tags.clone()));
        t.set("metadata", Value::Table(std::rc::Rc::new(std::cell::RefCell::new(p.metadata.clone()))));
    }
    out
}

fn passage_dispatch<H: Host>(host: &mut H, op: &str, args: &[Value]) -> WhiskerResult<Value> {
    match op {
        "current" => Ok(host.passage_current().map(passage_table).unwrap_or(Value::Nil)),
        "get" => Ok(host.passage_get(&arg_str(args, 0)).map(passage_table).unwrap_or(Value::Nil)),
        "go" => {
            host.passage_go(&arg_str(args, 0))?;
            Ok(Value::Nil)
        }
        "exists" => Ok(Value::Bool(host.passage_exists(&arg_str(args, 0)))),
        "all" => Ok(table_of(host.passage_all().into_iter().map(passage_table).collect())),
        "tags" => Ok(table_of(
            host.passage_tags(&arg_str(args, 0)).into_iter().map(passage_table).collect(),
        )),
        other => Err(WhiskerError::NameError(format!("whisker.passage.{other}: unknown operation"))),
    }
}

fn history_dispatch<H: Host>(host: &mut H, op: &str, args: &[Value]) -> WhiskerResult<Value> {
    let _ = args;
    match op {
        "back" => Ok(Value::Bool(host.history_back())),
        "canBack" => Ok(Value::Bool(host.history_can_back())),
        "list" => Ok(strings_to_values(host.history_list())),
        "count" => Ok(Value::Num(host.history_count() as f64)),
        "contains" => Ok(Value::Bool(host.history_contains(&arg_str(args, 0)))),
        "clear" => {
            host.history_clear();
            Ok(Value::Nil)
        }
        other => Err(WhiskerError::NameError(format!("whisker.history.{other}: unknown operation"))),
    }
}

fn choice_table(c: &Choice) -> Value {
    let t = crate::value::Table::new();
    let out = Value::table(t);
    if let Value::Table(t) = &out {
        let mut t = t.borrow_mut();
        t.set("text", Value::str(c.text.clone()));
        t.set("target", c.target.clone().map(Value::str).unwrap_or(Value::Nil));
    }
    out
}

fn choice_dispatch<H: Host>(host: &mut H, op: &str, args: &[Value]) -> WhiskerResult<Value> {
    match op {
        "available" => Ok(table_of(host.choice_available().iter().map(choice_table).collect())),
        "select" => {
            host.choice_select(arg_i64(args, 0)? as usize)?;
            Ok(Value::Nil)
        }
        "count" => Ok(Value::Num(host.choice_count() as f64)),
        other => Err(WhiskerError::NameError(format!("whisker.choice.{other}: unknown operation"))),
    }
}

fn hook_dispatch<H: Host>(host: &mut H, op: &str, args: &[Value]) -> WhiskerResult<Value> {
    match op {
        "exists" => Ok(Value::Bool(host.hook_exists(&arg_str(args, 0)))),
        "visible" => Ok(Value::Bool(host.hook_visible(&arg_str(args, 0))?)),
        "hidden" => Ok(Value::Bool(host.hook_hidden(&arg_str(args, 0))?)),
        "get" => Ok(Value::str(host.hook_get(&arg_str(args, 0))?)),
        "contains" => Ok(Value::Bool(host.hook_contains(&arg_str(args, 0), &arg_str(args, 1))?)),
        "number" => Ok(Value::Num(host.hook_number() as f64)),
        "replace" => {
            host.hook_replace(&arg_str(args, 0), arg_str(args, 1))?;
            Ok(Value::Nil)
        }
        "append" => {
            host.hook_append(&arg_str(args, 0), &arg_str(args, 1))?;
            Ok(Value::Nil)
        }
        "prepend" => {
            host.hook_prepend(&arg_str(args, 0), &arg_str(args, 1))?;
            Ok(Value::Nil)
        }
        "show" => {
            host.hook_show(&arg_str(args, 0))?;
            Ok(Value::Nil)
        }
        "hide" => {
            host.hook_hide(&arg_str(args, 0))?;
            Ok(Value::Nil)
        }
        other => Err(WhiskerError::NameError(format!("whisker.hook.{other}: unknown operation"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::ListValue;
    use crate::runtime::InMemoryRuntime;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn state_get_set_round_trips_through_dispatch() {
        let mut host = InMemoryRuntime::new();
        dispatch(&mut host, &path(&["state", "set"]), &[Value::str("gold"), Value::Num(10.0)]).unwrap();
        let got = dispatch(&mut host, &path(&["state", "get"]), &[Value::str("gold")]).unwrap();
        assert_eq!(got.as_num(), Some(10.0));
    }

    #[test]
    fn unknown_namespace_is_a_name_error() {
        let mut host = InMemoryRuntime::new();
        let err = dispatch(&mut host, &path(&["bogus"]), &[]);
        assert!(matches!(err, Err(WhiskerError::NameError(_))));
    }

    #[test]
    fn random_dispatch_stays_within_bounds() {
        let mut host = InMemoryRuntime::new();
        for _ in 0..20 {
            let v = dispatch(&mut host, &path(&["random"]), &[Value::Num(1.0), Value::Num(6.0)]).unwrap();
            let n = v.as_num().unwrap();
            assert!((1.0..=6.0).contains(&n));
        }
    }

    #[test]
    fn pick_rejects_empty_option_list() {
        let mut host = InMemoryRuntime::new();
        let err = dispatch(&mut host, &path(&["pick"]), &[]);
        assert!(err.is_err());
    }

    #[test]
    fn get_list_dispatches_to_values_and_active() {
        let mut host = InMemoryRuntime::new();
        let mut list = ListValue::new("mood", vec!["happy".into(), "sad".into(), "angry".into()]);
        list.enter("happy", &mut crate::runtime::StderrSink).unwrap();
        host.set_list("mood", list);

        let got = dispatch(&mut host, &path(&["state", "getList"]), &[Value::str("mood")]).unwrap();
        let Value::Table(t) = got else { panic!("expected a table") };
        let Value::Table(active) = t.borrow().get("active") else { panic!("expected a table") };
        assert_eq!(value::to_string(&active.borrow().get("1")), "happy");
    }

    #[test]
    fn get_array_and_get_map_dispatch_return_the_stored_table() {
        let mut host = InMemoryRuntime::new();
        host.set_array("inventory", vec![Value::str("torch"), Value::str("rope")]);
        host.set_map("flags");
        host.map_set("flags", "seen_intro", Value::Bool(true)).unwrap();

        let arr = dispatch(&mut host, &path(&["state", "getArray"]), &[Value::str("inventory")]).unwrap();
        assert!(matches!(arr, Value::Table(_)));

        let map = dispatch(&mut host, &path(&["state", "getMap"]), &[Value::str("flags")]).unwrap();
        let Value::Table(t) = map else { panic!("expected a table") };
        assert!(matches!(t.borrow().get("seen_intro"), Value::Bool(true)));
    }

    #[test]
    fn get_array_on_missing_key_is_nil() {
        let mut host = InMemoryRuntime::new();
        let got = dispatch(&mut host, &path(&["state", "getArray"]), &[Value::str("missing")]).unwrap();
        assert!(matches!(got, Value::Nil));
    }
}
