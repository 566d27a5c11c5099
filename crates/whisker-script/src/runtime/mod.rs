//! The InMemory runtime context (spec §4.11): the reference implementation
//! of the host-owned story session backing the `whisker.*` API.

use std::collections::VecDeque;

use ahash::AHashMap;

use crate::error::{WhiskerError, WhiskerResult};
use crate::host::{Choice, ChoiceApi, Hook, HookApi, Host, HistoryApi, Passage, PassageApi, StateApi};
use crate::list::{ListValue, WarningSink};
use crate::value::{Table, Value};

/// Discards LIST callback warnings by writing them to the process's
/// standard error, the simplest sink that still surfaces failures during
/// interactive development.
pub struct StderrSink;
impl WarningSink for StderrSink {
    fn warn(&mut self, message: &str) {
        eprintln!("warning: {message}");
    }
}

pub struct InMemoryRuntime {
    variables: AHashMap<String, Value>,
    lists: AHashMap<String, ListValue>,
    passages: AHashMap<String, Passage>,
    current_passage: Option<String>,
    visit_counts: AHashMap<String, i64>,
    history: VecDeque<String>,
    choices: Vec<Choice>,
    hooks: AHashMap<String, Hook>,
    rng_state: u64,
}

impl Default for InMemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRuntime {
    pub fn new() -> Self {
        InMemoryRuntime {
            variables: AHashMap::new(),
            lists: AHashMap::new(),
            passages: AHashMap::new(),
            current_passage: None,
            visit_counts: AHashMap::new(),
            history: VecDeque::new(),
            choices: Vec::new(),
            hooks: AHashMap::new(),
            rng_state: 0x9E37_79B9_7F4A_7C15,
        }
    }

    pub fn add_passage(&mut self, passage: Passage) {
        self.passages.insert(passage.id.clone(), passage);
    }

    pub fn set_choices(&mut self, choices: Vec<Choice>) {
        self.choices = choices;
    }

    pub fn set_hook(&mut self, name: impl Into<String>, hook: Hook) {
        self.hooks.insert(name.into(), hook);
    }

    fn next_random(&mut self) -> f64 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11) as f64 / (1u64 << 53) as f64
    }

    fn list_mut(&mut self, key: &str) -> WhiskerResult<&mut ListValue> {
        self.lists
            .get_mut(key)
            .ok_or_else(|| WhiskerError::NameError(format!("no such list: {key}")))
    }

    fn list_ref(&self, key: &str) -> WhiskerResult<&ListValue> {
        self.lists
            .get(key)
            .ok_or_else(|| WhiskerError::NameError(format!("no such list: {key}")))
    }

}

impl StateApi for InMemoryRuntime {
    fn state_get(&self, key: &str) -> Option<Value> {
        self.variables.get(key).cloned()
    }

    fn state_set(&mut self, key: &str, value: Value) {
        self.variables.insert(key.to_string(), value);
    }

    fn state_has(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    fn state_delete(&mut self, key: &str) {
        self.variables.remove(key);
    }

    fn state_all(&self) -> Table {
        let mut t = Table::new();
        for key in self.variables.keys() {
            t.set(key.clone(), self.variables.get(key).cloned().unwrap());
        }
        t
    }

    fn state_reset(&mut self) {
        self.variables.clear();
        self.lists.clear();
    }

    fn set_list(&mut self, key: &str, list: ListValue) {
        self.lists.insert(key.to_string(), list);
    }

    fn get_list(&self, key: &str) -> Option<&ListValue> {
        self.lists.get(key)
    }

    fn get_list_mut(&mut self, key: &str) -> Option<&mut ListValue> {
        self.lists.get_mut(key)
    }

    fn list_values(&self, key: &str) -> WhiskerResult<Vec<String>> {
        Ok(self.list_ref(key)?.possible_values().to_vec())
    }

    fn list_active(&self, key: &str) -> WhiskerResult<Vec<String>> {
        Ok(self.list_ref(key)?.active_values().to_vec())
    }

    fn list_contains(&self, key: &str, state: &str) -> WhiskerResult<bool> {
        Ok(self.list_ref(key)?.contains(state))
    }

    fn list_add(&mut self, key: &str, state: &str) -> WhiskerResult<()> {
        let mut sink = StderrSink;
        self.list_mut(key)?.add(state, &mut sink)
    }

    fn list_remove(&mut self, key: &str, state: &str) -> WhiskerResult<()> {
        let mut sink = StderrSink;
        self.list_mut(key)?.remove(state, &mut sink)
    }

    fn list_toggle(&mut self, key: &str, state: &str) -> WhiskerResult<()> {
        let mut sink = StderrSink;
        self.list_mut(key)?.toggle(state, &mut sink)
    }

    fn list_count(&self, key: &str) -> WhiskerResult<usize> {
        Ok(self.list_ref(key)?.count())
    }

    fn set_array(&mut self, key: &str, values: Vec<Value>) {
        let mut t = Table::new();
        for v in values {
            t.push_array(v);
        }
        self.variables.insert(key.to_string(), Value::table(t));
    }

    fn get_array(&self, key: &str) -> Option<Value> {
        match self.variables.get(key) {
            Some(v @ Value::Table(_)) => Some(v.clone()),
            _ => None,
        }
    }

    fn array_get(&self, key: &str, index: i64) -> WhiskerResult<Value> {
        let t = self.require_array(key)?;
        Ok(t.borrow().get(&index.to_string()))
    }

    fn array_set(&mut self, key: &str, index: i64, value: Value) -> WhiskerResult<()> {
        let t = self.require_array(key)?;
        t.borrow_mut().set(index.to_string(), value);
        Ok(())
    }

    fn array_length(&self, key: &str) -> WhiskerResult<i64> {
        Ok(self.require_array(key)?.borrow().length())
    }

    fn array_push(&mut self, key: &str, value: Value) -> WhiskerResult<()> {
        let t = self.require_array(key)?;
        t.borrow_mut().push_array(value);
        Ok(())
    }

    fn array_pop(&mut self, key: &str) -> WhiskerResult<Value> {
        let t = self.require_array(key)?;
        let len = t.borrow().length();
        if len == 0 {
            return Ok(Value::Nil);
        }
        let v = t.borrow().get(&len.to_string());
        t.borrow_mut().set(len.to_string(), Value::Nil);
        Ok(v)
    }

    fn array_insert(&mut self, key: &str, index: i64, value: Value) -> WhiskerResult<()> {
        let t = self.require_array(key)?;
        let len = t.borrow().length();
        let mut i = len + 1;
        while i > index {
            let prev = t.borrow().get(&(i - 1).to_string());
            t.borrow_mut().set(i.to_string(), prev);
            i -= 1;
        }
        t.borrow_mut().set(index.to_string(), value);
        Ok(())
    }

    fn array_remove(&mut self, key: &str, index: i64) -> WhiskerResult<Value> {
        let t = self.require_array(key)?;
        let len = t.borrow().length();
        let removed = t.borrow().get(&index.to_string());
        let mut i = index;
        while i < len {
            let next = t.borrow().get(&(i + 1).to_string());
            t.borrow_mut().set(i.to_string(), next);
            i += 1;
        }
        t.borrow_mut().set(len.to_string(), Value::Nil);
        Ok(removed)
    }

    fn array_contains(&self, key: &str, value: &Value) -> WhiskerResult<bool> {
        let t = self.require_array(key)?;
        Ok(t.borrow().array_part().iter().any(|(_, v)| v == value))
    }

    fn array_index_of(&self, key: &str, value: &Value) -> WhiskerResult<i64> {
        let t = self.require_array(key)?;
        Ok(t.borrow()
            .array_part()
            .iter()
            .find(|(_, v)| v == value)
            .map(|(i, _)| *i)
            .unwrap_or(-1))
    }

    fn set_map(&mut self, key: &str) {
        self.variables.insert(key.to_string(), Value::new_table());
    }

    fn get_map(&self, key: &str) -> Option<Value> {
        self.get_array(key)
    }

    fn map_get(&self, key: &str, field: &str) -> WhiskerResult<Value> {
        Ok(self.require_array(key)?.borrow().get(field))
    }

    fn map_set(&mut self, key: &str, field: &str, value: Value) -> WhiskerResult<()> {
        self.require_array(key)?.borrow_mut().set(field.to_string(), value);
        Ok(())
    }

    fn map_has(&self, key: &str, field: &str) -> WhiskerResult<bool> {
        Ok(self.require_array(key)?.borrow().contains(field))
    }

    fn map_delete(&mut self, key: &str, field: &str) -> WhiskerResult<()> {
        self.require_array(key)?.borrow_mut().set(field.to_string(), Value::Nil);
        Ok(())
    }

    fn map_keys(&self, key: &str) -> WhiskerResult<Vec<String>> {
        Ok(self.require_array(key)?.borrow().ordered_keys().to_vec())
    }

    fn map_values(&self, key: &str) -> WhiskerResult<Vec<Value>> {
        let t = self.require_array(key)?;
        let t = t.borrow();
        Ok(t.ordered_keys().iter().map(|k| t.get(k)).collect())
    }

    fn map_size(&self, key: &str) -> WhiskerResult<usize> {
        Ok(self.require_array(key)?.borrow().ordered_keys().len())
    }
}

impl InMemoryRuntime {
    fn require_array(&self, key: &str) -> WhiskerResult<std::rc::Rc<std::cell::RefCell<Table>>> {
        match self.variables.get(key) {
            Some(Value::Table(t)) => Ok(std::rc::Rc::clone(t)),
            _ => Err(WhiskerError::ArgumentType(format!("'{key}' is not an array/map"))),
        }
    }
}

impl PassageApi for InMemoryRuntime {
    fn passage_current(&self) -> Option<&Passage> {
        self.current_passage.as_ref().and_then(|id| self.passages.get(id))
    }

    fn passage_get(&self, id: &str) -> Option<&Passage> {
        self.passages.get(id)
    }

    fn passage_go(&mut self, id: &str) -> WhiskerResult<()> {
        if !self.passages.contains_key(id) {
            return Err(WhiskerError::PassageNotFound(id.to_string()));
        }
        if let Some(prev) = self.current_passage.take() {
            self.history.push_back(prev);
        }
        self.current_passage = Some(id.to_string());
        *self.visit_counts.entry(id.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn passage_exists(&self, id: &str) -> bool {
        self.passages.contains_key(id)
    }

    fn passage_all(&self) -> Vec<&Passage> {
        self.passages.values().collect()
    }

    fn passage_tags(&self, tag: &str) -> Vec<&Passage> {
        self.passages.values().filter(|p| p.tags.iter().any(|t| t == tag)).collect()
    }
}

impl HistoryApi for InMemoryRuntime {
    fn history_back(&mut self) -> bool {
        match self.history.pop_back() {
            Some(id) => {
                self.current_passage = Some(id);
                true
            }
            None => false,
        }
    }

    fn history_can_back(&self) -> bool {
        !self.history.is_empty()
    }

    fn history_list(&self) -> Vec<String> {
        self.history.iter().cloned().collect()
    }

    fn history_count(&self) -> usize {
        self.history.len()
    }

    fn history_contains(&self, id: &str) -> bool {
        self.history.iter().any(|h| h == id)
    }

    fn history_clear(&mut self) {
        self.history.clear();
    }
}

impl ChoiceApi for InMemoryRuntime {
    fn choice_available(&self) -> Vec<Choice> {
        self.choices.clone()
    }

    fn choice_select(&mut self, index: usize) -> WhiskerResult<()> {
        let choice = self
            .choices
            .get(index.wrapping_sub(1))
            .cloned()
            .ok_or_else(|| WhiskerError::ChoiceIndex(format!("no such choice: {index}")))?;
        if let Some(target) = choice.target {
            self.passage_go(&target)?;
        }
        Ok(())
    }

    fn choice_count(&self) -> usize {
        self.choices.len()
    }
}

impl HookApi for InMemoryRuntime {
    fn hook_exists(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    fn hook_visible(&self, name: &str) -> WhiskerResult<bool> {
        self.hooks
            .get(name)
            .map(|h| h.visible)
            .ok_or_else(|| WhiskerError::ArgumentType(format!("no such hook: {name}")))
    }

    fn hook_get(&self, name: &str) -> WhiskerResult<String> {
        self.hooks
            .get(name)
            .map(|h| h.content.clone())
            .ok_or_else(|| WhiskerError::ArgumentType(format!("no such hook: {name}")))
    }

    fn hook_number(&self) -> usize {
        self.hooks.len()
    }

    fn hook_replace(&mut self, name: &str, content: String) -> WhiskerResult<()> {
        self.hooks
            .get_mut(name)
            .map(|h| h.content = content)
            .ok_or_else(|| WhiskerError::ArgumentType(format!("no such hook: {name}")))
    }

    fn hook_append(&mut self, name: &str, content: &str) -> WhiskerResult<()> {
        self.hooks
            .get_mut(name)
            .map(|h| h.content.push_str(content))
            .ok_or_else(|| WhiskerError::ArgumentType(format!("no such hook: {name}")))
    }

    fn hook_prepend(&mut self, name: &str, content: &str) -> WhiskerResult<()> {
        self.hooks
            .get_mut(name)
            .map(|h| h.content = format!("{content}{}", h.content))
            .ok_or_else(|| WhiskerError::ArgumentType(format!("no such hook: {name}")))
    }

    fn hook_show(&mut self, name: &str) -> WhiskerResult<()> {
        self.hooks
            .get_mut(name)
            .map(|h| h.visible = true)
            .ok_or_else(|| WhiskerError::ArgumentType(format!("no such hook: {name}")))
    }

    fn hook_hide(&mut self, name: &str) -> WhiskerResult<()> {
        self.hooks
            .get_mut(name)
            .map(|h| h.visible = false)
            .ok_or_else(|| WhiskerError::ArgumentType(format!("no such hook: {name}")))
    }
}

impl Host for InMemoryRuntime {
    fn visited(&self, id: Option<&str>) -> i64 {
        let id = id.map(str::to_string).or_else(|| self.current_passage.clone());
        id.and_then(|id| self.visit_counts.get(&id).copied()).unwrap_or(0)
    }

    fn random(&mut self, min: i64, max: i64) -> i64 {
        let r = self.next_random();
        min + (r * (max - min + 1) as f64) as i64
    }

    fn pick(&mut self, options: &[Value]) -> WhiskerResult<Value> {
        if options.is_empty() {
            return Err(WhiskerError::ArgumentType("pick requires at least one option".to_string()));
        }
        let idx = self.random(0, options.len() as i64 - 1) as usize;
        Ok(options[idx].clone())
    }

    fn print(&mut self, parts: &[Value]) {
        let line = parts
            .iter()
            .map(crate::value::to_string)
            .collect::<Vec<_>>()
            .join("\t");
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str) -> Passage {
        Passage {
            id: id.to_string(),
            content: format!("content of {id}"),
            tags: Vec::new(),
            metadata: Table::new(),
        }
    }

    #[test]
    fn go_to_unknown_passage_fails_before_touching_history() {
        let mut rt = InMemoryRuntime::new();
        rt.add_passage(passage("start"));
        rt.passage_go("start").unwrap();
        let err = rt.passage_go("nowhere");
        assert!(err.is_err());
        assert_eq!(rt.history_count(), 0);
        assert_eq!(rt.passage_current().unwrap().id, "start");
    }

    #[test]
    fn passage_go_pushes_history_and_counts_visits() {
        let mut rt = InMemoryRuntime::new();
        rt.add_passage(passage("a"));
        rt.add_passage(passage("b"));
        rt.passage_go("a").unwrap();
        rt.passage_go("b").unwrap();
        assert_eq!(rt.history_list(), vec!["a".to_string()]);
        assert_eq!(rt.visited(Some("a")), 1);
        assert!(rt.history_back());
        assert_eq!(rt.passage_current().unwrap().id, "a");
    }

    #[test]
    fn choice_select_validates_bounds_before_navigating() {
        let mut rt = InMemoryRuntime::new();
        rt.add_passage(passage("start"));
        rt.add_passage(passage("target"));
        rt.passage_go("start").unwrap();
        rt.set_choices(vec![Choice { text: "go".to_string(), target: Some("target".to_string()) }]);
        assert!(rt.choice_select(0).is_err());
        assert_eq!(rt.passage_current().unwrap().id, "start");
        rt.choice_select(1).unwrap();
        assert_eq!(rt.passage_current().unwrap().id, "target");
    }

    #[test]
    fn array_push_pop_and_index_of_round_trip() {
        let mut rt = InMemoryRuntime::new();
        rt.set_array("inventory", vec![Value::str("sword")]);
        rt.array_push("inventory", Value::str("shield")).unwrap();
        assert_eq!(rt.array_length("inventory").unwrap(), 2);
        assert_eq!(rt.array_index_of("inventory", &Value::str("shield")).unwrap(), 2);
        let popped = rt.array_pop("inventory").unwrap();
        assert_eq!(popped.as_str(), Some("shield"));
        assert_eq!(rt.array_length("inventory").unwrap(), 1);
    }

    #[test]
    fn map_set_get_and_delete() {
        let mut rt = InMemoryRuntime::new();
        rt.set_map("stats");
        rt.map_set("stats", "strength", Value::Num(10.0)).unwrap();
        assert_eq!(rt.map_get("stats", "strength").unwrap().as_num(), Some(10.0));
        assert!(rt.map_has("stats", "strength").unwrap());
        rt.map_delete("stats", "strength").unwrap();
        assert!(!rt.map_has("stats", "strength").unwrap());
    }

    #[test]
    fn list_add_and_remove_through_state_api() {
        let mut rt = InMemoryRuntime::new();
        rt.set_list("mood", ListValue::new("mood", vec!["happy".to_string(), "sad".to_string()]));
        rt.list_add("mood", "happy").unwrap();
        assert!(rt.list_contains("mood", "happy").unwrap());
        rt.list_remove("mood", "happy").unwrap();
        assert!(!rt.list_contains("mood", "happy").unwrap());
    }
}
