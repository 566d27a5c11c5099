//! The LIST state machine (spec §3 `ListValue`, §4.9): a possible-values set
//! with an active subset, enter/exit callbacks, bounded history and a lock.

use std::collections::VecDeque;
use std::rc::Rc;

use ahash::AHashMap;

use crate::error::{WhiskerError, WhiskerResult};

/// A sandboxed transition callback: its error is caught by the caller and
/// reported through a [`WarningSink`], never allowed to abort the
/// transition (spec §4.9 "Callbacks are sandboxed").
pub type Callback = Rc<dyn Fn(&str) -> WhiskerResult<()>>;

#[derive(Default, Clone)]
pub struct Callbacks {
    pub on_enter: Option<Callback>,
    pub on_exit: Option<Callback>,
}

/// Receives warnings for sandboxed callback failures and locked-mutation
/// no-ops; a host wires this to its own logging.
pub trait WarningSink {
    fn warn(&mut self, message: &str);
}

/// A `WarningSink` that discards everything, for callers that don't care.
pub struct NullSink;
impl WarningSink for NullSink {
    fn warn(&mut self, _message: &str) {}
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListState {
    pub possible: Vec<String>,
    pub active: Vec<String>,
    pub history: Vec<String>,
}

pub struct ListValue {
    name: String,
    possible: Vec<String>,
    active: Vec<String>,
    callbacks: AHashMap<String, Callbacks>,
    history: VecDeque<String>,
    history_cap: usize,
    track_history: bool,
    locked: bool,
    allow_undefined_states: bool,
}

impl ListValue {
    pub fn new(name: impl Into<String>, possible: Vec<String>) -> Self {
        ListValue {
            name: name.into(),
            possible,
            active: Vec::new(),
            callbacks: AHashMap::new(),
            history: VecDeque::new(),
            history_cap: 100,
            track_history: true,
            locked: false,
            allow_undefined_states: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allow_undefined_states(&mut self, allow: bool) {
        self.allow_undefined_states = allow;
    }

    pub fn set_history_cap(&mut self, cap: usize) {
        self.history_cap = cap;
        while self.history.len() > cap {
            self.history.pop_front();
        }
    }

    pub fn set_track_history(&mut self, track: bool) {
        self.track_history = track;
    }

    pub fn set_callbacks(&mut self, state: impl Into<String>, callbacks: Callbacks) {
        self.callbacks.insert(state.into(), callbacks);
    }

    fn check_membership(&self, state: &str) -> WhiskerResult<()> {
        if !self.allow_undefined_states && !self.possible.iter().any(|s| s == state) {
            return Err(WhiskerError::StateNameMismatch(format!(
                "'{state}' is not a possible value of list '{}'",
                self.name
            )));
        }
        Ok(())
    }

    fn record_history(&mut self, state: &str) {
        if !self.track_history {
            return;
        }
        self.history.push_back(state.to_string());
        while self.history.len() > self.history_cap {
            self.history.pop_front();
        }
    }

    fn fire(&self, state: &str, which: impl Fn(&Callbacks) -> Option<&Callback>, sink: &mut dyn WarningSink) {
        if let Some(cb) = self.callbacks.get(state).and_then(which)
            && let Err(e) = cb(state)
        {
            sink.warn(&format!("list '{}' callback for '{state}' failed: {e}", self.name));
        }
    }

    /// `add(s)`: no-op if already active or locked; else inserts, fires
    /// `on_enter`, records history.
    pub fn add(&mut self, state: &str, sink: &mut dyn WarningSink) -> WhiskerResult<()> {
        if self.locked {
            sink.warn(&format!("list '{}' is locked; add('{state}') skipped", self.name));
            return Ok(());
        }
        self.check_membership(state)?;
        if self.active.iter().any(|s| s == state) {
            return Ok(());
        }
        self.active.push(state.to_string());
        self.fire(state, |c| c.on_enter.as_ref(), sink);
        self.record_history(state);
        Ok(())
    }

    /// `remove(s)`: inverse of `add`.
    pub fn remove(&mut self, state: &str, sink: &mut dyn WarningSink) -> WhiskerResult<()> {
        if self.locked {
            sink.warn(&format!("list '{}' is locked; remove('{state}') skipped", self.name));
            return Ok(());
        }
        if let Some(pos) = self.active.iter().position(|s| s == state) {
            self.active.remove(pos);
            self.fire(state, |c| c.on_exit.as_ref(), sink);
        }
        Ok(())
    }

    pub fn toggle(&mut self, state: &str, sink: &mut dyn WarningSink) -> WhiskerResult<()> {
        if self.active.iter().any(|s| s == state) {
            self.remove(state, sink)
        } else {
            self.add(state, sink)
        }
    }

    /// `enter(s)` / `transitionTo(s)`: exclusive replacement — exit every
    /// currently-active state (insertion order), clear, insert `s`, enter.
    pub fn enter(&mut self, state: &str, sink: &mut dyn WarningSink) -> WhiskerResult<()> {
        if self.locked {
            sink.warn(&format!("list '{}' is locked; enter('{state}') skipped", self.name));
            return Ok(());
        }
        self.check_membership(state)?;
        let prior: Vec<String> = self.active.drain(..).collect();
        for s in &prior {
            self.fire(s, |c| c.on_exit.as_ref(), sink);
        }
        self.active.push(state.to_string());
        self.fire(state, |c| c.on_enter.as_ref(), sink);
        self.record_history(state);
        Ok(())
    }

    /// `set(states)`: diff against the current active set, firing
    /// `on_exit`/`on_enter` only for the states that actually changed.
    pub fn set(&mut self, states: &[String], sink: &mut dyn WarningSink) -> WhiskerResult<()> {
        if self.locked {
            sink.warn(&format!("list '{}' is locked; set(...) skipped", self.name));
            return Ok(());
        }
        for s in states {
            self.check_membership(s)?;
        }
        let removed: Vec<String> = self
            .active
            .iter()
            .filter(|s| !states.contains(s))
            .cloned()
            .collect();
        let added: Vec<String> = states
            .iter()
            .filter(|s| !self.active.contains(s))
            .cloned()
            .collect();
        for s in &removed {
            self.fire(s, |c| c.on_exit.as_ref(), sink);
        }
        self.active = states.to_vec();
        for s in &added {
            self.fire(s, |c| c.on_enter.as_ref(), sink);
            self.record_history(s);
        }
        Ok(())
    }

    /// `reset()` / `clear()`: empty the active set, firing `on_exit` for
    /// each.
    pub fn clear(&mut self, sink: &mut dyn WarningSink) {
        let prior: Vec<String> = self.active.drain(..).collect();
        for s in &prior {
            self.fire(s, |c| c.on_exit.as_ref(), sink);
        }
    }

    pub fn contains(&self, state: &str) -> bool {
        self.active.iter().any(|s| s == state)
    }

    pub fn is_subset_of(&self, other: &ListValue) -> bool {
        self.active.iter().all(|s| other.contains(s))
    }

    pub fn equals(&self, other: &ListValue) -> bool {
        self.active.len() == other.active.len() && self.is_subset_of(other)
    }

    pub fn count(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn is_any_active(&self, states: &[String]) -> bool {
        states.iter().any(|s| self.contains(s))
    }

    pub fn are_all_active(&self, states: &[String]) -> bool {
        states.iter().all(|s| self.contains(s))
    }

    pub fn active_values(&self) -> &[String] {
        &self.active
    }

    pub fn possible_values(&self) -> &[String] {
        &self.possible
    }

    pub fn get_value(&self) -> Option<&str> {
        self.active.first().map(String::as_str)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Locks, runs `f`, then restores the prior lock state even if `f`
    /// fails (spec §5 "release is guaranteed").
    pub fn with_lock<T>(&mut self, f: impl FnOnce(&mut Self) -> WhiskerResult<T>) -> WhiskerResult<T> {
        let prior = self.locked;
        self.locked = true;
        let result = f(self);
        self.locked = prior;
        result
    }

    pub fn get_state(&self) -> ListState {
        ListState {
            possible: self.possible.clone(),
            active: self.active.clone(),
            history: self.history.iter().cloned().collect(),
        }
    }

    pub fn restore_state(&mut self, state: ListState) {
        self.possible = state.possible;
        self.active = state.active;
        self.history = state.history.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> NullSink {
        NullSink
    }

    #[test]
    fn add_fires_on_enter_once() {
        let calls = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut list = ListValue::new("mood", vec!["happy".into(), "sad".into()]);
        let calls2 = calls.clone();
        list.set_callbacks(
            "happy",
            Callbacks {
                on_enter: Some(Rc::new(move |s| {
                    calls2.borrow_mut().push(s.to_string());
                    Ok(())
                })),
                on_exit: None,
            },
        );
        list.add("happy", &mut sink()).unwrap();
        list.add("happy", &mut sink()).unwrap();
        assert_eq!(*calls.borrow(), vec!["happy".to_string()]);
        assert!(list.contains("happy"));
    }

    #[test]
    fn locked_mutation_is_a_no_op() {
        let mut list = ListValue::new("mood", vec!["happy".into()]);
        list.locked = true;
        list.add("happy", &mut sink()).unwrap();
        assert!(!list.contains("happy"));
    }

    #[test]
    fn with_lock_restores_state_on_error() {
        let mut list = ListValue::new("mood", vec!["happy".into()]);
        let was_locked_before = list.is_locked();
        let result: WhiskerResult<()> = list.with_lock(|_| Err(WhiskerError::Syntax("boom".into())));
        assert!(result.is_err());
        assert_eq!(list.is_locked(), was_locked_before);
    }

    #[test]
    fn enter_replaces_active_set_exclusively() {
        let mut list = ListValue::new("mood", vec!["happy".into(), "sad".into(), "angry".into()]);
        list.add("happy", &mut sink()).unwrap();
        list.enter("sad", &mut sink()).unwrap();
        assert_eq!(list.active_values(), &["sad".to_string()]);
    }

    #[test]
    fn restore_state_round_trips() {
        let mut list = ListValue::new("mood", vec!["happy".into(), "sad".into()]);
        list.add("happy", &mut sink()).unwrap();
        let snapshot = list.get_state();
        list.add("sad", &mut sink()).unwrap();
        list.restore_state(snapshot);
        assert_eq!(list.active_values(), &["happy".to_string()]);
    }

    #[test]
    fn undefined_state_rejected_unless_allowed() {
        let mut list = ListValue::new("mood", vec!["happy".into()]);
        assert!(list.add("furious", &mut sink()).is_err());
        list.allow_undefined_states(true);
        assert!(list.add("furious", &mut sink()).is_ok());
    }
}
