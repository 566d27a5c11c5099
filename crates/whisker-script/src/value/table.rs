use ahash::AHashMap;

use super::value::Value;

/// Insertion-ordered string-keyed map (spec §3 Table). Array-style
/// constructors `{a, b, c}` stringify integer keys starting at `"1"`.
#[derive(Default, Clone, Debug)]
pub struct Table {
    order: Vec<String>,
    entries: AHashMap<String, Value>,
    next_array_index: i64,
}

impl Table {
    pub fn new() -> Self {
        Table {
            order: Vec::new(),
            entries: AHashMap::new(),
            next_array_index: 1,
        }
    }

    pub fn get(&self, key: &str) -> Value {
        self.entries.get(key).cloned().unwrap_or(Value::Nil)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// `t[k] = v`. Setting to `Nil` removes the key, matching Lua so that
    /// `#t`/`pairs`/`ipairs` never observe tombstones.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if matches!(value, Value::Nil) {
            if self.entries.remove(&key).is_some() {
                self.order.retain(|k| k != &key);
            }
            return;
        }
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push(key);
        }
    }

    /// Appends using the next sequential integer key, for array constructors
    /// and `table.insert` without a position.
    pub fn push_array(&mut self, value: Value) {
        let key = self.next_array_index.to_string();
        self.next_array_index += 1;
        self.set(key, value);
    }

    /// Spec §3: `#t` is the largest `n` for which `"1".."n"` are all non-nil.
    pub fn length(&self) -> i64 {
        let mut n = 0i64;
        loop {
            if self.contains(&(n + 1).to_string()) {
                n += 1;
            } else {
                break;
            }
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Insertion order, for `pairs`.
    pub fn ordered_keys(&self) -> &[String] {
        &self.order
    }

    /// Consecutive integer keys from 1, for `ipairs`.
    pub fn array_part(&self) -> Vec<(i64, Value)> {
        let mut out = Vec::new();
        let mut i = 1i64;
        loop {
            let key = i.to_string();
            match self.entries.get(&key) {
                Some(v) => {
                    out.push((i, v.clone()));
                    i += 1;
                }
                None => break,
            }
        }
        out
    }

    /// `next(t, k)`: the key following `k` in insertion order, or the first
    /// key if `k` is `None`.
    pub fn next_key(&self, key: Option<&str>) -> Option<(&String, &Value)> {
        let idx = match key {
            None => 0,
            Some(k) => self.order.iter().position(|x| x == k)? + 1,
        };
        let k = self.order.get(idx)?;
        self.entries.get_key_value(k)
    }
}
