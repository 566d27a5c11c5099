//! `whisker.state` (spec §4.8): scalar variables plus the list/array/map
//! collection extensions, all addressed by string key.

use crate::error::WhiskerResult;
use crate::list::ListValue;
use crate::value::{Table, Value};

pub trait StateApi {
    fn state_get(&self, key: &str) -> Option<Value>;
    fn state_set(&mut self, key: &str, value: Value);
    fn state_has(&self, key: &str) -> bool;
    fn state_delete(&mut self, key: &str);
    fn state_all(&self) -> Table;
    fn state_reset(&mut self);

    fn set_list(&mut self, key: &str, list: ListValue);
    fn get_list(&self, key: &str) -> Option<&ListValue>;
    fn get_list_mut(&mut self, key: &str) -> Option<&mut ListValue>;
    fn has_list(&self, key: &str) -> bool {
        self.get_list(key).is_some()
    }
    fn list_values(&self, key: &str) -> WhiskerResult<Vec<String>>;
    fn list_active(&self, key: &str) -> WhiskerResult<Vec<String>>;
    fn list_contains(&self, key: &str, state: &str) -> WhiskerResult<bool>;
    fn list_add(&mut self, key: &str, state: &str) -> WhiskerResult<()>;
    fn list_remove(&mut self, key: &str, state: &str) -> WhiskerResult<()>;
    fn list_toggle(&mut self, key: &str, state: &str) -> WhiskerResult<()>;
    fn list_count(&self, key: &str) -> WhiskerResult<usize>;

    fn set_array(&mut self, key: &str, values: Vec<Value>);
    fn get_array(&self, key: &str) -> Option<Value>;
    fn has_array(&self, key: &str) -> bool {
        self.get_array(key).is_some()
    }
    fn array_get(&self, key: &str, index: i64) -> WhiskerResult<Value>;
    fn array_set(&mut self, key: &str, index: i64, value: Value) -> WhiskerResult<()>;
    fn array_length(&self, key: &str) -> WhiskerResult<i64>;
    fn array_push(&mut self, key: &str, value: Value) -> WhiskerResult<()>;
    fn array_pop(&mut self, key: &str) -> WhiskerResult<Value>;
    fn array_insert(&mut self, key: &str, index: i64, value: Value) -> WhiskerResult<()>;
    fn array_remove(&mut self, key: &str, index: i64) -> WhiskerResult<Value>;
    fn array_contains(&self, key: &str, value: &Value) -> WhiskerResult<bool>;
    fn array_index_of(&self, key: &str, value: &Value) -> WhiskerResult<i64>;

    fn set_map(&mut self, key: &str);
    fn get_map(&self, key: &str) -> Option<Value>;
    fn has_map(&self, key: &str) -> bool {
        self.get_map(key).is_some()
    }
    fn map_get(&self, key: &str, field: &str) -> WhiskerResult<Value>;
    fn map_set(&mut self, key: &str, field: &str, value: Value) -> WhiskerResult<()>;
    fn map_has(&self, key: &str, field: &str) -> WhiskerResult<bool>;
    fn map_delete(&mut self, key: &str, field: &str) -> WhiskerResult<()>;
    fn map_keys(&self, key: &str) -> WhiskerResult<Vec<String>>;
    fn map_values(&self, key: &str) -> WhiskerResult<Vec<Value>>;
    fn map_size(&self, key: &str) -> WhiskerResult<usize>;
}
