//! `whisker.hook` (spec §4.8): named, togglable text fragments.

use crate::error::WhiskerResult;

#[derive(Debug, Clone)]
pub struct Hook {
    pub content: String,
    pub visible: bool,
}

pub trait HookApi {
    fn hook_exists(&self, name: &str) -> bool;
    fn hook_visible(&self, name: &str) -> WhiskerResult<bool>;
    fn hook_hidden(&self, name: &str) -> WhiskerResult<bool> {
        self.hook_visible(name).map(|v| !v)
    }
    fn hook_get(&self, name: &str) -> WhiskerResult<String>;
    fn hook_contains(&self, name: &str, needle: &str) -> WhiskerResult<bool> {
        self.hook_get(name).map(|c| c.contains(needle))
    }
    fn hook_number(&self) -> usize;
    fn hook_replace(&mut self, name: &str, content: String) -> WhiskerResult<()>;
    fn hook_append(&mut self, name: &str, content: &str) -> WhiskerResult<()>;
    fn hook_prepend(&mut self, name: &str, content: &str) -> WhiskerResult<()>;
    fn hook_show(&mut self, name: &str) -> WhiskerResult<()>;
    fn hook_hide(&mut self, name: &str) -> WhiskerResult<()>;
}
