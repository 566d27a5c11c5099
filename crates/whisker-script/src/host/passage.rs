//! `whisker.passage` (spec §4.8).

use crate::error::WhiskerResult;
use crate::value::Table;

#[derive(Debug, Clone)]
pub struct Passage {
    pub id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub metadata: Table,
}

pub trait PassageApi {
    fn passage_current(&self) -> Option<&Passage>;
    fn passage_get(&self, id: &str) -> Option<&Passage>;
    /// Navigates to `id`; fails with `PassageNotFound` if unknown. Pushes the
    /// previous current id onto history and increments `id`'s visit count.
    fn passage_go(&mut self, id: &str) -> WhiskerResult<()>;
    fn passage_exists(&self, id: &str) -> bool;
    fn passage_all(&self) -> Vec<&Passage>;
    fn passage_tags(&self, tag: &str) -> Vec<&Passage>;
}
