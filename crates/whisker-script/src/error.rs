//! Error taxonomy for the Whisker scripting runtime.
//!
//! Mirrors the teacher's lightweight-tag + hand-written `Display` shape
//! instead of reaching for `thiserror`: each variant carries exactly the
//! context a caller needs to report the failure, nothing more.

use std::fmt;

/// Every error kind the runtime can raise, per spec §7.
#[derive(Debug, Clone, PartialEq)]
pub enum WhiskerError {
    /// Malformed block, unrecognized statement, unparseable expression.
    Syntax(String),
    /// Unknown function or non-existent collection namespace.
    NameError(String),
    /// Arithmetic/comparison/length on incompatible value kinds.
    TypeMismatch(String),
    /// Host-API operation invoked with the wrong argument type.
    ArgumentType(String),
    /// AST path only: `/` or `%` with a zero right operand.
    DivisionByZero(String),
    /// AST evaluator call-stack cap exceeded.
    CallDepthExceeded { depth: usize, limit: usize },
    /// String interpreter loop cap exceeded.
    IterationCapExceeded { limit: usize },
    /// Module resolver: include cycle detected.
    CircularInclude { chain: Vec<String> },
    /// Module resolver: include-stack depth cap exceeded.
    IncludeDepthExceeded { limit: usize },
    /// LIST mutator invoked while locked (reported, not fatal; see `list`).
    LockedMutation(String),
    /// `choice.select` with an out-of-range or unavailable index.
    ChoiceIndex(String),
    /// `passage.go`/`passage.get` referencing an unknown passage id.
    PassageNotFound(String),
    /// LIST operation referencing a state name that violates the set's
    /// `allow_undefined_states` invariant.
    StateNameMismatch(String),
}

impl fmt::Display for WhiskerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhiskerError::Syntax(msg) => write!(f, "syntax error: {msg}"),
            WhiskerError::NameError(msg) => write!(f, "name error: {msg}"),
            WhiskerError::TypeMismatch(msg) => write!(f, "type mismatch: {msg}"),
            WhiskerError::ArgumentType(msg) => write!(f, "argument type error: {msg}"),
            WhiskerError::DivisionByZero(msg) => write!(f, "division by zero: {msg}"),
            WhiskerError::CallDepthExceeded { depth, limit } => {
                write!(f, "call depth {depth} exceeds limit {limit}")
            }
            WhiskerError::IterationCapExceeded { limit } => {
                write!(f, "loop exceeded iteration cap of {limit}")
            }
            WhiskerError::CircularInclude { chain } => {
                write!(f, "circular include: {}", chain.join(", "))
            }
            WhiskerError::IncludeDepthExceeded { limit } => {
                write!(f, "include depth exceeds limit {limit}")
            }
            WhiskerError::LockedMutation(msg) => write!(f, "locked mutation skipped: {msg}"),
            WhiskerError::ChoiceIndex(msg) => write!(f, "invalid choice index: {msg}"),
            WhiskerError::PassageNotFound(msg) => write!(f, "passage not found: {msg}"),
            WhiskerError::StateNameMismatch(msg) => write!(f, "state name mismatch: {msg}"),
        }
    }
}

impl std::error::Error for WhiskerError {}

pub type WhiskerResult<T> = Result<T, WhiskerError>;
