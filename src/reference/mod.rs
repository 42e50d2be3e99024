//! Reference resolver (verb module)
//!
//! Chain steps read earlier outputs through `@key.path` strings. A reference
//! is parsed into a root key and a path, then evaluated against the
//! [`ChainContext`] of the running chain. Only whole-string values are
//! references; `@@text` stands for the literal string `@text`.

mod context;
mod error;
mod expr;

pub use context::ChainContext;
pub use error::ReferenceError;
pub use expr::{resolve, substitute, Reference};
pub(crate) use expr::substitute_object;
