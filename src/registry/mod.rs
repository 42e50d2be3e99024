//! Entity registry (verb module)
//!
//! Holds the typed handles every relation and plugin reads from. Entities are
//! registered once at configuration-load time and never mutated afterwards.

mod entity;
mod error;

pub use entity::{Entity, EntityHandle, EntityRegistry};
pub use error::RegistryError;
