//! Runtime data
//!
//! Values exchanged between the host program, the session and the evaluator,
//! and the variable scope a session runs against.

pub mod scope;
pub mod value;

pub use scope::{Scope, ScopeSnapshot};
pub use value::{Array, ArrayKey, HostObject, Resource, Value};
