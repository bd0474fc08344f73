//! Core runtime types
//!
//! This module provides the dynamic value types shared by the REPL loop,
//! the renderer and the bundled script evaluator.

pub mod array;
pub mod runtime_value;

pub use array::{Array, ArrayKey};
pub use runtime_value::*;

#[cfg(test)]
mod tests;
