//! Core types, values, and utilities for the observability stack expander.
//!
//! This crate provides the foundational types used across all other obstack crates:
//! - The recursive [`Value`] tree and its deep-merge rules
//! - The input [`StackSpec`] and its defaulted form
//! - The fixed set of stack components
//! - Output resource types
//! - Error types

pub mod component;
pub mod constants;
pub mod errors;
pub mod resource;
pub mod spec;
pub mod value;

pub use component::*;
pub use errors::*;
pub use resource::*;
pub use spec::*;
pub use value::*;
