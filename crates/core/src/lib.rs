//! Core types and traits for gatekv
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: Error type hierarchy
//! - Value: Default dynamically-typed payload
//! - StoreKey / StoreValue: Bounds every key and value type satisfies

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod value;

pub use error::{Error, Result};
pub use traits::{StoreKey, StoreValue};
pub use value::Value;
