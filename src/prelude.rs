//! Prelude module for shamsi_range crate.
//!
//! Re-exports the derive macros used by the date and error types.

pub use derive_more::Display;
