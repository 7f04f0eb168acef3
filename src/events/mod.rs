//! Event types and observers.
//!
//! Submodules:
//! - [`levelchange`] – level transition notification and the reset observer
pub mod levelchange;
