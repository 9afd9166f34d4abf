//! Resource declaration macros

#[macro_use]
pub mod macros;
