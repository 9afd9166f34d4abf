//! Filter expressions: text, tree and compiled predicate
//!
//! ```rust,ignore
//! let tree = filter::parse(r#"age >= 18 && status == "active""#)?;
//! let predicate = filter::compile(tree.as_ref(), Person::schema())?;
//! ```

pub mod ast;
pub mod compiler;
pub mod parser;
pub mod predicate;

pub use ast::{ComparisonOp, FilterExpr, Literal, LogicalOp};
pub use compiler::compile;
pub use parser::parse;
pub use predicate::{CompareOp, Predicate};

/// Deepest group or negation nesting accepted in a filter
pub const MAX_DEPTH: usize = 64;
