// Formula evaluation: range functions, reference substitution, arithmetic

pub mod eval;
pub mod parser;
pub mod refs;

pub use eval::{evaluate, FormulaResult, ERROR_SENTINEL};
