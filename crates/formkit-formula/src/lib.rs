//! Formula engine for derived fields.
//!
//! A derived field's formula is a small JavaScript-flavoured expression. Parent
//! field ids are replaced textually by the JSON form of their current values,
//! and the resulting text is evaluated by a constrained interpreter that only
//! knows a fixed set of utilities (`Math`, `Date`, `currentYear`, `today` and
//! a handful of conversion functions). Nothing is ever handed to a host
//! evaluator.

pub mod clock;
pub mod derived;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod substitute;
pub mod value;

pub use clock::{Clock, FixedClock, SystemClock};
pub use derived::{DerivedValue, FORMULA_ERROR_SENTINEL, compute_derived, recompute};
pub use error::{FormulaError, Result};
pub use eval::evaluate;
pub use value::Value;

/// Longest formula text accepted, in bytes.
pub const MAX_FORMULA_LEN: usize = 4096;

/// Deepest expression nesting the parser accepts.
pub const MAX_DEPTH: usize = 64;
