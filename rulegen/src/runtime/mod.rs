//! Evaluation of expanded rules.
//!
//! The expanders in [`crate::template`] produce expression trees; this
//! module runs them.  Everything the evaluator needs from the outside world
//! is passed in explicitly: live values through an [`EvalContext`] and rule
//! functions through a [`FunctionTable`].

pub mod eval;
pub mod value;

pub use eval::{fill_template, EvalContext, EvalError, Evaluator, FunctionTable};
pub use value::Value;
