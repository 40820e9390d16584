//! Reference expansion and expression generation for monitoring rules.
//!
//! Rule authors write conditions and actions such as
//!
//! ```text
//! if:     ${value['available']} < 100
//! action: test.echo "${value['available']} too low"
//! ```
//!
//! and [`template`] rewrites them into expressions for a rule executor:
//!
//! ```rust
//! let lines = rulegen::expand_conditional(
//!     "${value['available']} < 100",
//!     &["test.echo \"${value['available']} too low\""],
//! )
//! .unwrap();
//! assert_eq!(lines, vec![
//!     "if value['available'] < 100:",
//!     "    _run('test.echo', ['{} too low'.format(value['available'])])",
//! ]);
//! ```
//!
//! The same expression trees can be run directly with [`runtime::Evaluator`].

pub mod cli;
pub mod config;
pub mod error;
pub mod runtime;
pub mod template;

pub use error::{ExpandError, ReferenceFault};
pub use template::{expand_call, expand_conditional, expand_references, Expander};
