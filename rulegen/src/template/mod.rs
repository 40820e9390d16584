//! Rule template expansion.
//!
//! Rule conditions and actions refer to runtime values with `$name` or
//! `${expression}`.  This module rewrites that text into expressions for an
//! external evaluator:
//!
//! - [`expand_references`]: one token → bare expression or string expression
//! - [`expand_call`]: `name args…` → `_run('name', [args…])`
//! - [`expand_conditional`]: condition + actions → guarded block lines
//!
//! The free functions use a permissive [`Expander`] with no function table.
//! Build an [`Expander`] explicitly to check call names against known
//! functions.
//!
//! # Quick start
//!
//! ```rust
//! use rulegen::template::{expand_call, expand_references};
//!
//! assert_eq!(expand_references("'v=$v'").unwrap(), "'v={}'.format(v)");
//! assert_eq!(
//!     expand_call("test.echo 'hello, world'").unwrap(),
//!     "_run('test.echo', ['hello, world'])"
//! );
//! ```

pub mod call;
pub mod conditional;
pub mod expr;
pub mod reference;
pub mod scan;

use std::collections::BTreeSet;

use crate::config::Config;
use crate::error::ExpandError;
use crate::runtime::FunctionTable;

pub use expr::{Conditional, Expr};

// ── Expander ──────────────────────────────────────────────────────────────────

/// Template expander with an injected set of known function names.
///
/// With no known names every syntactically valid call is accepted.  With
/// known names, calls to other functions are logged, or rejected when the
/// expander is strict.
#[derive(Debug, Clone, Default)]
pub struct Expander {
    known: BTreeSet<String>,
    strict: bool,
}

impl Expander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expander that knows the functions registered in `table`.
    pub fn with_functions(table: &FunctionTable) -> Self {
        Self {
            known: table.names().map(str::to_owned).collect(),
            strict: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            known: config.functions.clone(),
            strict: config.strict,
        }
    }

    /// Reject calls to unknown functions instead of warning.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Add known function names.
    pub fn know<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn known_functions(&self) -> impl Iterator<Item = &str> {
        self.known.iter().map(String::as_str)
    }

    // ── Typed forms ──────────────────────────────────────────────────────────

    pub fn reference(&self, text: &str) -> Result<Expr, ExpandError> {
        reference::expand(text)
    }

    pub fn call(&self, text: &str) -> Result<Expr, ExpandError> {
        let expr = call::expand(text)?;
        if let Expr::Call { name, .. } = &expr {
            self.check_function(text, name)?;
        }
        Ok(expr)
    }

    pub fn conditional<S: AsRef<str>>(
        &self,
        condition: &str,
        actions: &[S],
    ) -> Result<Conditional, ExpandError> {
        conditional::expand(condition, actions, |a| self.call(a))
    }

    // ── Text forms ───────────────────────────────────────────────────────────

    pub fn expand_references(&self, text: &str) -> Result<String, ExpandError> {
        self.reference(text).map(|e| e.to_string())
    }

    pub fn expand_call(&self, text: &str) -> Result<String, ExpandError> {
        self.call(text).map(|e| e.to_string())
    }

    pub fn expand_conditional<S: AsRef<str>>(
        &self,
        condition: &str,
        actions: &[S],
    ) -> Result<Vec<String>, ExpandError> {
        self.conditional(condition, actions).map(|c| c.lines())
    }

    fn check_function(&self, text: &str, name: &str) -> Result<(), ExpandError> {
        if self.known.is_empty() || self.known.contains(name) {
            return Ok(());
        }
        if self.strict {
            return Err(ExpandError::UnknownFunction {
                text: text.to_owned(),
                name: name.to_owned(),
            });
        }
        tracing::warn!(name, "call to unknown function");
        Ok(())
    }
}

// ── Free functions ────────────────────────────────────────────────────────────

/// Expand the `$name` / `${expr}` references in one token.
pub fn expand_references(text: &str) -> Result<String, ExpandError> {
    Expander::new().expand_references(text)
}

/// Expand a `name arg…` call line into a `_run(...)` invocation.
pub fn expand_call(text: &str) -> Result<String, ExpandError> {
    Expander::new().expand_call(text)
}

/// Expand a condition and its actions into guarded block lines.
pub fn expand_conditional<S: AsRef<str>>(
    condition: &str,
    actions: &[S],
) -> Result<Vec<String>, ExpandError> {
    Expander::new().expand_conditional(condition, actions)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
