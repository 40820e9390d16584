//! Typed expression tree produced by the expanders.
//!
//! Expanders never build target text directly; they build an [`Expr`] (or a
//! [`Conditional`]) and the [`Display`](fmt::Display) impls below serialize
//! it.  The same tree is what [`crate::runtime::Evaluator`] runs.
//!
//! | Variant       | Serialized form                          |
//! |---------------|------------------------------------------|
//! | `Code`        | `<source>`                               |
//! | `Str`         | `'<body>'`                               |
//! | `Stringify`   | `str(<expr>)`                            |
//! | `Format`      | `'<template>'.format(<arg>, <arg>, …)`   |
//! | `Call`        | `_run('<name>', [<arg>, <arg>, …])`      |

use std::fmt;

/// Indentation applied to every line of a conditional body.
pub const INDENT: &str = "    ";

/// Name of the invocation primitive emitted for calls.
pub const RUN_FN: &str = "_run";

/// An expanded expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Expression source, substituted directly into the surrounding code.
    Code(String),
    /// A string literal.  Holds the literal body without delimiters.
    Str(String),
    /// Stringification of a single reference expression.
    Stringify(String),
    /// A formatted string.  Literal braces in `template` are doubled and
    /// each `{}` placeholder takes the next entry of `args`.
    Format { template: String, args: Vec<String> },
    /// An invocation of a runtime function with positional arguments.
    Call { name: String, args: Vec<Expr> },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Code(src) => f.write_str(src),
            Expr::Str(body) => write_quoted(f, body),
            Expr::Stringify(expr) => write!(f, "str({expr})"),
            Expr::Format { template, args } => {
                write_quoted(f, template)?;
                write!(f, ".format({})", args.join(", "))
            }
            Expr::Call { name, args } => {
                write!(f, "{RUN_FN}(")?;
                write_quoted(f, name)?;
                f.write_str(", [")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str("])")
            }
        }
    }
}

/// Write `body` as a single-quoted string literal.
///
/// Backslash pairs are copied as-is.  An unescaped `'` is written as `\'` and
/// a dangling trailing `\` is doubled so the literal always closes.
fn write_quoted(f: &mut fmt::Formatter<'_>, body: &str) -> fmt::Result {
    f.write_str("'")?;
    let mut escaped = false;
    for c in body.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '\'' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    if escaped {
        f.write_str("\\")?;
    }
    f.write_str("'")
}

/// The string a `Str` body (or `Format` template) denotes once written by
/// [`write_quoted`] and read back as a literal.
///
/// `\\`, `\'`, `\"`, `\n`, `\t` and `\r` decode; any other pair, and a
/// dangling trailing `\`, stay as written.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(e @ ('\\' | '\'' | '"')) => out.push(e),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

// ── Conditional ───────────────────────────────────────────────────────────────

/// A guarded block: `if <guard>:` followed by one indented line per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional {
    pub guard: Expr,
    pub actions: Vec<Expr>,
}

impl Conditional {
    /// Serialize to output lines.  A block with no actions gets a `pass`
    /// body, since an empty guard body is invalid.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.actions.len().max(1) + 1);
        lines.push(format!("if {}:", self.guard));
        if self.actions.is_empty() {
            lines.push(format!("{INDENT}pass"));
        }
        for action in &self.actions {
            lines.push(format!("{INDENT}{action}"));
        }
        lines
    }
}

impl fmt::Display for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
