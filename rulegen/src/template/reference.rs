//! Reference expansion: turn one scanned token into an [`Expr`].
//!
//! Unquoted tokens have their references substituted in place as bare
//! expressions.  Quoted tokens become a string: a plain literal when there
//! are no references, `str(<expr>)` when the body is a single reference, and
//! a formatted string otherwise.

use super::expr::Expr;
use super::scan::{scan, QuoteContext, Segment};
use crate::error::ExpandError;

/// Expand the references in `text`.
pub fn expand(text: &str) -> Result<Expr, ExpandError> {
    let scanned = scan(text)?;

    let expr = match scanned.quote {
        QuoteContext::Unquoted => Expr::Code(concat(&scanned.segments)),
        QuoteContext::Quoted(_) if scanned.reference_count() == 0 => {
            Expr::Str(concat(&scanned.segments))
        }
        QuoteContext::Quoted(_) => match scanned.segments.as_slice() {
            [Segment::Reference { expr, .. }] => Expr::Stringify(expr.clone()),
            segments => format_string(segments),
        },
    };

    tracing::trace!(input = text, output = %expr, "expanded references");
    Ok(expr)
}

/// Concatenate segment texts, references contributing their expression.
fn concat(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text()).collect()
}

/// Build a formatted-string expression from a quoted body.
fn format_string(segments: &[Segment]) -> Expr {
    let mut template = String::new();
    let mut args = Vec::new();

    for seg in segments {
        match seg {
            Segment::Reference { expr, .. } => {
                template.push_str("{}");
                args.push(expr.clone());
            }
            other => {
                for c in other.text().chars() {
                    match c {
                        '{' => template.push_str("{{"),
                        '}' => template.push_str("}}"),
                        c => template.push(c),
                    }
                }
            }
        }
    }

    Expr::Format { template, args }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
