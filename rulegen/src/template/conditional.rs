//! Conditional expansion: a guard line plus one indented call per action.

use super::expr::{Conditional, Expr};
use super::reference;
use crate::error::ExpandError;

/// Build a conditional block from a condition and its action lines.
///
/// `call` expands each action; the [`Expander`](super::Expander) passes its
/// own call check through here.
pub fn expand<S, F>(
    condition: &str,
    actions: &[S],
    mut call: F,
) -> Result<Conditional, ExpandError>
where
    S: AsRef<str>,
    F: FnMut(&str) -> Result<Expr, ExpandError>,
{
    if condition.trim().is_empty() {
        return Err(ExpandError::EmptyCondition { text: condition.to_owned() });
    }
    let guard = reference::expand(condition)?;
    let actions = actions
        .iter()
        .map(|a| call(a.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(guard = %guard, actions = actions.len(), "expanded conditional");
    Ok(Conditional { guard, actions })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
