//! Error types for template expansion.

use thiserror::Error;

/// Why a `${...}` reference could not be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReferenceFault {
    /// Depth never returned to zero before the end of input.
    #[error("missing closing '}}'")]
    Unterminated,
    /// A string literal inside the expression was never closed.
    #[error("unterminated string inside reference")]
    UnterminatedString,
    /// `${}` with nothing between the braces.
    #[error("empty reference")]
    Empty,
}

/// An error raised while expanding a template.
///
/// Every variant carries the text being expanded so that a rule loader can
/// report and reject a single rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("malformed reference at offset {position} in {text:?}: {fault}")]
    MalformedReference {
        text: String,
        /// Byte offset of the `$` that opened the reference.
        position: usize,
        fault: ReferenceFault,
    },

    #[error("call has no function name: {text:?}")]
    EmptyCall { text: String },

    #[error("invalid function name {name:?} in call {text:?}")]
    InvalidCallName { text: String, name: String },

    #[error("unknown function {name:?} in call {text:?}")]
    UnknownFunction { text: String, name: String },

    #[error("conditional has an empty condition: {text:?}")]
    EmptyCondition { text: String },
}

impl ExpandError {
    /// Re-anchor an error raised on a sub-slice of `text` starting at
    /// byte `offset`, so positions and context refer to the whole input.
    pub(crate) fn within(self, text: &str, offset: usize) -> Self {
        match self {
            ExpandError::MalformedReference { position, fault, .. } => {
                ExpandError::MalformedReference {
                    text: text.to_owned(),
                    position: position + offset,
                    fault,
                }
            }
            other => other,
        }
    }

    /// Byte offset of the failure, when one is known.
    pub fn position(&self) -> Option<usize> {
        match self {
            ExpandError::MalformedReference { position, .. } => Some(*position),
            _ => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
