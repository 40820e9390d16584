//! Call expansion: `name arg1 arg2 …` → `_run('name', [arg1, arg2, …])`.

use std::sync::OnceLock;

use regex::Regex;

use super::expr::Expr;
use super::reference;
use super::scan::{find_close_quote, match_braced};
use crate::error::ExpandError;

/// Expand a call line.  The first token names the function and is kept
/// verbatim; every other token is reference-expanded on its own.
pub fn expand(text: &str) -> Result<Expr, ExpandError> {
    let mut tokens = split_tokens(text).into_iter();
    let Some((_, name)) = tokens.next() else {
        return Err(ExpandError::EmptyCall { text: text.to_owned() });
    };
    if !is_call_name(name) {
        return Err(ExpandError::InvalidCallName {
            text: text.to_owned(),
            name: name.to_owned(),
        });
    }

    let args = tokens
        .map(|(offset, tok)| reference::expand(tok).map_err(|e| e.within(text, offset)))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(name, args = args.len(), "expanded call");
    Ok(Expr::Call { name: name.to_owned(), args })
}

/// Whether `name` is a dotted identifier such as `test.echo`.
pub fn is_call_name(name: &str) -> bool {
    static CALL_NAME: OnceLock<Regex> = OnceLock::new();
    CALL_NAME
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
                .expect("call name pattern is valid")
        })
        .is_match(name)
}

// ── Tokenizer ─────────────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, returning each token with its
/// byte offset.
///
/// Whitespace never splits inside a `'…'` / `"…"` region, after a `\`, or
/// inside a `${…}` reference.  An unterminated quote runs to the end of the
/// line.  Tokens are returned raw: quotes and escapes are left for the
/// reference expander.
pub fn split_tokens(s: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < s.len() {
        let Some(c) = s[i..].chars().next() else { break };

        if c.is_whitespace() {
            if let Some(st) = start.take() {
                tokens.push((st, &s[st..i]));
            }
            i += c.len_utf8();
            continue;
        }

        start.get_or_insert(i);
        i = match c {
            '\\' => i + 1 + s[i + 1..].chars().next().map_or(0, char::len_utf8),
            '\'' | '"' => match find_close_quote(s, i + 1, c) {
                Some(close) => close + 1,
                None => s.len(),
            },
            // An unmatched `${` is left whole for the reference expander to reject.
            '$' if bytes.get(i + 1) == Some(&b'{') => match match_braced(s, i + 2) {
                Ok(end) => end + 1,
                Err(_) => s.len(),
            },
            c => i + c.len_utf8(),
        };
    }

    if let Some(st) = start {
        tokens.push((st, &s[st..]));
    }
    tokens
}

// ── Tests ─────────────────────────────────────────────────────────────────────
