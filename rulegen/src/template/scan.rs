//! Template scanner.
//!
//! Splits raw template text into [`Segment`]s in two passes:
//!
//! 1. **Classification.**  Decide once whether the whole token is a single
//!    quoted literal (`'…'` or `"…"`).  Only the opening quote's own match
//!    counts, and only when it is the last character of the token.
//! 2. **Body scan.**  Walk the body left to right, producing literal runs,
//!    escapes, and references.
//!
//! | Sequence     | Segment                                        |
//! |--------------|------------------------------------------------|
//! | `$name`      | Bare reference                                 |
//! | `${expr}`    | Braced reference, bracket-matched              |
//! | `\$`         | Escaped `$` (no reference)                     |
//! | `\\`         | Escaped `\`                                    |
//! | `\x`         | Literal `\x` (inert escape)                    |
//! | `\` at end   | Literal `\`                                    |
//! | anything else| Literal                                        |

use crate::error::{ExpandError, ReferenceFault};

// ── Public types ──────────────────────────────────────────────────────────────

/// Which syntax introduced a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `$name`
    Bare,
    /// `${expr}`
    Braced,
}

/// A classified run of template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// An escape sequence; holds the character it stands for (`$` or `\`).
    Escape(char),
    Reference {
        kind: RefKind,
        expr: String,
        /// Byte offset of the `$` in the scanned text.
        offset: usize,
    },
}

impl Segment {
    pub fn is_reference(&self) -> bool {
        matches!(self, Segment::Reference { .. })
    }

    /// Text this segment contributes when emitted without formatting.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Segment::Literal(s) => s.as_str().into(),
            Segment::Escape(c) => c.to_string().into(),
            Segment::Reference { expr, .. } => expr.as_str().into(),
        }
    }
}

/// Whole-token quoting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteContext {
    Unquoted,
    /// Quoted with the given delimiter (`'` or `"`).
    Quoted(char),
}

/// Result of scanning one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub quote: QuoteContext,
    pub segments: Vec<Segment>,
}

impl Scan {
    pub fn reference_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_reference()).count()
    }

    /// Iterate over the expressions of all references, left to right.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Reference { expr, .. } => Some(expr.as_str()),
            _ => None,
        })
    }
}

// ── Scanning ──────────────────────────────────────────────────────────────────

/// Scan `text` into a quote context and an ordered list of segments.
pub fn scan(text: &str) -> Result<Scan, ExpandError> {
    let quote = classify(text);
    let (body, base) = match quote {
        QuoteContext::Quoted(_) => (&text[1..text.len() - 1], 1),
        QuoteContext::Unquoted => (text, 0),
    };
    let segments = scan_body(body, base).map_err(|e| e.within(text, 0))?;
    Ok(Scan { quote, segments })
}

/// Decide whether `text` as a whole is a single quoted literal.
pub fn classify(text: &str) -> QuoteContext {
    let Some(open) = text.chars().next().filter(|c| matches!(c, '\'' | '"')) else {
        return QuoteContext::Unquoted;
    };
    match find_close_quote(text, 1, open) {
        Some(close) if close == text.len() - 1 && close > 0 => QuoteContext::Quoted(open),
        _ => QuoteContext::Unquoted,
    }
}

/// Find the first unescaped `quote` at or after byte `from`, skipping `\x`
/// pairs and whole `${…}` references.  Returns its byte index.
pub(crate) fn find_close_quote(text: &str, from: usize, quote: char) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < text.len() {
        let c = text[i..].chars().next()?;
        match c {
            '\\' => {
                // Skip the escaped character, whatever its width.
                let next = text[i + 1..].chars().next().map_or(0, char::len_utf8);
                i += 1 + next;
            }
            '$' if bytes.get(i + 1) == Some(&b'{') => match match_braced(text, i + 2) {
                Ok(end) => i = end + 1,
                Err(_) => return None,
            },
            c if c == quote => return Some(i),
            c => i += c.len_utf8(),
        }
    }
    None
}

/// Match the body of a `${…}` reference.
///
/// `from` is the byte index just past `${`.  Returns the byte index of the
/// closing `}`.  `{`, `[` and `(` nest; string literals inside the
/// expression are skipped whole so their contents never close anything.
pub(crate) fn match_braced(text: &str, from: usize) -> Result<usize, ReferenceFault> {
    let mut depth = 0usize;
    let mut in_str: Option<char> = None;
    let mut chars = text[from..].char_indices();

    while let Some((i, c)) = chars.next() {
        if let Some(q) = in_str {
            match c {
                '\\' => {
                    chars.next();
                }
                c if c == q => in_str = None,
                _ => {}
            }
            continue;
        }
        match c {
            '\'' | '"' => in_str = Some(c),
            '{' | '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            '}' if depth == 0 => return Ok(from + i),
            '}' => depth -= 1,
            _ => {}
        }
    }

    Err(if in_str.is_some() {
        ReferenceFault::UnterminatedString
    } else {
        ReferenceFault::Unterminated
    })
}

/// Scan a token body.  `base` is the body's byte offset within the token,
/// used to report reference positions against the original text.
fn scan_body(body: &str, base: usize) -> Result<Vec<Segment>, ExpandError> {
    let mut segments = Vec::new();
    let mut lit = String::new();
    let mut chars = body.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '\\' => match chars.peek().map(|&(_, c)| c) {
                None => lit.push('\\'),
                Some(c @ ('\\' | '$')) => {
                    chars.next();
                    flush(&mut lit, &mut segments);
                    segments.push(Segment::Escape(c));
                }
                Some(c) => {
                    // Inert escape: keep both characters.
                    chars.next();
                    lit.push('\\');
                    lit.push(c);
                }
            },
            '$' => match chars.peek().map(|&(_, c)| c) {
                Some('{') => {
                    chars.next();
                    let start = pos + 2;
                    let end = match_braced(body, start).map_err(|fault| {
                        ExpandError::MalformedReference {
                            text: body.to_owned(),
                            position: base + pos,
                            fault,
                        }
                    })?;
                    let expr = body[start..end].trim();
                    if expr.is_empty() {
                        return Err(ExpandError::MalformedReference {
                            text: body.to_owned(),
                            position: base + pos,
                            fault: ReferenceFault::Empty,
                        });
                    }
                    // Resume after the closing brace.
                    while matches!(chars.peek(), Some(&(i, _)) if i <= end) {
                        chars.next();
                    }
                    flush(&mut lit, &mut segments);
                    segments.push(Segment::Reference {
                        kind: RefKind::Braced,
                        expr: expr.to_owned(),
                        offset: base + pos,
                    });
                }
                Some(c) if is_ident_start(c) => {
                    let mut name = String::new();
                    while let Some(&(_, c)) = chars.peek() {
                        if !is_ident_continue(c) {
                            break;
                        }
                        name.push(c);
                        chars.next();
                    }
                    flush(&mut lit, &mut segments);
                    segments.push(Segment::Reference {
                        kind: RefKind::Bare,
                        expr: name,
                        offset: base + pos,
                    });
                }
                _ => lit.push('$'),
            },
            other => lit.push(other),
        }
    }

    flush(&mut lit, &mut segments);
    Ok(segments)
}

fn flush(lit: &mut String, segments: &mut Vec<Segment>) {
    if !lit.is_empty() {
        segments.push(Segment::Literal(std::mem::take(lit)));
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Segment {
        Segment::Literal(s.into())
    }

    fn bare(name: &str, offset: usize) -> Segment {
        Segment::Reference { kind: RefKind::Bare, expr: name.into(), offset }
    }

    fn braced(expr: &str, offset: usize) -> Segment {
        Segment::Reference { kind: RefKind::Braced, expr: expr.into(), offset }
    }

    #[test]
    fn classify_whole_token_quotes() {
        assert_eq!(classify("'abc'"), QuoteContext::Quoted('\''));
        assert_eq!(classify("\"abc 123\""), QuoteContext::Quoted('"'));
        assert_eq!(classify("''"), QuoteContext::Quoted('\''));
    }

    #[test]
    fn classify_inert_quotes() {
        assert_eq!(classify("'"), QuoteContext::Unquoted);
        assert_eq!(classify("\""), QuoteContext::Unquoted);
        assert_eq!(classify("bob's stuff"), QuoteContext::Unquoted);
        assert_eq!(classify("say \"what?\""), QuoteContext::Unquoted);
        assert_eq!(classify("'a' + 'b'"), QuoteContext::Unquoted);
        assert_eq!(classify("'abc\\'"), QuoteContext::Unquoted);
        assert_eq!(classify("'abc\""), QuoteContext::Unquoted);
    }

    #[test]
    fn classify_skips_quotes_inside_references() {
        assert_eq!(
            classify("'${value['available']}/${value['total']}'"),
            QuoteContext::Quoted('\'')
        );
        assert_eq!(classify("\"${value[\"a\"]} low\""), QuoteContext::Quoted('"'));
    }

    #[test]
    fn plain_literal() {
        let s = scan("abc 123").unwrap();
        assert_eq!(s.quote, QuoteContext::Unquoted);
        assert_eq!(s.segments, vec![lit("abc 123")]);
    }

    #[test]
    fn empty_input() {
        let s = scan("").unwrap();
        assert_eq!(s.quote, QuoteContext::Unquoted);
        assert!(s.segments.is_empty());
    }

    #[test]
    fn bare_references() {
        let s = scan("$key=$value").unwrap();
        assert_eq!(s.segments, vec![bare("key", 0), lit("="), bare("value", 5)]);
    }

    #[test]
    fn braced_reference_with_nested_brackets() {
        let s = scan("${value['available'] * 100} / ${value['total']}").unwrap();
        assert_eq!(
            s.segments,
            vec![
                braced("value['available'] * 100", 0),
                lit(" / "),
                braced("value['total']", 30),
            ]
        );
    }

    #[test]
    fn braced_reference_with_nested_braces() {
        let s = scan("${ {'a': 1}['a'] }").unwrap();
        assert_eq!(s.segments, vec![braced("{'a': 1}['a']", 0)]);
    }

    #[test]
    fn braced_reference_string_may_hold_brace() {
        let s = scan("${value['}']}x").unwrap();
        assert_eq!(s.segments, vec![braced("value['}']", 0), lit("x")]);
    }

    #[test]
    fn quoted_offsets_point_into_original() {
        let s = scan("'v=$v'").unwrap();
        assert_eq!(s.quote, QuoteContext::Quoted('\''));
        assert_eq!(s.segments, vec![lit("v="), bare("v", 3)]);
    }

    #[test]
    fn escapes() {
        assert_eq!(scan("\\").unwrap().segments, vec![lit("\\")]);
        assert_eq!(scan("\\\\").unwrap().segments, vec![Segment::Escape('\\')]);
        assert_eq!(
            scan("\\$value").unwrap().segments,
            vec![Segment::Escape('$'), lit("value")]
        );
        assert_eq!(scan("\\abc").unwrap().segments, vec![lit("\\abc")]);
    }

    #[test]
    fn escaped_braced_reference_is_literal() {
        let s = scan("\\${value}").unwrap();
        assert_eq!(s.reference_count(), 0);
        assert_eq!(s.segments, vec![Segment::Escape('$'), lit("{value}")]);
    }

    #[test]
    fn lone_dollar_is_literal() {
        assert_eq!(scan("100$").unwrap().segments, vec![lit("100$")]);
        assert_eq!(scan("$5 $ x").unwrap().segments, vec![lit("$5 $ x")]);
    }

    #[test]
    fn unterminated_reference() {
        let e = scan("abc ${value['x']").unwrap_err();
        assert_eq!(
            e,
            ExpandError::MalformedReference {
                text: "abc ${value['x']".into(),
                position: 4,
                fault: ReferenceFault::Unterminated,
            }
        );
    }

    #[test]
    fn unterminated_string_in_reference() {
        let e = scan("${value['x}").unwrap_err();
        assert!(matches!(
            e,
            ExpandError::MalformedReference { fault: ReferenceFault::UnterminatedString, .. }
        ));
    }

    #[test]
    fn empty_reference() {
        let e = scan("'a ${ } b'").unwrap_err();
        assert!(matches!(
            e,
            ExpandError::MalformedReference { position: 3, fault: ReferenceFault::Empty, .. }
        ));
    }

    #[test]
    fn references_in_order() {
        let s = scan("'${a}-$b-${c[0]}'").unwrap();
        assert_eq!(s.references().collect::<Vec<_>>(), vec!["a", "b", "c[0]"]);
    }

    #[test]
    fn multibyte_text() {
        let s = scan("'naïve $x ✓'").unwrap();
        assert_eq!(s.segments, vec![lit("naïve "), bare("x", 8), lit(" ✓")]);
    }
}
