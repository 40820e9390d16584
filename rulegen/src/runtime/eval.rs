//! Evaluator for expanded expression trees.
//!
//! Reference expressions and guards are opaque source text here; they are
//! handed to the caller's [`EvalContext`].  The evaluator only assembles
//! strings, fills format templates, and dispatches calls through a
//! [`FunctionTable`].  String bodies are decoded the same way the emitted
//! `'…'` literal would be read, so evaluating a tree and executing its text
//! agree.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use super::value::Value;
use crate::template::expr::unescape;
use crate::template::{Conditional, Expr};

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Access to live values, supplied by the rule executor.
pub trait EvalContext {
    /// Evaluate one expression source, e.g. `value['available'] > 100`.
    fn eval(&mut self, source: &str) -> Result<Value, EvalError>;
}

/// An error raised while evaluating an expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("cannot evaluate {expr:?}: {message}")]
    Context { expr: String, message: String },

    #[error("unknown function {0:?}")]
    UnknownFunction(String),

    #[error("{name}: {message}")]
    Function { name: String, message: String },

    #[error("format template {template:?} expects {expected} arguments, got {got}")]
    Template { template: String, expected: usize, got: usize },
}

// ── FunctionTable ─────────────────────────────────────────────────────────────

type RuleFn = Box<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// Name → callable dispatch table for rule actions.
#[derive(Default)]
pub struct FunctionTable {
    fns: BTreeMap<String, RuleFn>,
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.fns.keys()).finish()
    }
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.fns.insert(name.into(), Box::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fns.keys().map(String::as_str)
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let f = self
            .fns
            .get(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_owned()))?;
        f(args).map_err(|message| EvalError::Function { name: name.to_owned(), message })
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Runs expression trees against a context and a function table.
pub struct Evaluator<'a, C: EvalContext + ?Sized> {
    table: &'a FunctionTable,
    ctx: &'a mut C,
}

impl<'a, C: EvalContext + ?Sized> Evaluator<'a, C> {
    pub fn new(table: &'a FunctionTable, ctx: &'a mut C) -> Self {
        Self { table, ctx }
    }

    /// Evaluate one expression.
    pub fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Code(src) => self.ctx.eval(src),
            Expr::Str(body) => Ok(Value::Str(unescape(body))),
            Expr::Stringify(src) => Ok(Value::Str(self.ctx.eval(src)?.to_string())),
            Expr::Format { template, args } => {
                let values = args
                    .iter()
                    .map(|a| self.ctx.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                fill_template(&unescape(template), &values).map(Value::Str)
            }
            Expr::Call { name, args } => {
                let values = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                tracing::debug!(name = name.as_str(), args = values.len(), "dispatching call");
                self.table.call(name, &values)
            }
        }
    }

    /// Evaluate the guard and, if it holds, every action in order.
    /// Returns whether the block fired.
    pub fn run(&mut self, block: &Conditional) -> Result<bool, EvalError> {
        if !self.eval(&block.guard)?.is_truthy() {
            tracing::trace!(guard = %block.guard, "guard not met");
            return Ok(false);
        }
        for action in &block.actions {
            self.eval(action)?;
        }
        Ok(true)
    }
}

/// Substitute `values` for the `{}` placeholders of `template`, turning
/// `{{` / `}}` back into single braces.
pub fn fill_template(template: &str, values: &[Value]) -> Result<String, EvalError> {
    let mismatch = || EvalError::Template {
        template: template.to_owned(),
        expected: count_placeholders(template),
        got: values.len(),
    };

    let mut out = String::with_capacity(template.len());
    let mut next = values.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) => {
                chars.next();
                let v = next.next().ok_or_else(mismatch)?;
                out.push_str(&v.to_string());
            }
            ('{', _) | ('}', _) => return Err(mismatch()),
            (c, _) => out.push(c),
        }
    }

    if next.next().is_some() {
        return Err(mismatch());
    }
    Ok(out)
}

fn count_placeholders(template: &str) -> usize {
    let mut n = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
            }
            ('{', Some('}')) => {
                chars.next();
                n += 1;
            }
            _ => {}
        }
    }
    n
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Expander;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Context that resolves expression sources from a fixed table.
    struct MapCtx(HashMap<&'static str, Value>);

    impl EvalContext for MapCtx {
        fn eval(&mut self, source: &str) -> Result<Value, EvalError> {
            self.0.get(source).cloned().ok_or_else(|| EvalError::Context {
                expr: source.to_owned(),
                message: "not bound".into(),
            })
        }
    }

    fn recording_table() -> (FunctionTable, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let mut table = FunctionTable::new();
        table.register("test.echo", move |args| {
            let line = args.iter().map(Value::to_string).collect::<Vec<_>>().join(" ");
            sink.lock().unwrap().push(line);
            Ok(Value::default())
        });
        (table, log)
    }

    #[test]
    fn fill_template_basic() {
        let out = fill_template("{{{}}} {}%", &[Value::Int(1), Value::Float(2.5)]).unwrap();
        assert_eq!(out, "{1} 2.5%");
    }

    #[test]
    fn fill_template_arity_mismatch() {
        let e = fill_template("{} {}", &[Value::Int(1)]).unwrap_err();
        assert_eq!(
            e,
            EvalError::Template { template: "{} {}".into(), expected: 2, got: 1 }
        );
        assert!(fill_template("x", &[Value::Int(1)]).is_err());
    }

    #[test]
    fn eval_stringify_and_str() {
        let table = FunctionTable::new();
        let mut ctx = MapCtx(HashMap::from([("value", Value::Int(7))]));
        let mut ev = Evaluator::new(&table, &mut ctx);
        assert_eq!(ev.eval(&Expr::Stringify("value".into())).unwrap(), Value::Str("7".into()));
        assert_eq!(ev.eval(&Expr::Str("abc".into())).unwrap(), Value::Str("abc".into()));
    }

    #[test]
    fn quoted_literals_evaluate_like_their_text() {
        let table = FunctionTable::new();
        let mut ctx = MapCtx(HashMap::from([("who", Value::from("bob"))]));
        let mut ev = Evaluator::new(&table, &mut ctx);
        let expander = Expander::new();

        for src in ["\"bob's\"", "'bob\\'s'"] {
            let expr = expander.reference(src).unwrap();
            assert_eq!(expr.to_string(), "'bob\\'s'");
            assert_eq!(ev.eval(&expr).unwrap(), Value::from("bob's"), "{src}");
        }

        let expr = expander.reference("'$who\\'s disk'").unwrap();
        assert_eq!(expr.to_string(), "'{}\\'s disk'.format(who)");
        assert_eq!(ev.eval(&expr).unwrap(), Value::from("bob's disk"));
    }

    #[test]
    fn unknown_function() {
        let table = FunctionTable::new();
        let mut ctx = MapCtx(HashMap::new());
        let call = Expr::Call { name: "nope".into(), args: vec![] };
        assert_eq!(
            Evaluator::new(&table, &mut ctx).eval(&call).unwrap_err(),
            EvalError::UnknownFunction("nope".into())
        );
    }

    #[test]
    fn function_error_is_wrapped() {
        let mut table = FunctionTable::new();
        table.register("bad.fn", |_| Err("boom".into()));
        let mut ctx = MapCtx(HashMap::new());
        let call = Expr::Call { name: "bad.fn".into(), args: vec![] };
        let e = Evaluator::new(&table, &mut ctx).eval(&call).unwrap_err();
        assert_eq!(e.to_string(), "bad.fn: boom");
    }

    #[test]
    fn run_fires_actions_when_guard_holds() {
        let (table, log) = recording_table();
        let block = Expander::with_functions(&table)
            .conditional(
                "${value['available']} < 100",
                &["test.echo \"${value['available']} too low\""],
            )
            .unwrap();

        let mut ctx = MapCtx(HashMap::from([
            ("value['available'] < 100", Value::from(true)),
            ("value['available']", Value::Int(42)),
        ]));
        assert!(Evaluator::new(&table, &mut ctx).run(&block).unwrap());
        assert_eq!(*log.lock().unwrap(), vec!["42 too low"]);
    }

    #[test]
    fn run_skips_actions_when_guard_fails() {
        let (table, log) = recording_table();
        let block = Expander::new().conditional("$low", &["test.echo x"]).unwrap();
        let mut ctx = MapCtx(HashMap::from([("low", Value::Int(0))]));
        assert!(!Evaluator::new(&table, &mut ctx).run(&block).unwrap());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn table_debug_lists_names() {
        let (table, _) = recording_table();
        assert_eq!(format!("{table:?}"), "{\"test.echo\"}");
        assert!(table.contains("test.echo"));
    }
}
