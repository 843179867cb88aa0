//! Condition evaluation for autoroute branches.
//!
//! An expression is a comparison `<key> <op> <literal>` against persisted
//! state, optionally joined with `&&` and `||` (`&&` binds tighter). Anything
//! that cannot be parsed or looked up evaluates to `false`; routing stays
//! resilient and relies on a default route as the safety net.

use std::cmp::Ordering;

use cf_core::{StateStore, StateValue};

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Compare the state value at `key` with a literal.
    Compare {
        /// State key.
        key: String,
        /// Comparison operator.
        op: Operator,
        /// Right-hand literal.
        literal: StateValue,
    },
    /// Logical AND.
    And(Vec<Condition>),
    /// Logical OR.
    Or(Vec<Condition>),
}

impl Condition {
    /// Parse an expression, or `None` if any part is malformed.
    pub fn parse(expr: &str) -> Option<Self> {
        let alternatives = split_outside_quotes(expr, "||");
        if alternatives.len() > 1 {
            return alternatives
                .into_iter()
                .map(Self::parse_conjunction)
                .collect::<Option<Vec<_>>>()
                .map(Condition::Or);
        }
        Self::parse_conjunction(expr)
    }

    fn parse_conjunction(expr: &str) -> Option<Self> {
        let terms = split_outside_quotes(expr, "&&");
        if terms.len() > 1 {
            return terms
                .into_iter()
                .map(parse_comparison)
                .collect::<Option<Vec<_>>>()
                .map(Condition::And);
        }
        parse_comparison(expr)
    }

    /// Evaluate against persisted state. Missing keys make a comparison false.
    pub fn evaluate(&self, state: &dyn StateStore) -> bool {
        match self {
            Condition::Compare { key, op, literal } => {
                let Some(value) = state.get(key) else {
                    tracing::debug!(key = %key, "condition key not in state");
                    return false;
                };
                compare(&value, *op, literal)
            }
            Condition::And(conditions) => conditions.iter().all(|c| c.evaluate(state)),
            Condition::Or(conditions) => conditions.iter().any(|c| c.evaluate(state)),
        }
    }
}

/// Parse and evaluate `expr` in one step; parse failures are `false`.
pub fn evaluate(expr: &str, state: &dyn StateStore) -> bool {
    match Condition::parse(expr) {
        Some(condition) => condition.evaluate(state),
        None => {
            tracing::debug!(expr, "unparsable condition");
            false
        }
    }
}

fn compare(value: &StateValue, op: Operator, literal: &StateValue) -> bool {
    match op {
        Operator::Eq => value.loose_eq(literal),
        Operator::Ne => !value.loose_eq(literal),
        Operator::Gt => value.loose_cmp(literal) == Some(Ordering::Greater),
        Operator::Ge => matches!(
            value.loose_cmp(literal),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Lt => value.loose_cmp(literal) == Some(Ordering::Less),
        Operator::Le => matches!(
            value.loose_cmp(literal),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

fn parse_comparison(expr: &str) -> Option<Condition> {
    let expr = expr.trim();
    let op_start = expr.find(['=', '!', '<', '>'])?;
    let key = expr[..op_start].trim();
    if key.is_empty() || key.contains(char::is_whitespace) || key.contains(['"', '\'']) {
        return None;
    }

    let rest = &expr[op_start..];
    let (op, len) = if rest.starts_with("==") {
        (Operator::Eq, 2)
    } else if rest.starts_with("!=") {
        (Operator::Ne, 2)
    } else if rest.starts_with(">=") {
        (Operator::Ge, 2)
    } else if rest.starts_with("<=") {
        (Operator::Le, 2)
    } else if rest.starts_with('>') {
        (Operator::Gt, 1)
    } else if rest.starts_with('<') {
        (Operator::Lt, 1)
    } else {
        return None;
    };

    let literal = parse_literal(&rest[len..])?;
    Some(Condition::Compare {
        key: key.to_string(),
        op,
        literal,
    })
}

fn parse_literal(raw: &str) -> Option<StateValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Some(StateValue::String(raw[1..raw.len() - 1].to_string()));
        }
    }
    if raw.starts_with(['"', '\'']) || raw.ends_with(['"', '\'']) {
        return None;
    }
    match raw {
        "true" => return Some(StateValue::Bool(true)),
        "false" => return Some(StateValue::Bool(false)),
        "null" => return Some(StateValue::Null),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Some(StateValue::Integer(n));
    }
    if raw.contains(|c: char| c.is_ascii_digit())
        && let Ok(n) = raw.parse::<f64>()
    {
        return Some(StateValue::Float(n));
    }
    if raw.contains(['=', '!', '<', '>']) {
        return None;
    }
    Some(StateValue::String(raw.to_string()))
}

/// Split on `sep` where it does not appear inside a quoted string.
fn split_outside_quotes<'a>(expr: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut iter = expr.char_indices();
    while let Some((i, c)) = iter.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if expr[i..].starts_with(sep) => {
                parts.push(&expr[start..i]);
                start = i + sep.len();
                for _ in 1..sep.len() {
                    iter.next();
                }
            }
            None => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}
