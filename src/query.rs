//! Named-Placeholder Query Rewriting
//!
//! Firebird's wire protocol binds parameters positionally (`?`), while humans
//! write templates with named placeholders (`:name`). This module rewrites a
//! template into its positional form and produces the argument list whose
//! order matches the placeholder occurrence order.
//!
//! # Scanning Strategy
//! One left-to-right pass emitting into a fresh output buffer. Single-quoted
//! string literals are copied through verbatim, so placeholder-like text
//! inside them is never rewritten. The scanner never re-indexes into a string
//! whose length has already changed.
//!
//! This is not a SQL parser: it does not validate syntax and knows nothing
//! about quoting beyond single-quoted literals.

use serde_json::Value;

use crate::error::{FireflowError, Result};
use crate::items::ProjectedRecord;

/// A positional statement plus its bound arguments.
///
/// The number of `?` markers in `sql` equals `args.len()`, and `args[i]`
/// belongs to the i-th named placeholder of the original template in
/// left-to-right order.
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenQuery {
    /// Driver-ready SQL with positional placeholders
    pub sql: String,

    /// Bound values in placeholder occurrence order
    pub args: Vec<Value>,
}

impl RewrittenQuery {
    /// True when the template contained no named placeholders.
    /// The driver is then invoked without a bound-parameter array.
    #[must_use]
    pub fn is_unbound(&self) -> bool {
        self.args.is_empty()
    }
}

/// Split a comma-separated name list, trimming each entry.
/// Empty segments are dropped.
#[must_use]
pub fn parse_name_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Placeholder identifiers are one or more of `[_a-zA-Z0-9]`
const fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Rewrite `template` into positional form.
///
/// Every `:name` placeholder must appear in `known_params`; an undeclared
/// name aborts the whole rewrite with [`FireflowError::UnknownParameter`]
/// naming that identifier, and no partial result is returned. The bound value
/// for each placeholder is taken from `values` (a projection over the
/// declared names, so an absent field binds NULL).
///
/// A template without placeholders is returned unchanged with an empty
/// argument list.
pub fn rewrite(
    template: &str,
    known_params: &[String],
    values: &ProjectedRecord,
) -> Result<RewrittenQuery> {
    let mut sql = String::with_capacity(template.len());
    let mut args = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                // String literal: copy verbatim through the closing quote.
                // No escaped-quote handling; an unterminated literal runs to
                // the end of the template.
                sql.push('\'');
                for c in chars.by_ref() {
                    sql.push(c);
                    if c == '\'' {
                        break;
                    }
                }
            }
            ':' if chars.peek().copied().is_some_and(is_ident_char) => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }

                if !known_params.iter().any(|param| *param == name) {
                    return Err(FireflowError::unknown_parameter(name));
                }

                args.push(values.get(&name).cloned().unwrap_or(Value::Null));
                sql.push('?');
            }
            // A bare ':' (cast syntax, time literals, ...) is not a placeholder
            _ => sql.push(ch),
        }
    }

    Ok(RewrittenQuery { sql, args })
}
