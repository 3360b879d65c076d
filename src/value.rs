//! Literal values that appear on the right-hand side of a comparison.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::tree::NodeKind;

/// A literal value, built from the raw text of exactly one token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// String literal without its enclosing quotes, in single-quoted form:
    /// escapes of a single-quoted literal are kept as written
    Str(String),
    Int(i64),
    /// Decimal literal; keeps the scale it was written with
    Num(Decimal),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTimeValue),
    /// Bare symbolic token such as `NEXT_WEEK`
    Identifier(String),
    /// Embedded host expression (`#[...]`), carried opaquely
    HostExpression(String),
    Null,
    /// Any token kind that is not a known literal
    Unknown(String),
}

/// A date-time literal, with or without a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DateTimeValue {
    Local(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

impl Value {
    /// Build a value from the lexer-assigned kind and raw text of a token.
    ///
    /// Never fails: text the kind cannot represent (an integer wider than
    /// `i64`, a date that is not on the calendar) and unknown kinds become
    /// [`Value::Unknown`].
    pub fn from_literal(kind: NodeKind, text: &str) -> Value {
        let unknown = || Value::Unknown(text.to_string());
        match kind {
            NodeKind::StringLiteral => Value::Str(single_quoted_content(text)),
            NodeKind::IntegerLiteral => text.parse().map(Value::Int).unwrap_or_else(|_| unknown()),
            NodeKind::DecimalLiteral => Decimal::from_str_exact(text)
                .map(Value::Num)
                .unwrap_or_else(|_| unknown()),
            NodeKind::BooleanLiteral => Value::Bool(text.trim().eq_ignore_ascii_case("true")),
            NodeKind::DateLiteral => NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(Value::Date)
                .unwrap_or_else(|_| unknown()),
            NodeKind::DateTimeLiteral => parse_date_time(text)
                .map(Value::DateTime)
                .unwrap_or_else(unknown),
            NodeKind::Identifier => Value::Identifier(text.to_string()),
            NodeKind::HostExpressionLiteral => Value::HostExpression(text.to_string()),
            NodeKind::NullLiteral => Value::Null,
            _ => unknown(),
        }
    }

    /// Render the value in literal form: strings single-quoted, everything
    /// else as written.
    pub fn render(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s),
            Value::Int(n) => n.to_string(),
            Value::Num(d) => d.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::DateTime(DateTimeValue::Local(dt)) => dt.format(LOCAL_DATE_TIME_FORMAT).to_string(),
            Value::DateTime(DateTimeValue::Offset(dt)) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Identifier(s) | Value::HostExpression(s) | Value::Unknown(s) => s.clone(),
            Value::Null => "NULL".to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Plain text; quotes and backslashes are escaped into single-quoted form.
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.replace('\\', "\\\\").replace('\'', "''"))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Num(d)
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const LOCAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

fn parse_date_time(text: &str) -> Option<DateTimeValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(DateTimeValue::Offset(dt));
    }
    text.parse::<NaiveDateTime>().ok().map(DateTimeValue::Local)
}

/// Content of a quoted literal, rewritten so it is valid between single
/// quotes. A double-quoted literal has its `""` and `\"` turned into `"`
/// and every `'` doubled; a single-quoted literal is kept verbatim.
fn single_quoted_content(text: &str) -> String {
    let content = unquote(text);
    if !text.starts_with('"') || content.len() == text.len() {
        return content.to_string();
    }

    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            '"' if chars.peek() == Some(&'"') => {
                chars.next();
                out.push('"');
            }
            '\'' => out.push_str("''"),
            _ => out.push(c),
        }
    }
    out
}

/// Resolve the escapes of a literal body enclosed by `quote`: a doubled
/// `quote` and any backslash-escaped character stand for themselves.
pub fn unescape(content: &str, quote: char) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next().unwrap_or('\\')),
            c if c == quote && chars.peek() == Some(&quote) => {
                chars.next();
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// The plain text a name token stands for: quoted names are unquoted and
/// unescaped, bare names are returned as they are.
pub fn name_text(text: &str) -> String {
    let content = unquote(text);
    match text.chars().next() {
        Some(quote @ ('\'' | '"')) if content.len() != text.len() => unescape(content, quote),
        _ => text.to_string(),
    }
}

/// Strip exactly one pair of matching enclosing quotes.
pub fn unquote(text: &str) -> &str {
    let bytes = text.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(&first), Some(&last))
            if bytes.len() >= 2 && first == last && (first == b'\'' || first == b'"') =>
        {
            &text[1..text.len() - 1]
        }
        _ => text,
    }
}
