//! Comparison operators and sort directions.
//!
//! Both are looked up from fixed, read-only tables. The grammar only ever
//! produces the symbols listed here, so a miss in `from_symbol`/`from_word`
//! means the grammar and the compiler have drifted apart.

use serde::Serialize;
use std::fmt;

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Eq,   // =
    Gt,   // >
    Lt,   // <
    Gte,  // >=
    Lte,  // <=
    Neq,  // <>
    Like, // LIKE
}

const OPERATORS: &[(&str, Operator)] = &[
    ("=", Operator::Eq),
    (">", Operator::Gt),
    ("<", Operator::Lt),
    (">=", Operator::Gte),
    ("<=", Operator::Lte),
    ("<>", Operator::Neq),
    ("like", Operator::Like),
];

impl Operator {
    /// Case-insensitive, whitespace-trimmed table lookup.
    pub fn lookup(symbol: &str) -> Option<Operator> {
        let symbol = symbol.trim();
        OPERATORS
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(symbol))
            .map(|(_, op)| *op)
    }

    /// # Panics
    ///
    /// Panics if `symbol` is not one of the grammar's comparison symbols.
    pub fn from_symbol(symbol: &str) -> Operator {
        Self::lookup(symbol).unwrap_or_else(|| panic!("unmapped comparison operator {:?}", symbol))
    }

    pub fn to_symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Neq => "<>",
            Operator::Like => "LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_symbol())
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Asc,
    Desc,
}

const DIRECTIONS: &[(&str, Direction)] = &[
    ("asc", Direction::Asc),
    ("ascending", Direction::Asc),
    ("desc", Direction::Desc),
    ("descending", Direction::Desc),
];

impl Direction {
    pub fn lookup(word: &str) -> Option<Direction> {
        let word = word.trim();
        DIRECTIONS
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(word))
            .map(|(_, dir)| *dir)
    }

    /// # Panics
    ///
    /// Panics if `word` is not a sort-direction keyword.
    pub fn from_word(word: &str) -> Direction {
        Self::lookup(word).unwrap_or_else(|| panic!("unmapped sort direction {:?}", word))
    }

    pub fn to_keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_keyword())
    }
}
