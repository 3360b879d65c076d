//! The token definition for the DSQL language.

/// A token is a single unit of the language, with a specific kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind<'a>, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of a token.
///
/// Literal kinds borrow the raw source text, quotes and delimiters included,
/// so the compiler sees exactly what the user wrote.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    // Keywords
    Select,
    From,
    Where,
    And,
    Or,
    Not,
    Order, // "ORDER"
    By,    // "BY"
    Asc,   // "ASC" / "ASCENDING"
    Desc,  // "DESC" / "DESCENDING"
    Limit,
    Offset,
    Like,
    Null,

    // Literals
    Identifier(&'a str),
    String(&'a str), // The raw string, including quotes
    Integer(&'a str),
    Decimal(&'a str),
    Boolean(&'a str),
    Date(&'a str),
    DateTime(&'a str),
    HostExpression(&'a str), // "#[ ... ]", delimiters included

    // Punctuation
    Star,   // *
    Comma,  // ,
    LParen, // (
    RParen, // )

    // Comparators
    Eq,    // =
    NotEq, // <> or !=
    Gt,    // >
    Lt,    // <
    Gte,   // >=
    Lte,   // <=

    // Special
    Illegal(&'a str), // An illegal character or unterminated literal
}

impl TokenKind<'_> {
    /// Keywords that open a clause; the parser resynchronises on these.
    pub fn is_clause_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::From | TokenKind::Where | TokenKind::Order | TokenKind::Limit | TokenKind::Offset
        )
    }

    /// The comparison symbol as it should appear in a token tree.
    pub fn comparator_symbol(&self) -> Option<&'static str> {
        match self {
            TokenKind::Eq => Some("="),
            TokenKind::NotEq => Some("<>"),
            TokenKind::Gt => Some(">"),
            TokenKind::Lt => Some("<"),
            TokenKind::Gte => Some(">="),
            TokenKind::Lte => Some("<="),
            TokenKind::Like => Some("like"),
            _ => None,
        }
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}
