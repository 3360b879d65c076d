//! The token tree consumed by the compiler.
//!
//! A token tree is the labeled, nested output of a grammar: every node has a
//! kind tag, the raw source text it covers and an ordered list of children.
//! The compiler only talks to trees through [`SyntaxNode`], so any grammar
//! front end can feed it; [`TokenTree`] is the concrete tree built by the
//! bundled [`Parser`](crate::parser::Parser).

use crate::token::Span;

/// Node kind tags understood by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Select,
    From,
    Where,
    And,
    Or,
    Not,
    OpenParen,
    Operator,
    OrderBy,
    AscDesc,
    Limit,
    Offset,
    Identifier,
    StringLiteral,
    IntegerLiteral,
    DecimalLiteral,
    BooleanLiteral,
    DateLiteral,
    DateTimeLiteral,
    NullLiteral,
    HostExpressionLiteral,
    Wildcard,
    ErrorMarker,
}

impl NodeKind {
    /// Kinds that may name a field or an entity.
    pub fn is_name(self) -> bool {
        matches!(self, NodeKind::Identifier | NodeKind::StringLiteral | NodeKind::Wildcard)
    }

    /// Kinds that may appear on the value side of a comparison.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            NodeKind::Identifier
                | NodeKind::StringLiteral
                | NodeKind::IntegerLiteral
                | NodeKind::DecimalLiteral
                | NodeKind::BooleanLiteral
                | NodeKind::DateLiteral
                | NodeKind::DateTimeLiteral
                | NodeKind::NullLiteral
                | NodeKind::HostExpressionLiteral
        )
    }
}

/// Read access to one node of a token tree.
pub trait SyntaxNode: Sized {
    fn kind(&self) -> NodeKind;

    /// Raw source text of the node, quotes and delimiters included.
    fn text(&self) -> &str;

    fn children(&self) -> &[Self];

    /// Location in the source text, when the producer tracks one.
    fn span(&self) -> Option<Span> {
        None
    }
}

/// An owned token tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTree {
    pub kind: NodeKind,
    pub text: String,
    pub span: Span,
    pub children: Vec<TokenTree>,
}

impl TokenTree {
    pub fn leaf(kind: NodeKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            children: Vec::new(),
        }
    }

    pub fn node(kind: NodeKind, text: impl Into<String>, span: Span, children: Vec<TokenTree>) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            children,
        }
    }
}

/// Depth-first search for the first error marker in any tree.
pub fn find_error_marker<N: SyntaxNode>(node: &N) -> Option<&N> {
    if node.kind() == NodeKind::ErrorMarker {
        return Some(node);
    }
    node.children().iter().find_map(find_error_marker)
}

impl SyntaxNode for TokenTree {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn span(&self) -> Option<Span> {
        Some(self.span)
    }
}
