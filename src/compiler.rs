//! Compiler that turns a token tree into a [`Query`].
//!
//! Every node visit returns what it built: boolean nodes return their
//! [`Expression`] to the caller, so nested AND/OR/NOT trees are assembled
//! in one recursive pass without any shared operand stack. Each call to
//! [`compile`] owns its own [`QueryBuilder`].

use thiserror::Error;
use tracing::debug;

use crate::ast::{EntityType, Expression, Field};
use crate::operator::{Direction, Operator};
use crate::query::{BuildError, Query, QueryBuilder};
use crate::token::Span;
use crate::tree::{find_error_marker, NodeKind, SyntaxNode};
use crate::value::{name_text, Value};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// The grammar marked part of the input as unparseable.
    #[error("Syntax error: {message}")]
    Syntax { message: String, span: Option<Span> },

    /// The tree lacks something the grammar guarantees, e.g. a comparison
    /// without a value. Means the grammar and the compiler are out of sync.
    #[error("Malformed token tree: {0}")]
    Malformed(String),

    #[error("Invalid {kind:?} literal: {text}")]
    InvalidLiteral { kind: NodeKind, text: String },

    #[error("Incomplete query: {0}")]
    Incomplete(#[from] BuildError),
}

impl CompileError {
    fn syntax<N: SyntaxNode>(node: &N) -> Self {
        CompileError::Syntax {
            message: node.text().to_string(),
            span: node.span(),
        }
    }

    fn unexpected<N: SyntaxNode>(node: &N, context: &str) -> Self {
        CompileError::Malformed(format!(
            "unexpected {:?} node {:?} in {}",
            node.kind(),
            node.text(),
            context
        ))
    }
}

/// Compile a token tree rooted at a `Select` node.
///
/// An error marker anywhere in the tree fails the whole compilation; no
/// partial query is ever returned.
pub fn compile<N: SyntaxNode>(root: &N) -> Result<Query, CompileError> {
    if let Some(error) = find_error_marker(root) {
        return Err(CompileError::syntax(error));
    }
    QueryCompiler::new().compile(root)
}

/// Single-use visitor state for one compilation.
#[derive(Debug, Default)]
pub struct QueryCompiler {
    builder: QueryBuilder,
}

impl QueryCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile<N: SyntaxNode>(mut self, root: &N) -> Result<Query, CompileError> {
        self.visit_select(root)?;
        Ok(self.builder.build()?)
    }

    fn visit_select<N: SyntaxNode>(&mut self, node: &N) -> Result<(), CompileError> {
        match node.kind() {
            NodeKind::Select => {}
            NodeKind::ErrorMarker => return Err(CompileError::syntax(node)),
            _ => return Err(CompileError::unexpected(node, "query root")),
        }

        for child in node.children() {
            if child.kind().is_name() {
                let field = field_from_name(child);
                debug!(field = %field, "projected field");
                self.builder.add_field(field);
            } else {
                self.visit_clause(child)?;
            }
        }
        Ok(())
    }

    fn visit_clause<N: SyntaxNode>(&mut self, node: &N) -> Result<(), CompileError> {
        match node.kind() {
            NodeKind::From => self.visit_from(node),
            NodeKind::Where => self.visit_where(node),
            NodeKind::OrderBy => self.visit_order_by(node),
            NodeKind::Limit => {
                let limit = single_count(node)?;
                debug!(limit, "limit");
                self.builder.set_limit(limit);
                Ok(())
            }
            NodeKind::Offset => {
                let offset = single_count(node)?;
                debug!(offset, "offset");
                self.builder.set_offset(offset);
                Ok(())
            }
            NodeKind::ErrorMarker => Err(CompileError::syntax(node)),
            _ => Err(CompileError::unexpected(node, "SELECT")),
        }
    }

    fn visit_from<N: SyntaxNode>(&mut self, node: &N) -> Result<(), CompileError> {
        let entity = match node.children() {
            [name] if matches!(name.kind(), NodeKind::Identifier | NodeKind::StringLiteral) => {
                EntityType::new(name_text(name.text()))
            }
            [other] => return Err(CompileError::unexpected(other, "FROM")),
            _ => return Err(CompileError::Malformed("FROM needs exactly one entity".to_string())),
        };
        debug!(entity = %entity.name, "source entity");
        self.builder.set_type(entity);
        Ok(())
    }

    fn visit_where<N: SyntaxNode>(&mut self, node: &N) -> Result<(), CompileError> {
        let [condition] = node.children() else {
            return Err(CompileError::Malformed("WHERE needs exactly one condition".to_string()));
        };
        let filter = visit_expression(condition)?;
        debug!(compound = filter.is_compound(), "filter installed");
        self.builder.set_filter(filter);
        Ok(())
    }

    fn visit_order_by<N: SyntaxNode>(&mut self, node: &N) -> Result<(), CompileError> {
        for child in node.children() {
            match child.kind() {
                NodeKind::Identifier | NodeKind::StringLiteral => {
                    self.builder.add_order_by_field(field_from_name(child));
                }
                NodeKind::AscDesc => {
                    let direction = Direction::lookup(child.text()).ok_or_else(|| {
                        CompileError::Malformed(format!("unknown sort direction {:?}", child.text()))
                    })?;
                    self.builder.set_direction(direction);
                }
                _ => return Err(CompileError::unexpected(child, "ORDER BY")),
            }
        }
        Ok(())
    }
}

/// Build the expression for one boolean node and hand it back to the caller.
fn visit_expression<N: SyntaxNode>(node: &N) -> Result<Expression, CompileError> {
    match node.kind() {
        NodeKind::And | NodeKind::Or => {
            let mut operands = node.children().iter().map(visit_expression);
            let (Some(first), Some(second)) = (operands.next(), operands.next()) else {
                return Err(CompileError::Malformed(format!(
                    "{:?} needs two operands",
                    node.kind()
                )));
            };
            let combine = if node.kind() == NodeKind::And {
                Expression::and
            } else {
                Expression::or
            };
            // 多于两个操作数时左结合
            let mut expr = combine(first?, second?);
            for operand in operands {
                expr = combine(expr, operand?);
            }
            Ok(expr)
        }
        NodeKind::Not => match node.children() {
            [operand] => Ok(Expression::not(visit_expression(operand)?)),
            _ => Err(CompileError::Malformed("NOT needs exactly one operand".to_string())),
        },
        // 括号只影响结合方式，树结构已经体现了这一点
        NodeKind::OpenParen => match node.children() {
            [inner] => visit_expression(inner),
            _ => Err(CompileError::Malformed("empty parenthesised group".to_string())),
        },
        NodeKind::Operator => visit_comparison(node),
        NodeKind::ErrorMarker => Err(CompileError::syntax(node)),
        _ => Err(CompileError::unexpected(node, "WHERE")),
    }
}

fn visit_comparison<N: SyntaxNode>(node: &N) -> Result<Expression, CompileError> {
    let operator = Operator::lookup(node.text()).ok_or_else(|| {
        CompileError::Malformed(format!("unknown comparison operator {:?}", node.text()))
    })?;
    let [field, value] = node.children() else {
        return Err(CompileError::Malformed(format!(
            "comparison {:?} needs a field and a value",
            node.text()
        )));
    };
    if !matches!(field.kind(), NodeKind::Identifier | NodeKind::StringLiteral) {
        return Err(CompileError::unexpected(field, "comparison field"));
    }
    if !value.kind().is_literal() {
        return Err(CompileError::unexpected(value, "comparison value"));
    }
    Ok(Expression::comparison(
        operator,
        field_from_name(field),
        Value::from_literal(value.kind(), value.text()),
    ))
}

fn field_from_name<N: SyntaxNode>(node: &N) -> Field {
    Field::new(name_text(node.text()))
}

/// LIMIT / OFFSET: a single non-negative integer child.
fn single_count<N: SyntaxNode>(node: &N) -> Result<u64, CompileError> {
    match node.children() {
        [count] if count.kind() == NodeKind::IntegerLiteral => {
            count.text().trim().parse().map_err(|_| CompileError::InvalidLiteral {
                kind: NodeKind::IntegerLiteral,
                text: count.text().to_string(),
            })
        }
        [other] => Err(CompileError::unexpected(other, &format!("{:?}", node.kind()))),
        _ => Err(CompileError::Malformed(format!("{:?} needs exactly one count", node.kind()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TokenTree;

    fn leaf(kind: NodeKind, text: &str) -> TokenTree {
        TokenTree::leaf(kind, text, Span::default())
    }

    fn node(kind: NodeKind, text: &str, children: Vec<TokenTree>) -> TokenTree {
        TokenTree::node(kind, text, Span::default(), children)
    }

    fn cmp(op: &str, field: &str, value: TokenTree) -> TokenTree {
        node(NodeKind::Operator, op, vec![leaf(NodeKind::Identifier, field), value])
    }

    fn int(text: &str) -> TokenTree {
        leaf(NodeKind::IntegerLiteral, text)
    }

    fn select(children: Vec<TokenTree>) -> TokenTree {
        let mut all = vec![
            leaf(NodeKind::Identifier, "name"),
            node(NodeKind::From, "FROM", vec![leaf(NodeKind::Identifier, "Account")]),
        ];
        all.extend(children);
        node(NodeKind::Select, "SELECT", all)
    }

    fn where_clause(condition: TokenTree) -> TokenTree {
        node(NodeKind::Where, "WHERE", vec![condition])
    }

    #[test]
    fn test_projection_and_source() {
        let tree = node(
            NodeKind::Select,
            "SELECT",
            vec![
                leaf(NodeKind::Identifier, "name"),
                leaf(NodeKind::StringLiteral, "'Billing City'"),
                node(NodeKind::From, "FROM", vec![leaf(NodeKind::StringLiteral, "'Sales Order'")]),
            ],
        );
        let query = compile(&tree).unwrap();
        assert_eq!(query.fields(), &[Field::new("name"), Field::new("Billing City")]);
        assert_eq!(query.source().name, "Sales Order");
        assert!(query.filter().is_none());
    }

    #[test]
    fn test_wildcard_projection() {
        let tree = node(
            NodeKind::Select,
            "SELECT",
            vec![
                leaf(NodeKind::Wildcard, "*"),
                node(NodeKind::From, "FROM", vec![leaf(NodeKind::Identifier, "Account")]),
            ],
        );
        let query = compile(&tree).unwrap();
        assert!(query.fields()[0].is_wildcard());
    }

    #[test]
    fn test_single_comparison_is_the_filter() {
        let tree = select(vec![where_clause(cmp("=", "age", int("30")))]);
        let query = compile(&tree).unwrap();
        assert_eq!(
            query.filter(),
            Some(&Expression::comparison(Operator::Eq, Field::new("age"), 30))
        );
    }

    #[test]
    fn test_nested_boolean_tree() {
        // (age <> 18 OR grade > 0) AND NOT grade > 0
        let or = node(
            NodeKind::Or,
            "OR",
            vec![cmp("<>", "age", int("18")), cmp(">", "grade", int("0"))],
        );
        let group = node(NodeKind::OpenParen, "(", vec![or]);
        let not = node(NodeKind::Not, "NOT", vec![cmp(">", "grade", int("0"))]);
        let tree = select(vec![where_clause(node(NodeKind::And, "AND", vec![group, not]))]);

        let expected = Expression::and(
            Expression::or(
                Expression::comparison(Operator::Neq, Field::new("age"), 18),
                Expression::comparison(Operator::Gt, Field::new("grade"), 0),
            ),
            Expression::not(Expression::comparison(Operator::Gt, Field::new("grade"), 0)),
        );
        assert_eq!(compile(&tree).unwrap().filter(), Some(&expected));
    }

    #[test]
    fn test_flat_connective_folds_left() {
        let and = node(
            NodeKind::And,
            "AND",
            vec![cmp("=", "a", int("1")), cmp("=", "b", int("2")), cmp("=", "c", int("3"))],
        );
        let tree = select(vec![where_clause(and)]);
        let a = Expression::comparison(Operator::Eq, Field::new("a"), 1);
        let b = Expression::comparison(Operator::Eq, Field::new("b"), 2);
        let c = Expression::comparison(Operator::Eq, Field::new("c"), 3);
        assert_eq!(
            compile(&tree).unwrap().filter(),
            Some(&Expression::and(Expression::and(a, b), c))
        );
    }

    #[test]
    fn test_order_by_limit_offset() {
        let tree = select(vec![
            node(
                NodeKind::OrderBy,
                "ORDER BY",
                vec![
                    leaf(NodeKind::Identifier, "name"),
                    leaf(NodeKind::Identifier, "age"),
                    leaf(NodeKind::AscDesc, "descending"),
                ],
            ),
            node(NodeKind::Limit, "LIMIT", vec![int("10")]),
            node(NodeKind::Offset, "OFFSET", vec![int("20")]),
        ]);
        let query = compile(&tree).unwrap();
        assert_eq!(query.order_by(), &[Field::new("name"), Field::new("age")]);
        assert_eq!(query.direction(), Some(Direction::Desc));
        assert_eq!(query.limit(), Some(10));
        assert_eq!(query.offset(), Some(20));
    }

    #[test]
    fn test_error_marker_anywhere_fails() {
        let broken = node(
            NodeKind::Operator,
            "=",
            vec![leaf(NodeKind::Identifier, "age"), leaf(NodeKind::ErrorMarker, "Expected literal value")],
        );
        let tree = select(vec![where_clause(broken)]);
        match compile(&tree) {
            Err(CompileError::Syntax { message, .. }) => assert_eq!(message, "Expected literal value"),
            other => panic!("Expected syntax error, got {:?}", other),
        }

        let tree = select(vec![leaf(NodeKind::ErrorMarker, "Unexpected token")]);
        assert!(matches!(compile(&tree), Err(CompileError::Syntax { .. })));
    }

    #[test]
    fn test_comparison_missing_value_is_malformed() {
        let broken = node(NodeKind::Operator, "=", vec![leaf(NodeKind::Identifier, "age")]);
        let tree = select(vec![where_clause(broken)]);
        assert!(matches!(compile(&tree), Err(CompileError::Malformed(_))));
    }

    #[test]
    fn test_unknown_operator_is_malformed() {
        let tree = select(vec![where_clause(cmp("=>", "age", int("1")))]);
        assert!(matches!(compile(&tree), Err(CompileError::Malformed(_))));
    }

    #[test]
    fn test_negative_limit_is_invalid() {
        let tree = select(vec![node(NodeKind::Limit, "LIMIT", vec![int("-1")])]);
        assert_eq!(
            compile(&tree).unwrap_err(),
            CompileError::InvalidLiteral {
                kind: NodeKind::IntegerLiteral,
                text: "-1".to_string()
            }
        );
    }

    #[test]
    fn test_missing_from_is_incomplete() {
        let tree = node(NodeKind::Select, "SELECT", vec![leaf(NodeKind::Identifier, "name")]);
        assert_eq!(
            compile(&tree).unwrap_err(),
            CompileError::Incomplete(BuildError::MissingSource)
        );
    }

    #[test]
    fn test_root_must_be_select() {
        let tree = node(NodeKind::From, "FROM", vec![leaf(NodeKind::Identifier, "Account")]);
        assert!(matches!(compile(&tree), Err(CompileError::Malformed(_))));
    }
}
