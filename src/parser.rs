//! DSQL的语法分析器，将 token 序列构建为 token 树
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   ├─ 期望 SELECT → parse_projection()      字段列表或 *
//!   └─ 按顺序解析各子句
//!       ├─ FROM     → parse_from()           实体名
//!       ├─ WHERE    → parse_where()
//!       │               └─ parse_or_expression()
//!       │                    └─ parse_and_expression()
//!       │                         └─ parse_not_expression()
//!       │                              └─ parse_primary_expression()
//!       │                                   ├─ "(" → OpenParen 分组节点
//!       │                                   └─ 字段 比较运算符 字面值 → Operator 节点
//!       ├─ ORDER BY → parse_order_by()       字段列表 + 可选 ASC/DESC
//!       ├─ LIMIT    → parse_paging()
//!       └─ OFFSET   → parse_paging()
//! ```
//!
//! ## 语法优先级（从高到低）
//!
//! 1. **括号分组** `(expression)`
//! 2. **比较操作** `field = value`, `field LIKE 'a%'`
//! 3. **NOT操作** `NOT expression`
//! 4. **AND操作** `expr1 AND expr2`
//! 5. **OR操作** `expr1 OR expr2`
//!
//! ## 错误恢复
//!
//! 与语法生成器产生的解析器一样，`parse()` 从不返回错误：无法解析的片段会被替换为
//! `ErrorMarker` 节点，然后跳到下一个子句关键字继续解析。编译器遇到该节点时报告语法错误。
//!
//! ## 解析示例
//!
//! ```text
//! SELECT name, 'Billing City' FROM Account
//!     WHERE (age < 18 OR grade > 0) AND NOT name LIKE 'A%'
//!     ORDER BY name DESC LIMIT 10 OFFSET 20
//! ```

use crate::token::{Span, Token, TokenKind};
use crate::tree::{NodeKind, TokenTree};

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn new(message: String, span: Option<Span>) -> Self {
        Self { message, span }
    }

    fn at_position(message: String, span: Span) -> Self {
        Self { message, span: Some(span) }
    }
}

type ParseResult = Result<TokenTree, ParseError>;

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&'a Token<'a>> {
        let tokens: &'a [Token<'a>] = self.tokens;
        tokens.get(self.position)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token<'a>> {
        let token = self.peek()?;
        self.position += 1;
        Some(token)
    }

    /// 最近消费的 token 的位置
    fn previous_span(&self) -> Span {
        self.position
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    /// 期望特定类型的 token 并推进，否则返回错误
    fn expect(&mut self, expected: TokenKind) -> Result<&'a Token<'a>, ParseError> {
        match self.peek() {
            Some(token) if std::mem::discriminant(&token.kind) == std::mem::discriminant(&expected) => {
                self.position += 1;
                Ok(token)
            }
            Some(token) => Err(ParseError::at_position(
                format!("Expected {:?}, found {:?}", expected, token.kind),
                token.span,
            )),
            None => Err(self.end_of_input(&format!("{:?}", expected))),
        }
    }

    /// 检查当前 token 是否匹配给定类型
    fn match_token(&self, kind: &TokenKind) -> bool {
        self.peek()
            .is_some_and(|token| std::mem::discriminant(&token.kind) == std::mem::discriminant(kind))
    }

    fn end_of_input(&self, expected: &str) -> ParseError {
        let end = self.previous_span().end;
        ParseError::new(
            format!("Expected {}, but reached end of input", expected),
            Some(Span::new(end, end)),
        )
    }

    /// 将错误转换为 ErrorMarker 节点，并跳到下一个子句关键字
    fn recover(&mut self, error: ParseError) -> TokenTree {
        while let Some(token) = self.peek() {
            if token.kind.is_clause_keyword() {
                break;
            }
            self.position += 1;
        }
        let span = error.span.unwrap_or_else(|| self.previous_span());
        TokenTree::leaf(NodeKind::ErrorMarker, error.message, span)
    }

    /// 解析完整的查询，返回以 Select 节点为根的 token 树
    pub fn parse(&mut self) -> TokenTree {
        let start = self.peek().map(|t| t.span).unwrap_or_default();
        let mut children = Vec::new();

        let projection = self
            .expect(TokenKind::Select)
            .and_then(|_| self.parse_projection());
        match projection {
            Ok(fields) => children.extend(fields),
            Err(e) => children.push(self.recover(e)),
        }

        // 子句必须按 FROM, WHERE, ORDER BY, LIMIT, OFFSET 的顺序出现，且各自最多一次
        let mut last_rank = 0;
        while let Some(token) = self.peek() {
            let rank = clause_rank(&token.kind);
            let clause = if rank == 0 {
                Err(ParseError::at_position(
                    format!("Unexpected token: {:?}", token.kind),
                    token.span,
                ))
            } else if rank <= last_rank {
                self.position += 1; // 跳过重复或乱序的关键字
                Err(ParseError::at_position(
                    format!("Unexpected {:?} clause", token.kind),
                    token.span,
                ))
            } else {
                last_rank = rank;
                match token.kind {
                    TokenKind::From => self.parse_from(),
                    TokenKind::Where => self.parse_where(),
                    TokenKind::Order => self.parse_order_by(),
                    TokenKind::Limit => self.parse_paging(NodeKind::Limit),
                    _ => self.parse_paging(NodeKind::Offset),
                }
            };
            match clause {
                Ok(node) => children.push(node),
                Err(e) => children.push(self.recover(e)),
            }
        }

        TokenTree::node(NodeKind::Select, "SELECT", start.to(self.previous_span()), children)
    }

    /// 解析 SELECT 之后的字段列表，`*` 只能单独出现
    fn parse_projection(&mut self) -> Result<Vec<TokenTree>, ParseError> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Star {
                self.advance();
                return Ok(vec![TokenTree::leaf(NodeKind::Wildcard, "*", token.span)]);
            }
        }
        self.parse_name_list()
    }

    /// 逗号分隔的字段名列表，至少一个
    fn parse_name_list(&mut self) -> Result<Vec<TokenTree>, ParseError> {
        let mut names = vec![self.parse_name()?];
        while self.match_token(&TokenKind::Comma) {
            self.advance(); // 消费 ','
            names.push(self.parse_name()?);
        }
        Ok(names)
    }

    /// 字段名或实体名：标识符或带引号的字符串
    fn parse_name(&mut self) -> ParseResult {
        let Some(token) = self.peek() else {
            return Err(self.end_of_input("field or entity name"));
        };
        let node = match token.kind {
            TokenKind::Identifier(s) => TokenTree::leaf(NodeKind::Identifier, s, token.span),
            TokenKind::String(s) => TokenTree::leaf(NodeKind::StringLiteral, s, token.span),
            _ => {
                return Err(ParseError::at_position(
                    format!("Expected field or entity name, found {:?}", token.kind),
                    token.span,
                ))
            }
        };
        self.position += 1;
        Ok(node)
    }

    fn parse_from(&mut self) -> ParseResult {
        let keyword = self.expect(TokenKind::From)?;
        let entity = self.parse_name()?;
        Ok(TokenTree::node(
            NodeKind::From,
            "FROM",
            keyword.span.to(entity.span),
            vec![entity],
        ))
    }

    fn parse_where(&mut self) -> ParseResult {
        let keyword = self.expect(TokenKind::Where)?;
        let condition = self.parse_or_expression()?;
        Ok(TokenTree::node(
            NodeKind::Where,
            "WHERE",
            keyword.span.to(condition.span),
            vec![condition],
        ))
    }

    /// 解析OR表达式 (最低优先级)
    ///
    /// 语法: `and_expr (OR and_expr)*`
    fn parse_or_expression(&mut self) -> ParseResult {
        let mut left = self.parse_and_expression()?;

        while self.match_token(&TokenKind::Or) {
            self.advance(); // 消费 OR
            let right = self.parse_and_expression()?;
            let span = left.span.to(right.span);
            left = TokenTree::node(NodeKind::Or, "OR", span, vec![left, right]);
        }

        Ok(left)
    }

    /// 解析AND表达式 (中等优先级)
    ///
    /// 语法: `not_expr (AND not_expr)*`
    fn parse_and_expression(&mut self) -> ParseResult {
        let mut left = self.parse_not_expression()?;

        while self.match_token(&TokenKind::And) {
            self.advance(); // 消费 AND
            let right = self.parse_not_expression()?;
            let span = left.span.to(right.span);
            left = TokenTree::node(NodeKind::And, "AND", span, vec![left, right]);
        }

        Ok(left)
    }

    /// 解析NOT表达式 (较高优先级)
    ///
    /// 语法: `NOT* primary_expr`
    fn parse_not_expression(&mut self) -> ParseResult {
        if self.match_token(&TokenKind::Not) {
            let keyword = self.expect(TokenKind::Not)?;
            let operand = self.parse_not_expression()?; // 允许 NOT 链式调用
            let span = keyword.span.to(operand.span);
            Ok(TokenTree::node(NodeKind::Not, "NOT", span, vec![operand]))
        } else {
            self.parse_primary_expression()
        }
    }

    /// 解析基础表达式 (最高优先级)
    ///
    /// - `(condition)` - 分组表达式
    /// - `field op value` - 比较
    fn parse_primary_expression(&mut self) -> ParseResult {
        if self.match_token(&TokenKind::LParen) {
            let open = self.expect(TokenKind::LParen)?;
            let inner = self.parse_or_expression()?;
            let close = self.expect(TokenKind::RParen)?;
            return Ok(TokenTree::node(
                NodeKind::OpenParen,
                "(",
                open.span.to(close.span),
                vec![inner],
            ));
        }

        let field = self.parse_name()?;
        let symbol = match self.peek() {
            Some(token) => token.kind.comparator_symbol().ok_or_else(|| {
                ParseError::at_position(
                    format!("Expected comparison operator, found {:?}", token.kind),
                    token.span,
                )
            })?,
            None => return Err(self.end_of_input("comparison operator")),
        };
        self.position += 1;
        let value = self.parse_literal()?;
        let span = field.span.to(value.span);
        Ok(TokenTree::node(NodeKind::Operator, symbol, span, vec![field, value]))
    }

    fn parse_literal(&mut self) -> ParseResult {
        let Some(token) = self.peek() else {
            return Err(self.end_of_input("literal value"));
        };
        let (kind, text) = match &token.kind {
            TokenKind::String(s) => (NodeKind::StringLiteral, *s),
            TokenKind::Integer(s) => (NodeKind::IntegerLiteral, *s),
            TokenKind::Decimal(s) => (NodeKind::DecimalLiteral, *s),
            TokenKind::Boolean(s) => (NodeKind::BooleanLiteral, *s),
            TokenKind::Date(s) => (NodeKind::DateLiteral, *s),
            TokenKind::DateTime(s) => (NodeKind::DateTimeLiteral, *s),
            TokenKind::HostExpression(s) => (NodeKind::HostExpressionLiteral, *s),
            TokenKind::Identifier(s) => (NodeKind::Identifier, *s),
            TokenKind::Null => (NodeKind::NullLiteral, "NULL"),
            _ => {
                return Err(ParseError::at_position(
                    format!("Expected literal value, found {:?}", token.kind),
                    token.span,
                ))
            }
        };
        self.position += 1;
        Ok(TokenTree::leaf(kind, text, token.span))
    }

    fn parse_order_by(&mut self) -> ParseResult {
        let keyword = self.expect(TokenKind::Order)?;
        self.expect(TokenKind::By)?;
        let mut children = self.parse_name_list()?;

        if let Some(token) = self.peek() {
            let word = match token.kind {
                TokenKind::Asc => Some("ASC"),
                TokenKind::Desc => Some("DESC"),
                _ => None,
            };
            if let Some(word) = word {
                self.advance();
                children.push(TokenTree::leaf(NodeKind::AscDesc, word, token.span));
            }
        }

        Ok(TokenTree::node(
            NodeKind::OrderBy,
            "ORDER BY",
            keyword.span.to(self.previous_span()),
            children,
        ))
    }

    /// LIMIT 或 OFFSET 子句，后跟一个整数
    fn parse_paging(&mut self, kind: NodeKind) -> ParseResult {
        let label = if kind == NodeKind::Limit { "LIMIT" } else { "OFFSET" };
        let keyword = self.advance().ok_or_else(|| self.end_of_input(label))?;
        match self.peek() {
            Some(Token { kind: TokenKind::Integer(text), span }) => {
                self.position += 1;
                let count = TokenTree::leaf(NodeKind::IntegerLiteral, *text, *span);
                Ok(TokenTree::node(kind, label, keyword.span.to(*span), vec![count]))
            }
            Some(token) => Err(ParseError::at_position(
                format!("Expected integer after {}, found {:?}", label, token.kind),
                token.span,
            )),
            None => Err(self.end_of_input("integer")),
        }
    }
}

/// 子句关键字的出现顺序，非子句关键字为 0
fn clause_rank(kind: &TokenKind) -> u8 {
    match kind {
        TokenKind::From => 1,
        TokenKind::Where => 2,
        TokenKind::Order => 3,
        TokenKind::Limit => 4,
        TokenKind::Offset => 5,
        _ => 0,
    }
}
