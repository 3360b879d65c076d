//! Translator that renders queries through sea-query, for PostgreSQL,
//! MySQL and SQLite.

use sea_query::{
    Asterisk, Expr, Iden, MysqlQueryBuilder, Order, PostgresQueryBuilder, SelectStatement, SimpleExpr,
    SqliteQueryBuilder, Value as SqlValue,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

use super::{TranslateError, TranslateResult, Translator};
use crate::ast::{EntityType, Field};
use crate::config::DsqlConfig;
use crate::operator::{Direction, Operator};
use crate::value::{unescape, DateTimeValue, Value};

/// Target SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    MySql,
    Sqlite,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "mysql" => Ok(Backend::MySql),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Postgres => "postgres",
            Backend::MySql => "mysql",
            Backend::Sqlite => "sqlite",
        })
    }
}

/// Table identifier for sea-query
#[derive(Debug, Clone)]
struct TableName(String);

impl Iden for TableName {
    fn unquoted(&self, s: &mut dyn fmt::Write) {
        let _ = s.write_str(&self.0);
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone)]
struct ColumnName(String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn fmt::Write) {
        let _ = s.write_str(&self.0);
    }
}

#[derive(Debug, Clone, Copy)]
enum Connective {
    And,
    Or,
}

/// One open group of the filter; operands are folded in as they arrive.
#[derive(Debug, Default)]
struct Group {
    expr: Option<SimpleExpr>,
    connective: Option<Connective>,
    negations: usize,
}

/// Builds a `SelectStatement` from the translation callbacks.
pub struct SeaQueryTranslator {
    backend: Backend,
    /// Maps entity names to table names
    table_mapping: HashMap<String, String>,
    select: SelectStatement,
    groups: Vec<Group>,
    pending_not: usize,
}

impl SeaQueryTranslator {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            table_mapping: HashMap::new(),
            select: SelectStatement::new(),
            groups: Vec::new(),
            pending_not: 0,
        }
    }

    pub fn from_config(config: &DsqlConfig) -> Self {
        let mut translator = Self::new(config.backend);
        translator.set_table_mapping(config.table_mapping.clone());
        translator
    }

    /// Set table mapping for entity names
    pub fn set_table_mapping(&mut self, mapping: HashMap<String, String>) {
        self.table_mapping = mapping;
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn set_backend(&mut self, backend: Backend) {
        self.backend = backend;
    }

    /// Get the actual table name for an entity
    fn table_name(&self, entity: &str) -> String {
        self.table_mapping
            .get(entity)
            .cloned()
            .unwrap_or_else(|| entity.to_lowercase())
    }

    fn push_operand(&mut self, mut expr: SimpleExpr) {
        for _ in 0..std::mem::take(&mut self.pending_not) {
            expr = expr.not();
        }
        if self.groups.is_empty() {
            self.groups.push(Group::default());
        }
        let Some(group) = self.groups.last_mut() else {
            return;
        };
        group.expr = Some(match (group.expr.take(), group.connective.take()) {
            (Some(left), Some(Connective::Or)) => left.or(expr),
            (Some(left), _) => left.and(expr),
            (None, _) => expr,
        });
    }

    fn set_connective(&mut self, connective: Connective) {
        if let Some(group) = self.groups.last_mut() {
            group.connective = Some(connective);
        }
    }

    /// Compile a comparison operation
    fn compile_comparison(&self, operator: Operator, field: &Field, value: &Value) -> Result<SimpleExpr, TranslateError> {
        let col = Expr::col(ColumnName(field.name.clone()));
        let unsupported = || TranslateError::UnsupportedOperator {
            operator,
            value: value.render(),
        };

        if value.is_null() {
            return match operator {
                Operator::Eq => Ok(col.is_null()),
                Operator::Neq => Ok(col.is_not_null()),
                _ => Err(unsupported()),
            };
        }

        let expr = match operator {
            Operator::Like => match value {
                Value::Str(pattern) => col.like(plain_text(pattern)),
                _ => return Err(unsupported()),
            },
            Operator::Eq => col.eq(literal_to_expr(value)?),
            Operator::Neq => col.ne(literal_to_expr(value)?),
            Operator::Gt => col.gt(literal_to_expr(value)?),
            Operator::Lt => col.lt(literal_to_expr(value)?),
            Operator::Gte => col.gte(literal_to_expr(value)?),
            Operator::Lte => col.lte(literal_to_expr(value)?),
        };
        Ok(expr)
    }

    fn render(&self) -> String {
        match self.backend {
            Backend::Postgres => self.select.to_string(PostgresQueryBuilder),
            Backend::MySql => self.select.to_string(MysqlQueryBuilder),
            Backend::Sqlite => self.select.to_string(SqliteQueryBuilder),
        }
    }
}

impl Default for SeaQueryTranslator {
    fn default() -> Self {
        Self::new(Backend::default())
    }
}

fn bound<V: Into<SqlValue>>(value: V) -> SimpleExpr {
    SimpleExpr::Value(value.into())
}

/// Convert a literal to a sea-query expression. Identifiers and host
/// expressions are passed through as raw SQL.
fn literal_to_expr(value: &Value) -> Result<SimpleExpr, TranslateError> {
    match value {
        Value::Str(s) => Ok(bound(plain_text(s))),
        Value::Int(n) => Ok(bound(*n)),
        Value::Num(d) => Ok(bound(*d)),
        Value::Bool(b) => Ok(bound(*b)),
        Value::Date(d) => Ok(bound(*d)),
        Value::DateTime(DateTimeValue::Local(dt)) => Ok(bound(*dt)),
        Value::DateTime(DateTimeValue::Offset(dt)) => Ok(bound(*dt)),
        Value::Identifier(s) | Value::HostExpression(s) => Ok(Expr::cust(s.as_str())),
        Value::Null | Value::Unknown(_) => Err(TranslateError::UnsupportedValue(value.render())),
    }
}

/// Plain text of a string literal; sea-query applies the backend's own escaping.
fn plain_text(s: &str) -> String {
    unescape(s, '\'')
}

impl Translator for SeaQueryTranslator {
    fn begin_fields(&mut self, fields: &[Field]) -> TranslateResult {
        for field in fields {
            if field.is_wildcard() {
                self.select.column(Asterisk);
            } else {
                self.select.column(ColumnName(field.name.clone()));
            }
        }
        Ok(())
    }

    fn from(&mut self, entity: &EntityType) -> TranslateResult {
        let table = self.table_name(&entity.name);
        debug!(entity = %entity.name, %table, "resolved table");
        self.select.from(TableName(table));
        Ok(())
    }

    fn begin_filter(&mut self) -> TranslateResult {
        self.groups.clear();
        self.groups.push(Group::default());
        self.pending_not = 0;
        Ok(())
    }

    fn comparison(&mut self, operator: Operator, field: &Field, value: &Value) -> TranslateResult {
        let expr = self.compile_comparison(operator, field, value)?;
        trace!(field = %field.name, %operator, "comparison");
        self.push_operand(expr);
        Ok(())
    }

    fn begin_group(&mut self) -> TranslateResult {
        let negations = std::mem::take(&mut self.pending_not);
        self.groups.push(Group {
            negations,
            ..Group::default()
        });
        Ok(())
    }

    fn end_group(&mut self) -> TranslateResult {
        if let Some(group) = self.groups.pop() {
            if let Some(mut expr) = group.expr {
                for _ in 0..group.negations {
                    expr = expr.not();
                }
                self.push_operand(expr);
            }
        }
        Ok(())
    }

    fn and(&mut self) -> TranslateResult {
        self.set_connective(Connective::And);
        Ok(())
    }

    fn or(&mut self) -> TranslateResult {
        self.set_connective(Connective::Or);
        Ok(())
    }

    fn not(&mut self) -> TranslateResult {
        self.pending_not += 1;
        Ok(())
    }

    fn order_by(&mut self, fields: &[Field], direction: Option<Direction>) -> TranslateResult {
        let order = match direction {
            Some(Direction::Desc) => Order::Desc,
            _ => Order::Asc,
        };
        for field in fields {
            self.select.order_by(ColumnName(field.name.clone()), order.clone());
        }
        Ok(())
    }

    fn limit(&mut self, limit: u64) -> TranslateResult {
        self.select.limit(limit);
        Ok(())
    }

    fn offset(&mut self, offset: u64) -> TranslateResult {
        self.select.offset(offset);
        Ok(())
    }

    fn result(&mut self) -> String {
        // 只剩根分组
        while self.groups.len() > 1 {
            self.end_group().ok();
        }
        if let Some(filter) = self.groups.pop().and_then(|g| g.expr) {
            self.select.and_where(filter);
        }
        let sql = self.render();
        self.select = SelectStatement::new();
        self.pending_not = 0;
        sql
    }
}
