//! 查询模型中与具体语法无关的部分：字段、实体和布尔表达式树

use serde::Serialize;
use std::fmt;

use crate::operator::Operator;
use crate::value::Value;

/// 字段，相等性由名称和类型共同决定
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl Field {
    pub const DEFAULT_TYPE: &'static str = "string";

    pub fn new(name: impl Into<String>) -> Self {
        Self::with_type(name, Self::DEFAULT_TYPE)
    }

    pub fn with_type(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 被查询的实体（数据源）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityType {
    pub name: String,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// 布尔表达式树，叶子节点总是比较运算
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    /// 基础比较运算 `field op value`
    Comparison {
        operator: Operator,
        field: Field,
        value: Value,
    },
    /// 逻辑与运算 (AND)
    And(Box<Expression>, Box<Expression>),
    /// 逻辑或运算 (OR)
    Or(Box<Expression>, Box<Expression>),
    /// 逻辑非运算 (NOT)
    Not(Box<Expression>),
}

impl Expression {
    pub fn comparison(operator: Operator, field: Field, value: impl Into<Value>) -> Self {
        Expression::Comparison {
            operator,
            field,
            value: value.into(),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    pub fn not(operand: Expression) -> Self {
        Expression::Not(Box::new(operand))
    }

    /// AND 或 OR 节点
    pub fn is_compound(&self) -> bool {
        matches!(self, Expression::And(..) | Expression::Or(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_equality_includes_type() {
        assert_eq!(Field::new("age"), Field::with_type("age", "string"));
        assert_ne!(Field::new("age"), Field::with_type("age", "integer"));
        assert!(Field::new("*").is_wildcard());
    }

    #[test]
    fn test_expression_constructors() {
        let age = Expression::comparison(Operator::Lt, Field::new("age"), 18);
        let grade = Expression::comparison(Operator::Gt, Field::new("grade"), 0);
        let both = Expression::and(age.clone(), grade.clone());

        assert!(both.is_compound());
        assert!(!age.is_compound());
        assert!(!Expression::not(both.clone()).is_compound());

        if let Expression::And(left, right) = &both {
            assert_eq!(**left, age);
            assert_eq!(**right, grade);
        } else {
            panic!("Expected AND expression");
        }
    }
}
