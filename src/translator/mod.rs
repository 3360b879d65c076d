//! Rendering a [`Query`] into a backend's native syntax.
//!
//! The query model drives the traversal: [`Query::translate`] walks the
//! model and invokes the [`Translator`] callbacks in a fixed order, so a
//! backend adapter only decides how each piece is spelled.
//!
//! ```text
//! begin_fields → from → [begin_filter → <expression>] → [order_by] → [limit] → [offset] → result
//!
//! <expression>:
//!   Comparison  → comparison
//!   And / Or    → begin_group, <left>, and | or, <right>, end_group
//!   Not         → not, <operand>    (a bare comparison operand is wrapped in a group)
//! ```
//!
//! Compound nodes are always grouped: the tree no longer remembers the
//! source parentheses, and grouping every AND/OR keeps the emitted text
//! equivalent to the tree. A filter made of a single comparison is not
//! grouped.

pub mod default;
pub mod sea;

pub use default::DefaultTranslator;
pub use sea::{Backend, SeaQueryTranslator};

use thiserror::Error;
use tracing::warn;

use crate::ast::{EntityType, Expression, Field};
use crate::operator::{Direction, Operator};
use crate::query::Query;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    #[error("Operator {operator} is not supported with value {value}")]
    UnsupportedOperator { operator: Operator, value: String },

    #[error("Value is not supported by this backend: {0}")]
    UnsupportedValue(String),
}

pub type TranslateResult = Result<(), TranslateError>;

/// Emission protocol implemented by backend adapters.
pub trait Translator {
    fn begin_fields(&mut self, fields: &[Field]) -> TranslateResult;

    fn from(&mut self, entity: &EntityType) -> TranslateResult;

    fn begin_filter(&mut self) -> TranslateResult;

    fn comparison(&mut self, operator: Operator, field: &Field, value: &Value) -> TranslateResult;

    fn begin_group(&mut self) -> TranslateResult;

    fn end_group(&mut self) -> TranslateResult;

    fn and(&mut self) -> TranslateResult;

    fn or(&mut self) -> TranslateResult;

    fn not(&mut self) -> TranslateResult;

    fn order_by(&mut self, fields: &[Field], direction: Option<Direction>) -> TranslateResult;

    fn limit(&mut self, limit: u64) -> TranslateResult;

    fn offset(&mut self, offset: u64) -> TranslateResult;

    /// Take the accumulated text. The translator is reset afterwards.
    fn result(&mut self) -> String;
}

impl Query {
    /// Drive `translator` through this query and return its output. On
    /// error the translator is still reset.
    pub fn translate<T: Translator + ?Sized>(&self, translator: &mut T) -> Result<String, TranslateError> {
        match self.emit(translator) {
            Ok(()) => Ok(translator.result()),
            Err(e) => {
                translator.result();
                Err(e)
            }
        }
    }

    fn emit<T: Translator + ?Sized>(&self, translator: &mut T) -> TranslateResult {
        translator.begin_fields(self.fields())?;
        translator.from(self.source())?;

        if let Some(filter) = self.filter() {
            translator.begin_filter()?;
            filter.translate(translator)?;
        }

        if !self.order_by().is_empty() {
            translator.order_by(self.order_by(), self.direction())?;
        } else if let Some(direction) = self.direction() {
            warn!(%direction, "sort direction without ORDER BY fields is dropped");
        }

        if let Some(limit) = self.limit() {
            translator.limit(limit)?;
        }
        if let Some(offset) = self.offset() {
            translator.offset(offset)?;
        }
        Ok(())
    }
}

impl Expression {
    pub fn translate<T: Translator + ?Sized>(&self, translator: &mut T) -> TranslateResult {
        match self {
            Expression::Comparison {
                operator,
                field,
                value,
            } => translator.comparison(*operator, field, value),
            Expression::And(left, right) => {
                translator.begin_group()?;
                left.translate(translator)?;
                translator.and()?;
                right.translate(translator)?;
                translator.end_group()
            }
            Expression::Or(left, right) => {
                translator.begin_group()?;
                left.translate(translator)?;
                translator.or()?;
                right.translate(translator)?;
                translator.end_group()
            }
            Expression::Not(operand) => {
                translator.not()?;
                if let Expression::Comparison { .. } = operand.as_ref() {
                    translator.begin_group()?;
                    operand.translate(translator)?;
                    translator.end_group()
                } else {
                    operand.translate(translator)
                }
            }
        }
    }
}
