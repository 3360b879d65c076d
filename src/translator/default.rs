//! Reference translator emitting generic SQL-like text.
//!
//! `SELECT name,'Billing City' FROM Account WHERE (age < 18 AND grade > 0) ORDER BY name DESC LIMIT 10`

use tracing::trace;

use super::{TranslateResult, Translator};
use crate::ast::{EntityType, Field};
use crate::operator::{Direction, Operator};
use crate::value::Value;

#[derive(Debug, Default, Clone)]
pub struct DefaultTranslator {
    out: String,
}

impl DefaultTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, text: &str) {
        trace!(text, "emit");
        self.out.push_str(text);
    }
}

/// Names containing whitespace or quotes are single-quoted, with any
/// embedded `'` doubled.
fn quote_name(name: &str) -> String {
    if name.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

fn field_list(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| quote_name(&f.name))
        .collect::<Vec<_>>()
        .join(",")
}

impl Translator for DefaultTranslator {
    fn begin_fields(&mut self, fields: &[Field]) -> TranslateResult {
        let text = format!("SELECT {}", field_list(fields));
        self.push(&text);
        Ok(())
    }

    fn from(&mut self, entity: &EntityType) -> TranslateResult {
        let text = format!(" FROM {}", quote_name(&entity.name));
        self.push(&text);
        Ok(())
    }

    fn begin_filter(&mut self) -> TranslateResult {
        self.push(" WHERE ");
        Ok(())
    }

    fn comparison(&mut self, operator: Operator, field: &Field, value: &Value) -> TranslateResult {
        let text = format!(
            "{} {} {}",
            quote_name(&field.name),
            operator.to_symbol(),
            value.render()
        );
        self.push(&text);
        Ok(())
    }

    fn begin_group(&mut self) -> TranslateResult {
        self.push("(");
        Ok(())
    }

    fn end_group(&mut self) -> TranslateResult {
        self.push(")");
        Ok(())
    }

    fn and(&mut self) -> TranslateResult {
        self.push(" AND ");
        Ok(())
    }

    fn or(&mut self) -> TranslateResult {
        self.push(" OR ");
        Ok(())
    }

    fn not(&mut self) -> TranslateResult {
        self.push("NOT ");
        Ok(())
    }

    fn order_by(&mut self, fields: &[Field], direction: Option<Direction>) -> TranslateResult {
        let mut text = format!(" ORDER BY {}", field_list(fields));
        if let Some(direction) = direction {
            text.push(' ');
            text.push_str(direction.to_keyword());
        }
        self.push(&text);
        Ok(())
    }

    fn limit(&mut self, limit: u64) -> TranslateResult {
        self.push(&format!(" LIMIT {}", limit));
        Ok(())
    }

    fn offset(&mut self, offset: u64) -> TranslateResult {
        self.push(&format!(" OFFSET {}", offset));
        Ok(())
    }

    fn result(&mut self) -> String {
        std::mem::take(&mut self.out)
    }
}
