//! The assembled query model and its builder.

use serde::Serialize;
use thiserror::Error;

use crate::ast::{EntityType, Expression, Field};
use crate::operator::Direction;

/// A compiled query. Immutable once built; hand it to a
/// [`Translator`](crate::translator::Translator) to render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    fields: Vec<Field>,
    source: EntityType,
    filter: Option<Expression>,
    order_by: Vec<Field>,
    direction: Option<Direction>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Projected fields, in projection order. Never empty.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn source(&self) -> &EntityType {
        &self.source
    }

    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }

    pub fn order_by(&self) -> &[Field] {
        &self.order_by
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("query has no projected fields")]
    MissingFields,
    #[error("query has no source entity")]
    MissingSource,
}

/// Mutable staging area for one [`Query`].
///
/// A builder belongs to a single compilation; create a fresh one per parse.
#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    fields: Vec<Field>,
    source: Option<EntityType>,
    filter: Option<Expression>,
    order_by: Vec<Field>,
    direction: Option<Direction>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, field: Field) -> &mut Self {
        self.fields.push(field);
        self
    }

    pub fn set_type(&mut self, source: EntityType) -> &mut Self {
        self.source = Some(source);
        self
    }

    /// Replaces any filter set before.
    pub fn set_filter(&mut self, filter: Expression) -> &mut Self {
        self.filter = Some(filter);
        self
    }

    pub fn add_order_by_field(&mut self, field: Field) -> &mut Self {
        self.order_by.push(field);
        self
    }

    pub fn set_direction(&mut self, direction: Direction) -> &mut Self {
        self.direction = Some(direction);
        self
    }

    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn set_offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn build(self) -> Result<Query, BuildError> {
        if self.fields.is_empty() {
            return Err(BuildError::MissingFields);
        }
        let source = self.source.ok_or(BuildError::MissingSource)?;
        Ok(Query {
            fields: self.fields,
            source,
            filter: self.filter,
            order_by: self.order_by,
            direction: self.direction,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Operator;

    #[test]
    fn test_build_full_query() {
        let mut builder = Query::builder();
        builder
            .add_field(Field::new("name"))
            .add_field(Field::new("age"))
            .set_type(EntityType::new("Account"))
            .set_filter(Expression::comparison(Operator::Eq, Field::new("age"), 30))
            .add_order_by_field(Field::new("name"))
            .set_direction(Direction::Desc)
            .set_limit(10)
            .set_offset(20);
        let query = builder.build().unwrap();

        assert_eq!(query.fields(), &[Field::new("name"), Field::new("age")]);
        assert_eq!(query.source().name, "Account");
        assert!(query.filter().is_some());
        assert_eq!(query.order_by(), &[Field::new("name")]);
        assert_eq!(query.direction(), Some(Direction::Desc));
        assert_eq!(query.limit(), Some(10));
        assert_eq!(query.offset(), Some(20));
    }

    #[test]
    fn test_build_requires_fields_and_source() {
        let mut builder = QueryBuilder::new();
        builder.set_type(EntityType::new("Account"));
        assert_eq!(builder.build().unwrap_err(), BuildError::MissingFields);

        let mut builder = QueryBuilder::new();
        builder.add_field(Field::new("name"));
        assert_eq!(builder.build().unwrap_err(), BuildError::MissingSource);
    }

    #[test]
    fn test_direction_without_order_fields_is_kept() {
        let mut builder = QueryBuilder::new();
        builder
            .add_field(Field::new("name"))
            .set_type(EntityType::new("Account"))
            .set_direction(Direction::Asc);
        let query = builder.build().unwrap();
        assert!(query.order_by().is_empty());
        assert_eq!(query.direction(), Some(Direction::Asc));
    }
}
