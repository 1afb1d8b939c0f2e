use crate::{AndOr, FilterExpression, Operator, SOFT_DELETE_PROPERTY, Value};
use serde::{Deserialize, Serialize};

/// Name of the segment that hides soft deleted rows.
pub const SOFT_DELETE_SEGMENT: &str = "SoftDelete";

/// A parenthesized group of expressions.
///
/// Each expression carries the connector that joins it to the expression before
/// it, the connector of the first one is never written. The segment's own
/// `joined_by` joins it to the previous segment of the filter in the same way.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub joined_by: AndOr,
    #[serde(default)]
    pub expressions: Vec<(FilterExpression, AndOr)>,
}

impl FilterSegment {
    pub fn new(expression: FilterExpression) -> Self {
        Self {
            expressions: vec![(expression, AndOr::And)],
            ..Default::default()
        }
    }

    /// Hides the rows flagged as deleted.
    pub fn soft_delete() -> Self {
        Self::new(FilterExpression {
            property: SOFT_DELETE_PROPERTY.into(),
            operator: Operator::Equal,
            value: Some(Value::Boolean(Some(false))),
            name: None,
        })
        .named(SOFT_DELETE_SEGMENT)
    }

    pub fn and(mut self, expression: FilterExpression) -> Self {
        self.expressions.push((expression, AndOr::And));
        self
    }

    pub fn or(mut self, expression: FilterExpression) -> Self {
        self.expressions.push((expression, AndOr::Or));
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn joined_by(mut self, joined_by: AndOr) -> Self {
        self.joined_by = joined_by;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterExpression> {
        self.expressions.iter().map(|(e, _)| e)
    }
}
