use crate::{Context, Entity, Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

impl OrderDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            OrderDirection::Ascending => "ASC",
            OrderDirection::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByExpression {
    pub property: String,
    #[serde(default)]
    pub direction: OrderDirection,
}

impl OrderByExpression {
    /// Fails when `property` is not a property of `E`.
    pub fn new<E: Entity>(property: &str, direction: OrderDirection) -> Result<Self> {
        let result = Self {
            property: property.into(),
            direction,
        };
        result.validate::<E>()?;
        Ok(result)
    }

    pub fn validate<E: Entity>(&self) -> Result<()> {
        if !E::properties().contains(&self.property.as_str()) {
            let error = Error::msg(format!(
                "Cannot order by `{}`, it is not a property of {}",
                self.property,
                E::table_def().entity
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(default)]
    pub expressions: Vec<OrderByExpression>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, expression: OrderByExpression) -> Self {
        self.expressions.push(expression);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn validate<E: Entity>(&self) -> Result<()> {
        self.expressions
            .iter()
            .try_for_each(OrderByExpression::validate::<E>)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Could not serialize the ordering")
    }

    /// Parses an ordering and validates its properties against `E`.
    pub fn from_json<E: Entity>(json: &str) -> Result<Self> {
        let result: Self = serde_json::from_str(json).with_context(|| {
            format!("Could not deserialize an ordering from `{}`", crate::truncate_long!(json))
        })?;
        result.validate::<E>()?;
        Ok(result)
    }
}

impl From<OrderByExpression> for OrderBy {
    fn from(value: OrderByExpression) -> Self {
        Self {
            expressions: vec![value],
        }
    }
}
