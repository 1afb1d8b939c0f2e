use crate::{Entity, Error, Operator, Result, Value};
use serde::{Deserialize, Serialize};

/// One predicate: `property operator value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpression {
    pub property: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Stable parameter name, defaults to the property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FilterExpression {
    /// Fails when `property` is not a property of `E`.
    pub fn new<E: Entity>(property: &str, operator: Operator) -> Result<Self> {
        let result = Self {
            property: property.into(),
            operator,
            value: None,
            name: None,
        };
        result.check_property::<E>()?;
        Ok(result)
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn parameter_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.property)
    }

    fn check_property<E: Entity>(&self) -> Result<()> {
        if !E::properties().contains(&self.property.as_str()) {
            let error = Error::msg(format!(
                "`{}` is not a property of {}",
                self.property,
                E::table_def().entity
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }

    /// Checks the property and that the bound value fits the operator.
    pub fn validate<E: Entity>(&self) -> Result<()> {
        self.check_property::<E>()?;
        if self.operator == Operator::In
            && self.value.as_ref().is_some_and(|v| !matches!(v, Value::List(..)))
        {
            let error = Error::msg(format!(
                "Operator In on `{}` requires a list value",
                self.property
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }
}
