use serde::{Deserialize, Serialize};

/// Comparison applied by a [`crate::FilterExpression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    StartsWith,
    EndsWith,
    Contains,
    In,
    IsNull,
    IsNotNull,
    IsTrue,
    IsFalse,
}

impl Operator {
    /// Token written between the column and the value.
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::StartsWith | Operator::EndsWith | Operator::Contains => "LIKE",
            Operator::In => "IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::IsTrue => "IS TRUE",
            Operator::IsFalse => "IS FALSE",
        }
    }

    /// Pattern text concatenated before the bound value.
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            Operator::EndsWith | Operator::Contains => Some("%"),
            _ => None,
        }
    }

    /// Pattern text concatenated after the bound value.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Operator::StartsWith | Operator::Contains => Some("%"),
            _ => None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        self.prefix().is_some() || self.suffix().is_some()
    }

    /// Operators that bind no parameter.
    pub fn uses_value(&self) -> bool {
        !matches!(
            self,
            Operator::IsNull | Operator::IsNotNull | Operator::IsTrue | Operator::IsFalse
        )
    }
}

/// Logical connector between filter elements.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AndOr {
    #[default]
    And,
    Or,
}

impl AndOr {
    pub fn sql(&self) -> &'static str {
        match self {
            AndOr::And => "AND",
            AndOr::Or => "OR",
        }
    }
}
