use crate::{
    AndOr, Context, Entity, FilterExpression, FilterSegment, Operator, Result, Value,
};
use serde::{Deserialize, Serialize};

/// Ordered list of segments, serializable so it can travel between processes.
///
/// # Examples
/// ```rust,ignore
/// let filter = Filter::new()
///     .and(FilterSegment::new(
///         FilterExpression::new::<Customer>("name", Operator::StartsWith)?.value("Jo"),
///     ))
///     .or(FilterSegment::new(
///         FilterExpression::new::<Customer>("id", Operator::In)?.value(vec![1i64, 2, 3]),
///     ));
/// let json = filter.to_json()?;
/// assert_eq!(Filter::from_json::<Customer>(&json)?, filter);
/// ```
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub segments: Vec<FilterSegment>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, segment: FilterSegment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn and(self, segment: FilterSegment) -> Self {
        self.push(segment.joined_by(AndOr::And))
    }

    pub fn or(self, segment: FilterSegment) -> Self {
        self.push(segment.joined_by(AndOr::Or))
    }

    /// Appends the segments of `other` after the current ones.
    pub fn merge(mut self, other: Filter) -> Self {
        self.segments.extend(other.segments);
        self
    }

    /// Equality on every non-null property of `entity`, all joined by `AND`.
    pub fn from_entity<E: Entity>(entity: &E) -> Self {
        let mut segment = FilterSegment::default();
        for (property, value) in entity.row() {
            if value.is_null() {
                continue;
            }
            segment.expressions.push((
                FilterExpression {
                    property: property.into(),
                    operator: Operator::Equal,
                    value: Some(value),
                    name: None,
                },
                AndOr::And,
            ));
        }
        Self::new().push(segment)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(FilterSegment::is_empty)
    }

    pub fn has_segment(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|s| s.name.as_deref() == Some(name))
    }

    pub fn expressions(&self) -> impl Iterator<Item = &FilterExpression> {
        self.segments.iter().flat_map(FilterSegment::iter)
    }

    /// Replaces the value of every expression whose parameter name is `name`.
    ///
    /// Returns how many expressions were updated.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<Value>) -> usize {
        let value = value.into();
        let mut replaced = 0;
        for segment in &mut self.segments {
            for (expression, _) in &mut segment.expressions {
                if expression.parameter_name() == name {
                    expression.value = Some(value.clone());
                    replaced += 1;
                }
            }
        }
        replaced
    }

    pub fn validate<E: Entity>(&self) -> Result<()> {
        self.expressions().try_for_each(FilterExpression::validate::<E>)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Could not serialize the filter")
    }

    /// Parses a filter and validates its properties against `E`.
    pub fn from_json<E: Entity>(json: &str) -> Result<Self> {
        let result: Self = serde_json::from_str(json).with_context(|| {
            format!("Could not deserialize a filter from `{}`", crate::truncate_long!(json))
        })?;
        result.validate::<E>()?;
        Ok(result)
    }
}
