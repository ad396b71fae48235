use crate::error::DggsError;
use crate::points::PointCollection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the six recognized comparison operators.
///
/// Names follow the spelling used in caller configuration: `eq`, `ne`,
/// `gt`, `ge`, `lt`, `le`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// Parses an operator name, failing with
    /// [`DggsError::UnsupportedOperator`] for anything outside the six.
    pub fn parse(name: &str) -> Result<Self, DggsError> {
        match name {
            "eq" => Ok(CompareOp::Eq),
            "ne" => Ok(CompareOp::Ne),
            "gt" => Ok(CompareOp::Gt),
            "ge" => Ok(CompareOp::Ge),
            "lt" => Ok(CompareOp::Lt),
            "le" => Ok(CompareOp::Le),
            other => Err(DggsError::UnsupportedOperator(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
        }
    }

    /// Evaluates `value <op> threshold` with IEEE semantics, so a NaN value
    /// fails every comparison except `ne`.
    pub fn evaluate(self, value: f64, threshold: f64) -> bool {
        match self {
            CompareOp::Eq => value == threshold,
            CompareOp::Ne => value != threshold,
            CompareOp::Gt => value > threshold,
            CompareOp::Ge => value >= threshold,
            CompareOp::Lt => value < threshold,
            CompareOp::Le => value <= threshold,
        }
    }
}

/// A single per-field predicate: operator name plus numeric threshold.
///
/// Kept as plain data so a conditions mapping deserializes straight from
/// caller configuration, e.g. `{"sig0": {"operator": "ge", "threshold": 20}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub operator: String,
    pub threshold: f64,
}

impl FilterCondition {
    pub fn new(operator: impl Into<String>, threshold: f64) -> Self {
        Self {
            operator: operator.into(),
            threshold,
        }
    }
}

/// A mapping from field name to the condition applied to it.
pub type Conditions = BTreeMap<String, FilterCondition>;

#[derive(Debug, Clone)]
struct CompiledCondition {
    field: String,
    op: CompareOp,
    threshold: f64,
}

/// Validated set of per-field predicates, combined with logical AND.
///
/// Validation happens once, eagerly, in [`ConditionFilter::validate`], so a
/// misconfigured field name or operator fails before any point is touched.
///
/// # Example
///
/// ```
/// use pixcell_rs::{ConditionFilter, Conditions, FilterCondition, PointCollection};
/// use std::collections::BTreeMap;
///
/// # fn main() -> Result<(), pixcell_rs::DggsError> {
/// let mut fields = BTreeMap::new();
/// fields.insert("sig0".to_string(), vec![5.0, 20.0, 25.0, 19.9]);
/// let points = PointCollection::from_columns(
///     vec![10.0, 10.1, 10.2, 10.3],
///     vec![40.0, 40.1, 40.2, 40.3],
///     fields,
/// )?;
///
/// let mut conditions = Conditions::new();
/// conditions.insert("sig0".to_string(), FilterCondition::new("ge", 20.0));
///
/// let filter = ConditionFilter::validate(&conditions, &points)?;
/// let kept = filter.apply(&points)?;
/// assert_eq!(kept.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConditionFilter {
    compiled: Vec<CompiledCondition>,
}

impl ConditionFilter {
    /// Compiles `conditions` against the collection's schema.
    ///
    /// # Errors
    ///
    /// - [`DggsError::SchemaError`] if a condition names a field absent
    ///   from the collection.
    /// - [`DggsError::UnsupportedOperator`] if an operator name is not one
    ///   of the recognized six.
    pub fn validate(
        conditions: &Conditions,
        points: &PointCollection,
    ) -> Result<Self, DggsError> {
        let mut compiled = Vec::with_capacity(conditions.len());
        for (field, condition) in conditions {
            if !points.has_field(field) {
                return Err(DggsError::SchemaError(format!(
                    "condition references field '{}' which is not in the schema ({})",
                    field,
                    points.field_names().join(", ")
                )));
            }
            compiled.push(CompiledCondition {
                field: field.clone(),
                op: CompareOp::parse(&condition.operator)?,
                threshold: condition.threshold,
            });
        }

        Ok(Self { compiled })
    }

    /// Returns a new collection keeping only the points that satisfy every
    /// condition. With no conditions the input is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`DggsError::SchemaError`] if `points` lacks a field this filter was
    /// compiled against. Validation binds the filter to one schema; a
    /// collection with different columns is rejected here rather than
    /// silently skipped.
    pub fn apply(&self, points: &PointCollection) -> Result<PointCollection, DggsError> {
        if self.compiled.is_empty() {
            return Ok(points.clone());
        }

        let mut mask = vec![true; points.len()];
        for condition in &self.compiled {
            let column = points.field(&condition.field).ok_or_else(|| {
                DggsError::SchemaError(format!(
                    "filter was compiled against field '{}' which is not in the schema ({})",
                    condition.field,
                    points.field_names().join(", ")
                ))
            })?;
            for (keep, &value) in mask.iter_mut().zip(column.iter()) {
                *keep = *keep && condition.op.evaluate(value, condition.threshold);
            }
        }

        Ok(points.retain_masked(&mask))
    }
}

/// Validates `conditions` and applies them in one step.
pub fn filter_points(
    points: &PointCollection,
    conditions: &Conditions,
) -> Result<PointCollection, DggsError> {
    let filter = ConditionFilter::validate(conditions, points)?;
    filter.apply(points)
}
