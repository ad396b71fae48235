use crate::error::DggsError;
use geo_types::{Rect, coord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A global attribute value carried through from the source product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

/// A columnar collection of geolocated point measurements.
///
/// Coordinates are geographic (EPSG:4326) degrees. Every named field is an
/// f64 column aligned with the coordinate arrays; NaN marks a missing value.
///
/// # Example
///
/// ```
/// use pixcell_rs::PointCollection;
/// use std::collections::BTreeMap;
///
/// # fn main() -> Result<(), pixcell_rs::DggsError> {
/// let mut fields = BTreeMap::new();
/// fields.insert("height".to_string(), vec![1.0, 3.0]);
///
/// let points = PointCollection::from_columns(
///     vec![10.0, 10.1],
///     vec![40.0, 40.1],
///     fields,
/// )?;
/// assert_eq!(points.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCollection {
    longitude: Vec<f64>,
    latitude: Vec<f64>,
    fields: BTreeMap<String, Vec<f64>>,
    attrs: BTreeMap<String, AttrValue>,
}

impl PointCollection {
    /// Builds a collection from coordinate and field columns.
    ///
    /// Every field column must have the same length as the coordinate
    /// arrays, otherwise a [`DggsError::SchemaError`] is returned.
    pub fn from_columns(
        longitude: Vec<f64>,
        latitude: Vec<f64>,
        fields: BTreeMap<String, Vec<f64>>,
    ) -> Result<Self, DggsError> {
        if longitude.len() != latitude.len() {
            return Err(DggsError::SchemaError(format!(
                "longitude has {} values but latitude has {}",
                longitude.len(),
                latitude.len()
            )));
        }
        for (name, column) in &fields {
            if column.len() != longitude.len() {
                return Err(DggsError::SchemaError(format!(
                    "field '{}' has {} values but the point dimension has {}",
                    name,
                    column.len(),
                    longitude.len()
                )));
            }
        }

        Ok(Self {
            longitude,
            latitude,
            fields,
            attrs: BTreeMap::new(),
        })
    }

    /// Attaches global attributes, replacing any existing ones.
    pub fn with_attrs(mut self, attrs: BTreeMap<String, AttrValue>) -> Self {
        self.attrs = attrs;
        self
    }

    /// Sets a single global attribute.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Number of points in the collection.
    pub fn len(&self) -> usize {
        self.longitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.longitude.is_empty()
    }

    /// Longitudes in degrees, aligned with [`Self::latitude`].
    pub fn longitude(&self) -> &[f64] {
        &self.longitude
    }

    /// Latitudes in degrees, aligned with [`Self::longitude`].
    pub fn latitude(&self) -> &[f64] {
        &self.latitude
    }

    /// The column for a named field, if present.
    pub fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names, in sorted order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Global attributes carried over from the source product.
    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    /// Axis-aligned bounding rectangle of the coordinates.
    ///
    /// Returns `None` for an empty collection.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        if self.is_empty() {
            return None;
        }

        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for (&lon, &lat) in self.longitude.iter().zip(self.latitude.iter()) {
            min_x = min_x.min(lon);
            max_x = max_x.max(lon);
            min_y = min_y.min(lat);
            max_y = max_y.max(lat);
        }

        Some(Rect::new(
            coord! { x: min_x, y: min_y },
            coord! { x: max_x, y: max_y },
        ))
    }

    /// Returns a new collection keeping only the points where `mask` is true.
    ///
    /// The mask must be aligned with the point dimension.
    pub(crate) fn retain_masked(&self, mask: &[bool]) -> Self {
        debug_assert_eq!(mask.len(), self.len());

        let keep = |column: &[f64]| -> Vec<f64> {
            column
                .iter()
                .zip(mask.iter())
                .filter(|&(_, &m)| m)
                .map(|(&v, _)| v)
                .collect()
        };

        Self {
            longitude: keep(&self.longitude),
            latitude: keep(&self.latitude),
            fields: self
                .fields
                .iter()
                .map(|(name, column)| (name.clone(), keep(column)))
                .collect(),
            attrs: self.attrs.clone(),
        }
    }
}
