use crate::dggs::{CellId, GridSystem};
use crate::error::DggsError;
use crate::points::AttrValue;
use geo_types::{Point, Polygon};
use std::collections::BTreeMap;

/// One aggregated output row: a cell, its geometry, and one value per
/// aggregated field (NaN = missing).
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub cell_id: CellId,
    pub center: Point<f64>,
    pub boundary: Polygon<f64>,
    pub values: BTreeMap<String, f64>,
}

impl CellRecord {
    pub fn center_longitude(&self) -> f64 {
        self.center.x()
    }

    pub fn center_latitude(&self) -> f64 {
        self.center.y()
    }

    /// The aggregated value for a field, if that field was aggregated.
    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }
}

/// The final cell-indexed collection: records keyed by cell id, tagged with
/// the grid system and resolution, carrying the source's global attributes.
///
/// # Example
///
/// ```
/// use pixcell_rs::{Aggregator, GridDataset, GridSystem, PointCollection};
/// use std::collections::BTreeMap;
///
/// # fn main() -> Result<(), pixcell_rs::DggsError> {
/// let mut fields = BTreeMap::new();
/// fields.insert("height".to_string(), vec![1.0, 3.0]);
/// let points = PointCollection::from_columns(
///     vec![10.0, 10.0],
///     vec![40.0, 40.0],
///     fields,
/// )?;
///
/// let records = Aggregator::new(GridSystem::H3, 5).aggregate(&points, &["height"])?;
/// let grid = GridDataset::build(records, GridSystem::H3, 5, points.attrs())?;
/// assert_eq!(grid.len(), 1);
/// assert_eq!(grid.layer_name(), "h3_05");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GridDataset {
    records: BTreeMap<CellId, CellRecord>,
    grid_system: GridSystem,
    resolution: u8,
    attrs: BTreeMap<String, AttrValue>,
}

impl GridDataset {
    /// Indexes `records` by cell id and attaches the grid metadata.
    ///
    /// Pure assembly, no I/O. Duplicate cell ids within `records` are a
    /// programming error upstream and fail with
    /// [`DggsError::DuplicateCell`].
    pub fn build(
        records: Vec<CellRecord>,
        grid_system: GridSystem,
        resolution: u8,
        attrs: &BTreeMap<String, AttrValue>,
    ) -> Result<Self, DggsError> {
        let mut indexed = BTreeMap::new();
        for record in records {
            let cell_id = record.cell_id;
            if indexed.insert(cell_id, record).is_some() {
                return Err(DggsError::DuplicateCell(cell_id));
            }
        }

        Ok(Self {
            records: indexed,
            grid_system,
            resolution,
            attrs: attrs.clone(),
        })
    }

    pub fn grid_system(&self) -> GridSystem {
        self.grid_system
    }

    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Layer/partition name suffix for writer collaborators, e.g. `h3_05`.
    pub fn layer_name(&self) -> String {
        self.grid_system.layer_name(self.resolution)
    }

    /// Global attributes copied verbatim from the source collection.
    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, cell_id: CellId) -> Option<&CellRecord> {
        self.records.get(&cell_id)
    }

    /// Records in ascending cell-id order.
    pub fn iter(&self) -> impl Iterator<Item = &CellRecord> {
        self.records.values()
    }

    pub fn cell_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.records.keys().copied()
    }

    /// Union of field names across records, in sorted order.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .values()
            .flat_map(|record| record.values.keys().cloned())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
