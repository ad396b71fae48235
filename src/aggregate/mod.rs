pub mod interp;

pub use interp::InterpMethod;

use crate::aggregate::interp::ScatterInterpolator;
use crate::dggs::{CellId, CellIndexer, GridSystem};
use crate::error::DggsError;
use crate::grid::CellRecord;
use crate::points::PointCollection;
use geo_types::{Point, Rect, coord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Padding applied to degenerate bounding boxes so the covering-cell
/// enumeration always sees a real polygon.
const BBOX_EPSILON: f64 = 1e-6;

/// How points are reduced onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Group points by cell and average each field. Cheap and
    /// order-independent; cells with no points are never emitted.
    #[default]
    Bin,
    /// Interpolate each field at the centers of every cell covering the
    /// points' bounding box. Smoother but recomputes the full bounding
    /// region and triangulation per call, so its cost grows with both
    /// input size and resolution. Cells are emitted even when all their
    /// interpolated values are missing.
    Interp,
}

/// Reduces a [`PointCollection`] onto a discrete global grid.
///
/// # Example
///
/// ```
/// use pixcell_rs::{Aggregator, GridSystem, PointCollection};
/// use std::collections::BTreeMap;
///
/// # fn main() -> Result<(), pixcell_rs::DggsError> {
/// let mut fields = BTreeMap::new();
/// fields.insert("height".to_string(), vec![1.0, 3.0]);
/// let points = PointCollection::from_columns(
///     vec![10.0, 10.0001],
///     vec![40.0, 40.0001],
///     fields,
/// )?;
///
/// let records = Aggregator::new(GridSystem::H3, 5).aggregate(&points, &["height"])?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].value("height"), Some(2.0));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    grid_system: GridSystem,
    resolution: u8,
    mode: AggregationMode,
    interp_method: InterpMethod,
}

impl Aggregator {
    /// Creates an aggregator in binning mode with linear interpolation as
    /// the fallback method should the mode be switched.
    pub fn new(grid_system: GridSystem, resolution: u8) -> Self {
        Self {
            grid_system,
            resolution,
            mode: AggregationMode::default(),
            interp_method: InterpMethod::default(),
        }
    }

    pub fn mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn interp_method(mut self, method: InterpMethod) -> Self {
        self.interp_method = method;
        self
    }

    /// Aggregates the requested fields, one [`CellRecord`] per cell.
    ///
    /// Output is sorted by cell id, so for binning mode it is independent
    /// of the input point order.
    ///
    /// # Errors
    ///
    /// - [`DggsError::EmptyInput`] if the collection has no points.
    /// - [`DggsError::UnknownField`] if a requested field is absent from
    ///   the schema. Checked before any computation.
    /// - [`DggsError::InvalidResolution`] if the resolution is out of
    ///   range for the grid system.
    pub fn aggregate(
        &self,
        points: &PointCollection,
        fields: &[&str],
    ) -> Result<Vec<CellRecord>, DggsError> {
        if points.is_empty() {
            return Err(DggsError::EmptyInput);
        }
        let columns: Vec<(&str, &[f64])> = fields
            .iter()
            .map(|&name| {
                points
                    .field(name)
                    .map(|column| (name, column))
                    .ok_or_else(|| DggsError::UnknownField(name.to_string()))
            })
            .collect::<Result<_, _>>()?;

        let indexer = self.grid_system.indexer(self.resolution)?;
        match self.mode {
            AggregationMode::Bin => self.bin(points, &columns, indexer.as_ref()),
            AggregationMode::Interp => self.interpolate(points, &columns, indexer.as_ref()),
        }
    }

    /// Aggregates every field in the collection's schema.
    pub fn aggregate_all(&self, points: &PointCollection) -> Result<Vec<CellRecord>, DggsError> {
        self.aggregate(points, &points.field_names())
    }

    fn bin(
        &self,
        points: &PointCollection,
        columns: &[(&str, &[f64])],
        indexer: &dyn CellIndexer,
    ) -> Result<Vec<CellRecord>, DggsError> {
        let assigned: Vec<u64> = points
            .longitude()
            .par_iter()
            .zip(points.latitude().par_iter())
            .map(|(&lon, &lat)| indexer.to_cell(lon, lat).map(|cell| cell.0))
            .collect::<Result<_, _>>()?;

        // Exact per-cell running sums and counts, merged across rayon
        // partitions; the reduction is commutative and associative so the
        // final means do not depend on how the input was split.
        let n_fields = columns.len();
        let groups: HashMap<u64, CellAccumulator> = (0..points.len())
            .into_par_iter()
            .fold(HashMap::new, |mut acc: HashMap<u64, CellAccumulator>, i| {
                let entry = acc
                    .entry(assigned[i])
                    .or_insert_with(|| CellAccumulator::new(n_fields));
                for (j, (_, column)) in columns.iter().enumerate() {
                    entry.add(j, column[i]);
                }
                acc
            })
            .reduce(HashMap::new, |mut merged, partial| {
                for (cell, accumulator) in partial {
                    merged
                        .entry(cell)
                        .and_modify(|existing| existing.merge(&accumulator))
                        .or_insert(accumulator);
                }
                merged
            });

        let mut ids: Vec<u64> = groups.keys().copied().collect();
        ids.sort_unstable();

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let cell = CellId(id);
            let accumulator = &groups[&id];
            let values = columns
                .iter()
                .enumerate()
                .map(|(j, (name, _))| (name.to_string(), accumulator.mean(j)))
                .collect();
            records.push(CellRecord {
                cell_id: cell,
                center: indexer.to_center(cell)?,
                boundary: indexer.to_boundary(cell)?,
                values,
            });
        }
        Ok(records)
    }

    fn interpolate(
        &self,
        points: &PointCollection,
        columns: &[(&str, &[f64])],
        indexer: &dyn CellIndexer,
    ) -> Result<Vec<CellRecord>, DggsError> {
        // points is non-empty here, checked in aggregate
        let rect = points.bounding_rect().ok_or(DggsError::EmptyInput)?;
        let region = inflate_degenerate(rect).to_polygon();

        let mut cells = indexer.cells_covering_region(&region)?;
        // The polygon fill can be tolerance-sensitive at the border, so
        // union in the cells of the input points themselves. Coverage must
        // be over-inclusive, never dropping a cell.
        for (&lon, &lat) in points.longitude().iter().zip(points.latitude().iter()) {
            cells.push(indexer.to_cell(lon, lat)?);
        }
        cells.sort_unstable();
        cells.dedup();

        let centers: Vec<Point<f64>> = cells
            .iter()
            .map(|&cell| indexer.to_center(cell))
            .collect::<Result<_, _>>()?;

        let interpolator = ScatterInterpolator::new(points.longitude(), points.latitude())?;
        let estimates: Vec<Vec<f64>> = columns
            .iter()
            .map(|(_, column)| interpolator.evaluate(column, &centers, self.interp_method))
            .collect();

        let mut records = Vec::with_capacity(cells.len());
        for (i, (&cell, center)) in cells.iter().zip(centers.into_iter()).enumerate() {
            let values = columns
                .iter()
                .enumerate()
                .map(|(j, (name, _))| (name.to_string(), estimates[j][i]))
                .collect();
            records.push(CellRecord {
                cell_id: cell,
                center,
                boundary: indexer.to_boundary(cell)?,
                values,
            });
        }
        Ok(records)
    }
}

/// Per-cell running sums and counts, one slot per requested field.
///
/// Only the mean is derived today; keeping (sum, count) leaves room for
/// other statistics without touching the grouping pass.
#[derive(Debug, Clone)]
struct CellAccumulator {
    sums: Vec<f64>,
    counts: Vec<u64>,
}

impl CellAccumulator {
    fn new(n_fields: usize) -> Self {
        Self {
            sums: vec![0.0; n_fields],
            counts: vec![0; n_fields],
        }
    }

    fn add(&mut self, field: usize, value: f64) {
        // NaN marks a missing measurement, not a zero
        if !value.is_nan() {
            self.sums[field] += value;
            self.counts[field] += 1;
        }
    }

    fn merge(&mut self, other: &Self) {
        for (sum, &other_sum) in self.sums.iter_mut().zip(other.sums.iter()) {
            *sum += other_sum;
        }
        for (count, &other_count) in self.counts.iter_mut().zip(other.counts.iter()) {
            *count += other_count;
        }
    }

    fn mean(&self, field: usize) -> f64 {
        if self.counts[field] == 0 {
            f64::NAN
        } else {
            self.sums[field] / self.counts[field] as f64
        }
    }
}

fn inflate_degenerate(rect: Rect<f64>) -> Rect<f64> {
    let (mut min, mut max) = (rect.min(), rect.max());
    if max.x - min.x < BBOX_EPSILON {
        min.x -= BBOX_EPSILON;
        max.x += BBOX_EPSILON;
    }
    if max.y - min.y < BBOX_EPSILON {
        min.y -= BBOX_EPSILON;
        max.y += BBOX_EPSILON;
    }
    Rect::new(coord! { x: min.x, y: min.y }, coord! { x: max.x, y: max.y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn two_cluster_points() -> PointCollection {
        let mut fields = BTreeMap::new();
        fields.insert("height".to_string(), vec![1.0, 3.0, 10.0, 20.0]);
        PointCollection::from_columns(
            vec![10.0, 10.0, 50.0, 50.0],
            vec![40.0, 40.0, 10.0, 10.0],
            fields,
        )
        .unwrap()
    }

    #[test]
    fn test_bin_two_clusters_mean() -> Result<(), DggsError> {
        for grid_system in [GridSystem::H3, GridSystem::Healpix] {
            let records = Aggregator::new(grid_system, 5)
                .aggregate(&two_cluster_points(), &["height"])?;

            assert_eq!(records.len(), 2);
            let mut means: Vec<f64> = records
                .iter()
                .map(|r| r.value("height").unwrap())
                .collect();
            means.sort_by(f64::total_cmp);
            assert_eq!(means, vec![2.0, 15.0]);
        }
        Ok(())
    }

    #[test]
    fn test_bin_order_invariant() -> Result<(), DggsError> {
        let points = two_cluster_points();
        let mut fields = BTreeMap::new();
        fields.insert("height".to_string(), vec![20.0, 10.0, 3.0, 1.0]);
        let reversed = PointCollection::from_columns(
            vec![50.0, 50.0, 10.0, 10.0],
            vec![10.0, 10.0, 40.0, 40.0],
            fields,
        )
        .unwrap();

        let aggregator = Aggregator::new(GridSystem::H3, 5);
        let a = aggregator.aggregate(&points, &["height"])?;
        let b = aggregator.aggregate(&reversed, &["height"])?;

        assert_eq!(a.len(), b.len());
        for (ra, rb) in a.iter().zip(b.iter()) {
            assert_eq!(ra.cell_id, rb.cell_id);
            let (va, vb) = (ra.value("height").unwrap(), rb.value("height").unwrap());
            assert!((va - vb).abs() < 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_bin_one_record_per_distinct_cell() -> Result<(), DggsError> {
        let points = two_cluster_points();
        let indexer = GridSystem::H3.indexer(5)?;
        let mut distinct: Vec<CellId> = points
            .longitude()
            .iter()
            .zip(points.latitude().iter())
            .map(|(&lon, &lat)| indexer.to_cell(lon, lat).unwrap())
            .collect();
        distinct.sort_unstable();
        distinct.dedup();

        let records = Aggregator::new(GridSystem::H3, 5).aggregate(&points, &["height"])?;
        assert_eq!(records.len(), distinct.len());
        for (record, cell) in records.iter().zip(distinct.iter()) {
            assert_eq!(record.cell_id, *cell);
        }
        Ok(())
    }

    #[test]
    fn test_bin_skips_missing_values() -> Result<(), DggsError> {
        let mut fields = BTreeMap::new();
        fields.insert("height".to_string(), vec![2.0, f64::NAN, 4.0]);
        fields.insert("sig0".to_string(), vec![f64::NAN, f64::NAN, f64::NAN]);
        let points = PointCollection::from_columns(
            vec![10.0, 10.0, 10.0],
            vec![40.0, 40.0, 40.0],
            fields,
        )
        .unwrap();

        let records =
            Aggregator::new(GridSystem::H3, 5).aggregate(&points, &["height", "sig0"])?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value("height"), Some(3.0));
        assert!(records[0].value("sig0").unwrap().is_nan());
        Ok(())
    }

    #[test]
    fn test_empty_input_rejected() {
        let result =
            Aggregator::new(GridSystem::H3, 5).aggregate(&PointCollection::default(), &[]);
        assert_eq!(result.unwrap_err(), DggsError::EmptyInput);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result =
            Aggregator::new(GridSystem::H3, 5).aggregate(&two_cluster_points(), &["wse"]);
        assert_eq!(result.unwrap_err(), DggsError::UnknownField("wse".to_string()));
    }

    #[test]
    fn test_interp_nearest_single_point() -> Result<(), DggsError> {
        let mut fields = BTreeMap::new();
        fields.insert("height".to_string(), vec![7.5]);
        let points =
            PointCollection::from_columns(vec![10.0], vec![40.0], fields).unwrap();

        for grid_system in [GridSystem::H3, GridSystem::Healpix] {
            let records = Aggregator::new(grid_system, 6)
                .mode(AggregationMode::Interp)
                .interp_method(InterpMethod::Nearest)
                .aggregate(&points, &["height"])?;

            assert!(!records.is_empty());
            for record in &records {
                assert_eq!(record.value("height"), Some(7.5));
            }
        }
        Ok(())
    }

    #[test]
    fn test_interp_linear_constant_field() -> Result<(), DggsError> {
        let mut fields = BTreeMap::new();
        fields.insert("height".to_string(), vec![5.0, 5.0, 5.0, 5.0]);
        let points = PointCollection::from_columns(
            vec![10.0, 10.5, 10.5, 10.0],
            vec![40.0, 40.0, 40.5, 40.5],
            fields,
        )
        .unwrap();

        let records = Aggregator::new(GridSystem::H3, 6)
            .mode(AggregationMode::Interp)
            .aggregate(&points, &["height"])?;

        let inside: Vec<f64> = records
            .iter()
            .filter_map(|r| r.value("height"))
            .filter(|v| !v.is_nan())
            .collect();
        assert!(!inside.is_empty());
        for value in inside {
            assert!((value - 5.0).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_interp_emits_missing_border_cells() -> Result<(), DggsError> {
        // a thin diagonal of samples leaves covering cells outside the
        // convex hull, which must still be emitted with missing values
        let mut fields = BTreeMap::new();
        fields.insert("height".to_string(), vec![1.0, 2.0, 3.0]);
        let points = PointCollection::from_columns(
            vec![10.0, 10.5, 11.0],
            vec![40.0, 40.5, 41.0],
            fields,
        )
        .unwrap();

        let records = Aggregator::new(GridSystem::H3, 6)
            .mode(AggregationMode::Interp)
            .aggregate(&points, &["height"])?;

        assert!(records.iter().any(|r| r.value("height").unwrap().is_nan()));
        Ok(())
    }

    #[test]
    fn test_interp_covers_all_observed_cells() -> Result<(), DggsError> {
        let points = two_cluster_points();
        let records = Aggregator::new(GridSystem::Healpix, 4)
            .mode(AggregationMode::Interp)
            .interp_method(InterpMethod::Nearest)
            .aggregate(&points, &["height"])?;

        let indexer = GridSystem::Healpix.indexer(4)?;
        for (&lon, &lat) in points.longitude().iter().zip(points.latitude().iter()) {
            let cell = indexer.to_cell(lon, lat)?;
            assert!(records.iter().any(|r| r.cell_id == cell));
        }
        Ok(())
    }

    #[test]
    fn test_inflate_degenerate_rect() {
        let rect = Rect::new(coord! { x: 10.0, y: 40.0 }, coord! { x: 10.0, y: 40.0 });
        let inflated = inflate_degenerate(rect);
        assert!(inflated.width() > 0.0);
        assert!(inflated.height() > 0.0);

        let wide = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        assert_eq!(inflate_degenerate(wide), wide);
    }
}
