use crate::error::DggsError;
use crate::grid::GridDataset;
use arrow_array::{Float64Array, RecordBatch, UInt8Array, UInt64Array};
use arrow_schema::{DataType, Field, Schema};
use geoarrow_array::IntoArrow;
use geoarrow_array::array::{PointArray, PolygonArray};
use geoarrow_array::builder::{PointBuilder, PolygonBuilder};
use geoarrow_schema::{Crs, Dimension, Metadata, PointType, PolygonType};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

fn wgs84_metadata() -> Arc<Metadata> {
    let crs = Crs::from_authority_code("EPSG:4326".to_string());
    Arc::new(Metadata::new(crs, None))
}

impl GridDataset {
    /// Converts cell centers to an Arrow PointArray.
    pub fn to_arrow_points(&self) -> PointArray {
        let point = PointType::new(Dimension::XY, wgs84_metadata());
        let mut builder = PointBuilder::with_capacity(point, self.len());

        for record in self.iter() {
            builder.push_point(Some(&record.center));
        }
        builder.finish()
    }

    /// Converts cell boundaries to an Arrow PolygonArray.
    pub fn to_arrow_polygons(&self) -> PolygonArray {
        let poly = PolygonType::new(Dimension::XY, wgs84_metadata());
        let records: Vec<_> = self.iter().collect();
        let polygons: Vec<_> = records
            .par_iter()
            .map(|record| record.boundary.clone())
            .collect();
        PolygonBuilder::from_polygons(&polygons, poly).finish()
    }

    /// Converts the grid to a RecordBatch with cell_id, resolution, center
    /// coordinates, one nullable column per aggregated field (missing
    /// values become nulls), and the boundary geometry.
    ///
    /// The source's global attributes and the grid tags are attached as
    /// schema metadata.
    pub fn to_record_batch(&self) -> Result<RecordBatch, DggsError> {
        let polygon_array = self.to_arrow_polygons();
        let ids: UInt64Array = self.iter().map(|r| Some(r.cell_id.0)).collect();
        let resolutions: UInt8Array = self.iter().map(|_| Some(self.resolution())).collect();
        let lons: Float64Array = self.iter().map(|r| Some(r.center_longitude())).collect();
        let lats: Float64Array = self.iter().map(|r| Some(r.center_latitude())).collect();

        let field_names = self.field_names();
        let field_arrays: Vec<Float64Array> = field_names
            .iter()
            .map(|name| {
                self.iter()
                    .map(|r| r.value(name).filter(|v| !v.is_nan()))
                    .collect()
            })
            .collect();

        let mut metadata: HashMap<String, String> = self
            .attrs()
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();
        metadata.insert("grid_name".to_string(), self.grid_system().to_string());
        metadata.insert("resolution".to_string(), self.resolution().to_string());

        let geometry_field = polygon_array.extension_type().to_field("geometry", false);
        let mut schema_fields = vec![
            Field::new("cell_id", DataType::UInt64, false),
            Field::new("resolution", DataType::UInt8, false),
            Field::new("center_longitude", DataType::Float64, false),
            Field::new("center_latitude", DataType::Float64, false),
        ];
        for name in &field_names {
            schema_fields.push(Field::new(name, DataType::Float64, true));
        }
        schema_fields.push(geometry_field);
        let schema = Schema::new_with_metadata(schema_fields, metadata);

        let mut columns: Vec<arrow_array::ArrayRef> = vec![
            Arc::new(ids),
            Arc::new(resolutions),
            Arc::new(lons),
            Arc::new(lats),
        ];
        for array in field_arrays {
            columns.push(Arc::new(array));
        }
        columns.push(Arc::new(polygon_array.into_arrow()));

        RecordBatch::try_new(Arc::new(schema), columns)
            .map_err(|e| DggsError::IoError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::dggs::GridSystem;
    use crate::points::PointCollection;
    use arrow_array::Array;
    use geoarrow_array::GeoArrowArray;
    use std::collections::BTreeMap;

    fn sample_grid() -> GridDataset {
        let mut fields = BTreeMap::new();
        fields.insert("height".to_string(), vec![1.0, 3.0, 10.0, 20.0]);
        fields.insert("sig0".to_string(), vec![f64::NAN, f64::NAN, 21.0, 23.0]);
        let mut points = PointCollection::from_columns(
            vec![10.0, 10.0, 50.0, 50.0],
            vec![40.0, 40.0, 10.0, 10.0],
            fields,
        )
        .unwrap();
        points.set_attr("cycle_number", 12i64);

        let records = Aggregator::new(GridSystem::H3, 5)
            .aggregate_all(&points)
            .unwrap();
        GridDataset::build(records, GridSystem::H3, 5, points.attrs()).unwrap()
    }

    #[test]
    fn test_to_arrow_points_and_polygons() {
        let grid = sample_grid();
        assert_eq!(grid.to_arrow_points().len(), grid.len());
        assert_eq!(grid.to_arrow_polygons().len(), grid.len());
    }

    #[test]
    fn test_to_record_batch() -> Result<(), DggsError> {
        let grid = sample_grid();
        let batch = grid.to_record_batch()?;

        assert_eq!(batch.num_rows(), grid.len());
        // cell_id, resolution, lon, lat, height, sig0, geometry
        assert_eq!(batch.num_columns(), 7);

        let schema = batch.schema();
        assert_eq!(schema.metadata()["grid_name"], "h3");
        assert_eq!(schema.metadata()["resolution"], "5");
        assert_eq!(schema.metadata()["cycle_number"], "12");
        Ok(())
    }

    #[test]
    fn test_missing_values_become_nulls() -> Result<(), DggsError> {
        let grid = sample_grid();
        let batch = grid.to_record_batch()?;

        let sig0_idx = batch.schema().index_of("sig0").unwrap();
        let sig0 = batch
            .column(sig0_idx)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap()
            .clone();

        // the (10, 40) cluster has no sig0 measurements
        assert_eq!(sig0.null_count(), 1);
        Ok(())
    }
}
