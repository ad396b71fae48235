use crate::error::DggsError;
use crate::grid::GridDataset;
use geoparquet::writer::{
    GeoParquetRecordBatchEncoder, GeoParquetWriterEncoding, GeoParquetWriterOptionsBuilder,
};
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;

impl GridDataset {
    /// Writes the grid to a GeoParquet file, boundary polygons as WKB.
    pub fn to_geoparquet(&self, path: impl AsRef<Path>) -> Result<(), DggsError> {
        let batch = self.to_record_batch()?;
        let schema = batch.schema();

        let options = GeoParquetWriterOptionsBuilder::default()
            .set_encoding(GeoParquetWriterEncoding::WKB)
            .build();

        let mut encoder = GeoParquetRecordBatchEncoder::try_new(&schema, &options)
            .map_err(|e| DggsError::IoError(e.to_string()))?;

        let file = File::create(path).map_err(|e| DggsError::IoError(e.to_string()))?;
        let mut writer = ArrowWriter::try_new(file, encoder.target_schema(), None)
            .map_err(|e| DggsError::IoError(e.to_string()))?;

        let encoded_batch = encoder
            .encode_record_batch(&batch)
            .map_err(|e| DggsError::IoError(e.to_string()))?;

        writer
            .write(&encoded_batch)
            .map_err(|e| DggsError::IoError(e.to_string()))?;

        let kv_metadata = encoder
            .into_keyvalue()
            .map_err(|e| DggsError::IoError(e.to_string()))?;

        writer.append_key_value_metadata(kv_metadata);
        writer
            .finish()
            .map_err(|e| DggsError::IoError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::dggs::GridSystem;
    use crate::points::PointCollection;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_grid_to_geoparquet() -> Result<(), DggsError> {
        let mut fields = BTreeMap::new();
        fields.insert("height".to_string(), vec![1.0, 3.0, 10.0, 20.0]);
        let points = PointCollection::from_columns(
            vec![10.0, 10.0, 50.0, 50.0],
            vec![40.0, 40.0, 10.0, 10.0],
            fields,
        )
        .unwrap();

        let records = Aggregator::new(GridSystem::H3, 5).aggregate_all(&points)?;
        let grid = GridDataset::build(records, GridSystem::H3, 5, points.attrs())?;

        let dir = tempdir().map_err(|e| DggsError::IoError(e.to_string()))?;
        let path = dir.path().join("grid.parquet");

        grid.to_geoparquet(&path)?;

        assert!(path.exists());
        let metadata = std::fs::metadata(&path).map_err(|e| DggsError::IoError(e.to_string()))?;
        assert!(metadata.len() > 0);
        Ok(())
    }
}
