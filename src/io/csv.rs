use crate::error::DggsError;
use crate::grid::GridDataset;
use crate::points::PointCollection;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Output encoding for the cell boundary column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFormat {
    /// Well-Known Text format (e.g., "POLYGON((...))")
    Wkt,
    /// GeoJSON format
    GeoJson,
}

/// Configuration for reading a [`PointCollection`] from a CSV file.
#[derive(Debug, Clone)]
pub struct CsvPointsConfig {
    pub longitude_column: String,
    pub latitude_column: String,
    /// Fields to read. `None` reads every non-coordinate column, which
    /// then must all be numeric.
    pub fields: Option<Vec<String>>,
}

impl Default for CsvPointsConfig {
    fn default() -> Self {
        Self {
            longitude_column: "longitude".to_string(),
            latitude_column: "latitude".to_string(),
            fields: None,
        }
    }
}

impl CsvPointsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use non-default coordinate column names.
    pub fn coordinate_columns(
        mut self,
        longitude: impl Into<String>,
        latitude: impl Into<String>,
    ) -> Self {
        self.longitude_column = longitude.into();
        self.latitude_column = latitude.into();
        self
    }

    /// Read only these field columns.
    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, DggsError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| DggsError::CsvError(format!("Column '{}' not found", name)))
}

fn parse_value(raw: &str, column: &str, line: usize) -> Result<f64, DggsError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| {
        DggsError::CsvError(format!(
            "Column '{}' has non-numeric value '{}' on line {}",
            column, raw, line
        ))
    })
}

/// Reads a point collection from a CSV file with coordinate columns.
///
/// Empty cells become missing values (NaN).
///
/// # Example
///
/// ```no_run
/// use pixcell_rs::{CsvPointsConfig, read_points_csv};
///
/// let config = CsvPointsConfig::new()
///     .coordinate_columns("lon", "lat")
///     .fields(vec!["height".into(), "sig0".into()]);
///
/// let points = read_points_csv("pixc.csv", &config).unwrap();
/// ```
pub fn read_points_csv(
    path: impl AsRef<Path>,
    config: &CsvPointsConfig,
) -> Result<PointCollection, DggsError> {
    let file = File::open(path).map_err(|e| DggsError::CsvError(e.to_string()))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| DggsError::CsvError(e.to_string()))?
        .clone();

    let lon_idx = column_index(&headers, &config.longitude_column)?;
    let lat_idx = column_index(&headers, &config.latitude_column)?;

    let field_columns: Vec<(String, usize)> = match &config.fields {
        Some(fields) => fields
            .iter()
            .map(|name| column_index(&headers, name).map(|idx| (name.clone(), idx)))
            .collect::<Result<_, _>>()?,
        None => headers
            .iter()
            .enumerate()
            .filter(|&(idx, _)| idx != lon_idx && idx != lat_idx)
            .map(|(idx, name)| (name.to_string(), idx))
            .collect(),
    };

    let mut longitude = Vec::new();
    let mut latitude = Vec::new();
    let mut fields: BTreeMap<String, Vec<f64>> = field_columns
        .iter()
        .map(|(name, _)| (name.clone(), Vec::new()))
        .collect();

    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| DggsError::CsvError(e.to_string()))?;
        // header is line 1
        let line = line + 2;

        longitude.push(parse_value(
            record.get(lon_idx).unwrap_or(""),
            &config.longitude_column,
            line,
        )?);
        latitude.push(parse_value(
            record.get(lat_idx).unwrap_or(""),
            &config.latitude_column,
            line,
        )?);
        for (name, idx) in &field_columns {
            let value = parse_value(record.get(*idx).unwrap_or(""), name, line)?;
            fields
                .get_mut(name)
                .unwrap_or_else(|| unreachable!("column registered above"))
                .push(value);
        }
    }

    PointCollection::from_columns(longitude, latitude, fields)
}

fn polygon_to_wkt(polygon: &geo_types::Polygon<f64>) -> String {
    use wkt::ToWkt;
    polygon.wkt_string()
}

fn polygon_to_geojson(polygon: &geo_types::Polygon<f64>) -> String {
    let geom = geojson::Geometry::from(polygon);
    geom.to_string()
}

/// Writes an aggregated grid to CSV, one row per cell.
///
/// Columns: `cell_id`, `center_longitude`, `center_latitude`, one column
/// per aggregated field (missing values written as empty cells), and
/// optionally the boundary polygon as WKT or GeoJSON.
pub fn write_grid_csv(
    grid: &GridDataset,
    path: impl AsRef<Path>,
    geometry: Option<GeometryFormat>,
) -> Result<(), DggsError> {
    let file = File::create(path).map_err(|e| DggsError::CsvError(e.to_string()))?;
    let mut writer = csv::Writer::from_writer(file);

    let field_names = grid.field_names();
    let mut header = vec![
        "cell_id".to_string(),
        "center_longitude".to_string(),
        "center_latitude".to_string(),
    ];
    header.extend(field_names.iter().cloned());
    if geometry.is_some() {
        header.push("boundary".to_string());
    }
    writer
        .write_record(&header)
        .map_err(|e| DggsError::CsvError(e.to_string()))?;

    for record in grid.iter() {
        let mut row = vec![
            record.cell_id.to_string(),
            record.center_longitude().to_string(),
            record.center_latitude().to_string(),
        ];
        for name in &field_names {
            row.push(match record.value(name) {
                Some(value) if !value.is_nan() => value.to_string(),
                _ => String::new(),
            });
        }
        match geometry {
            Some(GeometryFormat::Wkt) => row.push(polygon_to_wkt(&record.boundary)),
            Some(GeometryFormat::GeoJson) => row.push(polygon_to_geojson(&record.boundary)),
            None => {}
        }
        writer
            .write_record(&row)
            .map_err(|e| DggsError::CsvError(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| DggsError::CsvError(e.to_string()))?;
    Ok(())
}
