pub mod arrow;
pub mod csv;
pub mod parquet;

pub use csv::{CsvPointsConfig, GeometryFormat, read_points_csv, write_grid_csv};
