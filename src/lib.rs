//! # pixcell-rs
//!
//! Bins and interpolates satellite-derived point clouds (e.g. SWOT Pixel
//! Cloud products) onto discrete global grid systems: H3 hexagons or
//! HEALPix cells.
//!
//! There are four main entry points.
//!
//! ### 1. `CellIndexer` - Coordinate/Cell Mapping
//!
//! ```
//! use pixcell_rs::GridSystem;
//!
//! # fn main() -> Result<(), pixcell_rs::DggsError> {
//! let indexer = GridSystem::H3.indexer(7)?;
//! let cell = indexer.to_cell(10.0, 40.0)?;
//! println!("{}", cell);
//! let boundary = indexer.to_boundary(cell)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### 2. `ConditionFilter` - Per-Field Predicates
//!
//! ```
//! use pixcell_rs::{Conditions, FilterCondition, PointCollection, filter_points};
//! use std::collections::BTreeMap;
//!
//! # fn main() -> Result<(), pixcell_rs::DggsError> {
//! let mut fields = BTreeMap::new();
//! fields.insert("sig0".to_string(), vec![5.0, 25.0]);
//! let points = PointCollection::from_columns(vec![10.0, 10.1], vec![40.0, 40.1], fields)?;
//!
//! let mut conditions = Conditions::new();
//! conditions.insert("sig0".to_string(), FilterCondition::new("ge", 20.0));
//! let kept = filter_points(&points, &conditions)?;
//! assert_eq!(kept.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ### 3. `Aggregator` - Points to Cells
//!
//! ```
//! use pixcell_rs::{Aggregator, GridSystem, PointCollection};
//! use std::collections::BTreeMap;
//!
//! # fn main() -> Result<(), pixcell_rs::DggsError> {
//! let mut fields = BTreeMap::new();
//! fields.insert("height".to_string(), vec![1.0, 3.0]);
//! let points = PointCollection::from_columns(vec![10.0, 10.0], vec![40.0, 40.0], fields)?;
//!
//! let records = Aggregator::new(GridSystem::H3, 5).aggregate(&points, &["height"])?;
//! assert_eq!(records[0].value("height"), Some(2.0));
//! # Ok(())
//! # }
//! ```
//!
//! ### 4. `GridDataset` - Output Assembly and Writers
//!
//! ```no_run
//! use pixcell_rs::{Aggregator, GridDataset, GridSystem, PointCollection};
//! use std::collections::BTreeMap;
//!
//! # fn main() -> Result<(), pixcell_rs::DggsError> {
//! # let points = PointCollection::from_columns(vec![10.0], vec![40.0], BTreeMap::new())?;
//! let records = Aggregator::new(GridSystem::Healpix, 8).aggregate_all(&points)?;
//! let grid = GridDataset::build(records, GridSystem::Healpix, 8, points.attrs())?;
//! grid.to_geoparquet(format!("pixc_{}.parquet", grid.layer_name()))?;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod dggs;
pub mod error;
pub mod filter;
pub mod grid;
pub mod io;
pub mod points;

pub use aggregate::{AggregationMode, Aggregator, InterpMethod};
pub use dggs::{CellId, CellIndexer, GridSystem, HealpixIndexer, HexIndexer};
pub use error::DggsError;
pub use filter::{CompareOp, ConditionFilter, Conditions, FilterCondition, filter_points};
pub use grid::{CellRecord, GridDataset};
pub use io::{CsvPointsConfig, GeometryFormat, read_points_csv, write_grid_csv};
pub use points::{AttrValue, PointCollection};

pub use geo_types;
pub use geoarrow_array;
pub use geoarrow_schema;
pub use geoparquet;
