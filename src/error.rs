use crate::dggs::{CellId, GridSystem};

/// Error type for pixcell-rs operations.
#[derive(Debug, PartialEq)]
pub enum DggsError {
    /// The resolution is outside the valid range for the grid system.
    InvalidResolution(GridSystem, u8),
    /// A requested field is not part of the point collection's schema.
    UnknownField(String),
    /// The point collection passed to the aggregator was empty.
    EmptyInput,
    /// Two records with the same cell id were handed to the dataset builder.
    DuplicateCell(CellId),
    /// The point collection's schema is inconsistent or a condition
    /// references a field that does not exist.
    SchemaError(String),
    /// A filter condition named an operator outside the recognized six.
    UnsupportedOperator(String),
    /// A coordinate is outside [-180, 180] x [-90, 90] or not finite.
    InvalidCoordinate(f64, f64),
    /// A cell id is not valid for the indexer's grid system and resolution.
    InvalidCell(u64),
    /// Scattered-data interpolation failed (e.g. degenerate sample set).
    InterpolationError(String),
    /// Failed to parse or build a geometry.
    GeometryParseError(String),
    /// File I/O or serialization error.
    IoError(String),
    /// CSV parsing or reading error.
    CsvError(String),
}

impl std::fmt::Display for DggsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DggsError::InvalidResolution(grid, res) => {
                write!(
                    f,
                    "Invalid resolution {} for {} (valid range: 0-{})",
                    res,
                    grid,
                    grid.max_resolution()
                )
            }
            DggsError::UnknownField(name) => write!(f, "Unknown field: {}", name),
            DggsError::EmptyInput => write!(f, "Empty point collection"),
            DggsError::DuplicateCell(id) => write!(f, "Duplicate cell id: {}", id),
            DggsError::SchemaError(msg) => write!(f, "Schema error: {}", msg),
            DggsError::UnsupportedOperator(name) => {
                write!(
                    f,
                    "Unsupported operator: {} (expected one of eq, ne, gt, ge, lt, le)",
                    name
                )
            }
            DggsError::InvalidCoordinate(lon, lat) => {
                write!(f, "Invalid coordinate: ({}, {})", lon, lat)
            }
            DggsError::InvalidCell(id) => write!(f, "Invalid cell id: {}", id),
            DggsError::InterpolationError(msg) => write!(f, "Interpolation error: {}", msg),
            DggsError::GeometryParseError(msg) => write!(f, "Geometry parse error: {}", msg),
            DggsError::IoError(msg) => write!(f, "IO error: {}", msg),
            DggsError::CsvError(msg) => write!(f, "CSV error: {}", msg),
        }
    }
}

impl std::error::Error for DggsError {}
