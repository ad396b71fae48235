pub mod healpix;
pub mod hex;

pub use healpix::HealpixIndexer;
pub use hex::HexIndexer;

use crate::error::DggsError;
use geo::orient::{Direction, Orient};
use geo_types::{Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

/// The two supported discrete global grid systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSystem {
    /// Hexagonal-dominant mesh, refinable by integer resolution 0-15.
    H3,
    /// Equal-area quad-tree mesh, refinable by integer order 0-29.
    Healpix,
}

impl GridSystem {
    pub fn name(self) -> &'static str {
        match self {
            GridSystem::H3 => "h3",
            GridSystem::Healpix => "healpix",
        }
    }

    /// Highest valid resolution for this grid system.
    pub fn max_resolution(self) -> u8 {
        match self {
            GridSystem::H3 => 15,
            GridSystem::Healpix => cdshealpix::DEPTH_MAX,
        }
    }

    /// Layer name suffix embedding the grid system and resolution,
    /// e.g. `h3_07` or `healpix_08`.
    pub fn layer_name(self, resolution: u8) -> String {
        format!("{}_{:02}", self.name(), resolution)
    }

    /// Builds the indexer variant for this grid system.
    ///
    /// # Example
    ///
    /// ```
    /// use pixcell_rs::GridSystem;
    ///
    /// # fn main() -> Result<(), pixcell_rs::DggsError> {
    /// let indexer = GridSystem::H3.indexer(7)?;
    /// let cell = indexer.to_cell(10.0, 40.0)?;
    /// let center = indexer.to_center(cell)?;
    /// let boundary = indexer.to_boundary(cell)?;
    /// assert!(boundary.exterior().coords().count() >= 6);
    /// # Ok(())
    /// # }
    /// ```
    pub fn indexer(self, resolution: u8) -> Result<Box<dyn CellIndexer>, DggsError> {
        match self {
            GridSystem::H3 => Ok(Box::new(HexIndexer::new(resolution)?)),
            GridSystem::Healpix => Ok(Box::new(HealpixIndexer::new(resolution)?)),
        }
    }
}

impl std::fmt::Display for GridSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Opaque identifier of one cell, meaningful only together with its grid
/// system and resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CellId(pub u64);

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CellId {
    fn from(id: u64) -> Self {
        CellId(id)
    }
}

/// The four-operation contract shared by both grid systems.
///
/// All operations are deterministic pure functions of their inputs and the
/// indexer's (grid system, resolution) pair, so indexers are safe to share
/// across threads and cell ids are stable grouping keys.
pub trait CellIndexer: std::fmt::Debug + Send + Sync {
    fn grid_system(&self) -> GridSystem;

    fn resolution(&self) -> u8;

    /// Maps a geographic coordinate to the id of the containing cell.
    fn to_cell(&self, longitude: f64, latitude: f64) -> Result<CellId, DggsError>;

    /// Returns the representative center point of a cell.
    fn to_center(&self, cell: CellId) -> Result<Point<f64>, DggsError>;

    /// Returns the closed boundary ring of a cell, CCW, with longitudes
    /// unwrapped around the cell center so antimeridian cells stay
    /// contiguous.
    fn to_boundary(&self, cell: CellId) -> Result<Polygon<f64>, DggsError>;

    /// Enumerates every cell whose boundary intersects `region`.
    ///
    /// The result is conservative: a few extra border cells may be
    /// included, none are dropped.
    fn cells_covering_region(&self, region: &Polygon<f64>) -> Result<Vec<CellId>, DggsError>;
}

/// Rejects coordinates outside [-180, 180] x [-90, 90] or non-finite.
pub(crate) fn check_lonlat(longitude: f64, latitude: f64) -> Result<(), DggsError> {
    let valid = longitude.is_finite()
        && latitude.is_finite()
        && (-180.0..=180.0).contains(&longitude)
        && (-90.0..=90.0).contains(&latitude);
    if valid {
        Ok(())
    } else {
        Err(DggsError::InvalidCoordinate(longitude, latitude))
    }
}

/// Builds a closed CCW boundary polygon from raw vertices, unwrapping
/// longitudes to the branch nearest `center_lon`.
pub(crate) fn close_ring(center_lon: f64, mut coords: Vec<Coord<f64>>) -> Polygon<f64> {
    for c in coords.iter_mut() {
        if c.x - center_lon > 180.0 {
            c.x -= 360.0;
        } else if c.x - center_lon < -180.0 {
            c.x += 360.0;
        }
    }
    if let Some(&first) = coords.first() {
        if coords.last() != Some(&first) {
            coords.push(first);
        }
    }

    Polygon::new(LineString::from(coords), vec![]).orient(Direction::Default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    #[test]
    fn test_layer_name() {
        assert_eq!(GridSystem::H3.layer_name(7), "h3_07");
        assert_eq!(GridSystem::Healpix.layer_name(12), "healpix_12");
    }

    #[test]
    fn test_indexer_dispatch() {
        let hex = GridSystem::H3.indexer(5).unwrap();
        assert_eq!(hex.grid_system(), GridSystem::H3);
        assert_eq!(hex.resolution(), 5);

        let healpix = GridSystem::Healpix.indexer(8).unwrap();
        assert_eq!(healpix.grid_system(), GridSystem::Healpix);
        assert_eq!(healpix.resolution(), 8);
    }

    #[test]
    fn test_invalid_resolution_per_system() {
        assert_eq!(
            GridSystem::H3.indexer(16).unwrap_err(),
            DggsError::InvalidResolution(GridSystem::H3, 16)
        );
        assert_eq!(
            GridSystem::Healpix.indexer(30).unwrap_err(),
            DggsError::InvalidResolution(GridSystem::Healpix, 30)
        );
        // 16 is a perfectly fine HEALPix order
        assert!(GridSystem::Healpix.indexer(16).is_ok());
    }

    #[test]
    fn test_check_lonlat() {
        assert!(check_lonlat(10.0, 40.0).is_ok());
        assert!(check_lonlat(-180.0, 90.0).is_ok());
        assert!(check_lonlat(181.0, 0.0).is_err());
        assert!(check_lonlat(0.0, -91.0).is_err());
        assert!(check_lonlat(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_close_ring_closes_and_unwraps() {
        let coords = vec![
            coord! { x: 179.5, y: 0.0 },
            coord! { x: -179.5, y: 0.0 },
            coord! { x: -179.5, y: 1.0 },
            coord! { x: 179.5, y: 1.0 },
        ];
        let polygon = close_ring(179.8, coords);
        let exterior = polygon.exterior();

        assert_eq!(exterior.0.first(), exterior.0.last());
        // every vertex on the same branch as the center
        for c in exterior.coords() {
            assert!((c.x - 179.8).abs() < 180.0);
        }
    }
}
