use crate::dggs::{CellId, CellIndexer, GridSystem, check_lonlat, close_ring};
use crate::error::DggsError;
use cdshealpix::compass_point::Cardinal;
use cdshealpix::{DEPTH_MAX, n_hash, nested};
use geo_types::{Point, Polygon, coord};

/// Number of sample points per edge of the curvilinear cell boundary.
const SEGMENTS_PER_EDGE: u32 = 4;

/// HEALPix (nested scheme) implementation of the [`CellIndexer`] contract.
///
/// The resolution parameter is the HEALPix order: the sphere holds
/// `12 * 4^order` equal-area cells, ids in `[0, 12 * 4^order)`.
#[derive(Debug, Clone, Copy)]
pub struct HealpixIndexer {
    depth: u8,
    n_cells: u64,
}

impl HealpixIndexer {
    /// Creates an indexer at the given order (0-29).
    pub fn new(resolution: u8) -> Result<Self, DggsError> {
        if resolution > DEPTH_MAX {
            return Err(DggsError::InvalidResolution(GridSystem::Healpix, resolution));
        }
        Ok(Self {
            depth: resolution,
            n_cells: n_hash(resolution),
        })
    }

    fn check_cell(&self, cell: CellId) -> Result<u64, DggsError> {
        if cell.0 >= self.n_cells {
            return Err(DggsError::InvalidCell(cell.0));
        }
        Ok(cell.0)
    }
}

/// Folds a longitude in radians from cdshealpix's [0, 2pi) range back to
/// (-180, 180] degrees.
fn lon_to_degrees(lon_rad: f64) -> f64 {
    let degrees = lon_rad.to_degrees();
    if degrees > 180.0 { degrees - 360.0 } else { degrees }
}

impl CellIndexer for HealpixIndexer {
    fn grid_system(&self) -> GridSystem {
        GridSystem::Healpix
    }

    fn resolution(&self) -> u8 {
        self.depth
    }

    fn to_cell(&self, longitude: f64, latitude: f64) -> Result<CellId, DggsError> {
        check_lonlat(longitude, latitude)?;
        let lon_rad = longitude.rem_euclid(360.0).to_radians();
        let lat_rad = latitude.to_radians();
        Ok(CellId(nested::hash(self.depth, lon_rad, lat_rad)))
    }

    fn to_center(&self, cell: CellId) -> Result<Point<f64>, DggsError> {
        let hash = self.check_cell(cell)?;
        let (lon_rad, lat_rad) = nested::center(self.depth, hash);
        Ok(Point::new(lon_to_degrees(lon_rad), lat_rad.to_degrees()))
    }

    fn to_boundary(&self, cell: CellId) -> Result<Polygon<f64>, DggsError> {
        let hash = self.check_cell(cell)?;
        let center = self.to_center(cell)?;

        let path = nested::path_along_cell_edge(
            self.depth,
            hash,
            &Cardinal::S,
            false,
            SEGMENTS_PER_EDGE,
        );
        let coords = path
            .iter()
            .map(|&(lon_rad, lat_rad)| {
                coord! { x: lon_to_degrees(lon_rad), y: lat_rad.to_degrees() }
            })
            .collect();
        Ok(close_ring(center.x(), coords))
    }

    fn cells_covering_region(&self, region: &Polygon<f64>) -> Result<Vec<CellId>, DggsError> {
        let exterior = &region.exterior().0;
        if exterior.len() < 4 {
            return Err(DggsError::GeometryParseError(
                "covering region must be a closed polygon".to_string(),
            ));
        }

        // drop the closing vertex, cdshealpix expects an open ring
        let vertices: Vec<(f64, f64)> = exterior[..exterior.len() - 1]
            .iter()
            .map(|c| (c.x.rem_euclid(360.0).to_radians(), c.y.to_radians()))
            .collect();

        let coverage = nested::polygon_coverage(self.depth, &vertices, true);
        Ok(coverage.flat_iter().map(CellId).collect())
    }
}
