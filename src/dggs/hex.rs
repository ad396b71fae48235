use crate::dggs::{CellId, CellIndexer, GridSystem, check_lonlat, close_ring};
use crate::error::DggsError;
use geo_types::{Point, Polygon, coord};
use h3o::geom::{ContainmentMode, TilerBuilder};
use h3o::{CellIndex, LatLng, Resolution};

/// Hexagonal (H3) implementation of the [`CellIndexer`] contract.
///
/// Cell ids are the native 64-bit H3 indexes, so they are stable across
/// processes and usable as persisted identifiers.
#[derive(Debug, Clone, Copy)]
pub struct HexIndexer {
    resolution: Resolution,
}

impl HexIndexer {
    /// Creates an indexer at the given resolution (0-15).
    pub fn new(resolution: u8) -> Result<Self, DggsError> {
        let resolution = Resolution::try_from(resolution)
            .map_err(|_| DggsError::InvalidResolution(GridSystem::H3, resolution))?;
        Ok(Self { resolution })
    }

    fn cell_index(&self, cell: CellId) -> Result<CellIndex, DggsError> {
        let index = CellIndex::try_from(cell.0).map_err(|_| DggsError::InvalidCell(cell.0))?;
        if index.resolution() != self.resolution {
            return Err(DggsError::InvalidCell(cell.0));
        }
        Ok(index)
    }
}

impl CellIndexer for HexIndexer {
    fn grid_system(&self) -> GridSystem {
        GridSystem::H3
    }

    fn resolution(&self) -> u8 {
        u8::from(self.resolution)
    }

    fn to_cell(&self, longitude: f64, latitude: f64) -> Result<CellId, DggsError> {
        check_lonlat(longitude, latitude)?;
        let coord = LatLng::new(latitude, longitude)
            .map_err(|_| DggsError::InvalidCoordinate(longitude, latitude))?;
        Ok(CellId(coord.to_cell(self.resolution).into()))
    }

    fn to_center(&self, cell: CellId) -> Result<Point<f64>, DggsError> {
        let center = LatLng::from(self.cell_index(cell)?);
        Ok(Point::new(center.lng(), center.lat()))
    }

    fn to_boundary(&self, cell: CellId) -> Result<Polygon<f64>, DggsError> {
        let index = self.cell_index(cell)?;
        let center = LatLng::from(index);

        // 6 vertices, 5 at the icosahedron's pentagon cells
        let coords = index
            .boundary()
            .iter()
            .map(|vertex| coord! { x: vertex.lng(), y: vertex.lat() })
            .collect();
        Ok(close_ring(center.lng(), coords))
    }

    fn cells_covering_region(&self, region: &Polygon<f64>) -> Result<Vec<CellId>, DggsError> {
        let mut tiler = TilerBuilder::new(self.resolution)
            .containment_mode(ContainmentMode::Covers)
            .build();
        tiler
            .add(region.clone())
            .map_err(|e| DggsError::GeometryParseError(e.to_string()))?;

        Ok(tiler.into_coverage().map(|cell| CellId(cell.into())).collect())
    }
}
