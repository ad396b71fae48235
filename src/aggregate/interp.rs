use crate::error::DggsError;
use geo_types::Point;
use serde::{Deserialize, Serialize};
use spade::{DelaunayTriangulation, FloatTriangulation, HasPosition, Point2, Triangulation};

/// Scattered-data interpolation method, mirroring the usual
/// nearest/linear/cubic trio.
///
/// Linear and cubic return a missing value (NaN) for query points outside
/// the convex hull of the samples; nearest always answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpMethod {
    /// Value of the nearest sample.
    Nearest,
    /// Barycentric interpolation over the Delaunay triangulation.
    #[default]
    Linear,
    /// Natural-neighbor (Sibson) interpolation, the smooth variant.
    Cubic,
}

struct Sample {
    position: Point2<f64>,
    index: usize,
}

impl HasPosition for Sample {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// Delaunay triangulation of the sample positions, reused across fields.
///
/// Vertices store indexes into the source columns, so one triangulation
/// serves every field of a collection.
pub(crate) struct ScatterInterpolator {
    triangulation: DelaunayTriangulation<Sample>,
}

impl ScatterInterpolator {
    pub(crate) fn new(longitude: &[f64], latitude: &[f64]) -> Result<Self, DggsError> {
        let mut triangulation = DelaunayTriangulation::new();
        for (index, (&lon, &lat)) in longitude.iter().zip(latitude.iter()).enumerate() {
            triangulation
                .insert(Sample {
                    position: Point2::new(lon, lat),
                    index,
                })
                .map_err(|e| DggsError::InterpolationError(e.to_string()))?;
        }

        Ok(Self { triangulation })
    }

    /// Evaluates one field at every query point. Missing estimates are NaN.
    pub(crate) fn evaluate(
        &self,
        values: &[f64],
        queries: &[Point<f64>],
        method: InterpMethod,
    ) -> Vec<f64> {
        queries
            .iter()
            .map(|query| {
                let position = Point2::new(query.x(), query.y());
                match method {
                    InterpMethod::Nearest => self
                        .triangulation
                        .nearest_neighbor(position)
                        .map(|vertex| values[vertex.data().index]),
                    InterpMethod::Linear => self
                        .triangulation
                        .barycentric()
                        .interpolate(|vertex| values[vertex.data().index], position),
                    InterpMethod::Cubic => self
                        .triangulation
                        .natural_neighbor()
                        .interpolate(|vertex| values[vertex.data().index], position),
                }
                .unwrap_or(f64::NAN)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> ScatterInterpolator {
        ScatterInterpolator::new(&[0.0, 1.0, 1.0, 0.0], &[0.0, 0.0, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn test_linear_reproduces_planar_field() {
        let interp = unit_square();
        // f(x, y) = 2x + y is linear, so barycentric interpolation is exact
        let values = [0.0, 2.0, 3.0, 1.0];
        let queries = [Point::new(0.5, 0.5), Point::new(0.25, 0.75)];

        let result = interp.evaluate(&values, &queries, InterpMethod::Linear);
        assert!((result[0] - 1.5).abs() < 1e-9);
        assert!((result[1] - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_linear_missing_outside_hull() {
        let interp = unit_square();
        let values = [1.0, 1.0, 1.0, 1.0];
        let outside = [Point::new(2.0, 2.0)];

        assert!(interp.evaluate(&values, &outside, InterpMethod::Linear)[0].is_nan());
        assert!(interp.evaluate(&values, &outside, InterpMethod::Cubic)[0].is_nan());
    }

    #[test]
    fn test_nearest_always_answers() {
        let interp = unit_square();
        let values = [1.0, 2.0, 3.0, 4.0];
        let result = interp.evaluate(
            &values,
            &[Point::new(10.0, 10.0), Point::new(-0.1, 0.1)],
            InterpMethod::Nearest,
        );

        assert_eq!(result[0], 3.0);
        assert_eq!(result[1], 1.0);
    }

    #[test]
    fn test_cubic_reproduces_constant_field() {
        let interp = unit_square();
        let values = [5.0, 5.0, 5.0, 5.0];
        let result = interp.evaluate(
            &values,
            &[Point::new(0.5, 0.5)],
            InterpMethod::Cubic,
        );

        assert!((result[0] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_sample_nearest() {
        let interp = ScatterInterpolator::new(&[10.0], &[40.0]).unwrap();
        let result = interp.evaluate(&[7.5], &[Point::new(11.0, 41.0)], InterpMethod::Nearest);
        assert_eq!(result[0], 7.5);
    }
}
