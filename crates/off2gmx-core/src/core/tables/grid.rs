//! Distance grids for tabulated potentials.

use super::TableError;

/// An evenly spaced distance grid from 0 to `length` inclusive.
///
/// The written grid starts at exactly 0, but evaluation substitutes the
/// first nonzero point for the origin so potentials that diverge at r = 0
/// produce a finite leading row.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    points: Vec<f64>,
}

impl Grid {
    /// Lays out `floor(length / spacing) + 1` points at `i * spacing`.
    ///
    /// The quotient is nudged before flooring so lengths that are exact
    /// multiples of the spacing do not lose their last point to binary
    /// representation error.
    pub fn new(spacing: f64, length: f64) -> Result<Self, TableError> {
        if spacing <= 0.0 {
            return Err(TableError::DegenerateGrid { spacing, length });
        }
        let count = ((length / spacing) + 1e-9).floor() as usize + 1;
        if count < 2 {
            return Err(TableError::DegenerateGrid { spacing, length });
        }
        let points = (0..count).map(|index| index as f64 * spacing).collect();
        Ok(Self { points })
    }

    /// Grid points as written to tables.
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Grid points as evaluated: the origin is clamped to the first nonzero
    /// point.
    pub fn eval_points(&self) -> impl Iterator<Item = f64> + '_ {
        let clamp = self.points[1];
        self.points
            .iter()
            .enumerate()
            .map(move |(index, &point)| if index == 0 { clamp } else { point })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_length_inclusive_despite_representation_error() {
        let grid = Grid::new(0.0005, 3.0).unwrap();
        assert_eq!(grid.len(), 6001);
        assert_eq!(grid.points()[0], 0.0);
        assert!((grid.points()[6000] - 3.0).abs() < 1e-9);

        let bonded = Grid::new(0.0001, 0.3).unwrap();
        assert_eq!(bonded.len(), 3001);
    }

    #[test]
    fn evaluation_clamps_the_origin_to_the_first_point() {
        let grid = Grid::new(0.5, 2.0).unwrap();
        let eval: Vec<f64> = grid.eval_points().collect();
        assert_eq!(eval, vec![0.5, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(grid.points()[0], 0.0);
    }

    #[test]
    fn rejects_grids_with_fewer_than_two_points() {
        assert!(matches!(
            Grid::new(0.5, 0.2),
            Err(TableError::DegenerateGrid { .. })
        ));
        assert!(matches!(
            Grid::new(0.0, 1.0),
            Err(TableError::DegenerateGrid { .. })
        ));
        assert!(matches!(
            Grid::new(-0.1, 1.0),
            Err(TableError::DegenerateGrid { .. })
        ));
    }
}
