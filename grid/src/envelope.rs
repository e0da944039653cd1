use geo::geometry::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Axis aligned rectangle in real coordinates.
///
/// The default envelope is invalid (uninitialized); merging a
/// coordinate into it makes it valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    min: Coord<f64>,
    max: Coord<f64>,
}

impl Envelope {
    /// Returns the envelope spanned by two opposite corners.
    pub fn new(a: Coord<f64>, b: Coord<f64>) -> Self {
        Self {
            min: Coord {
                x: a.x.min(b.x),
                y: a.y.min(b.y),
            },
            max: Coord {
                x: a.x.max(b.x),
                y: a.y.max(b.y),
            },
        }
    }

    pub fn invalid() -> Self {
        Self {
            min: Coord {
                x: f64::INFINITY,
                y: f64::INFINITY,
            },
            max: Coord {
                x: f64::NEG_INFINITY,
                y: f64::NEG_INFINITY,
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.x.is_finite()
            && self.min.y.is_finite()
            && self.max.x.is_finite()
            && self.max.y.is_finite()
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
    }

    pub fn min_corner(&self) -> Coord<f64> {
        self.min
    }

    pub fn max_corner(&self) -> Coord<f64> {
        self.max
    }

    /// `max - min`.
    pub fn span(&self) -> Coord<f64> {
        self.max - self.min
    }

    pub fn contains(&self, coord: Coord<f64>) -> bool {
        self.is_valid()
            && self.min.x <= coord.x
            && coord.x <= self.max.x
            && self.min.y <= coord.y
            && coord.y <= self.max.y
    }

    /// Grows this envelope to include `coord`.
    pub fn merge(&mut self, coord: Coord<f64>) {
        self.min.x = self.min.x.min(coord.x);
        self.min.y = self.min.y.min(coord.y);
        self.max.x = self.max.x.max(coord.x);
        self.max.y = self.max.y.max(coord.y);
    }

    pub fn to_rect(&self) -> Option<Rect<f64>> {
        self.is_valid().then(|| Rect::new(self.min, self.max))
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::invalid()
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, Envelope};

    #[test]
    fn test_corners_are_normalized() {
        let env = Envelope::new(Coord { x: 10.0, y: -5.0 }, Coord { x: 0.0, y: 5.0 });
        assert_eq!(env.min_corner(), Coord { x: 0.0, y: -5.0 });
        assert_eq!(env.max_corner(), Coord { x: 10.0, y: 5.0 });
        assert_eq!(env.span(), Coord { x: 10.0, y: 10.0 });
    }

    #[test]
    fn test_invalid_until_merged() {
        let mut env = Envelope::default();
        assert!(!env.is_valid());
        assert!(env.to_rect().is_none());
        assert!(!env.contains(Coord { x: 0.0, y: 0.0 }));
        env.merge(Coord { x: 1.0, y: 2.0 });
        assert!(env.is_valid());
        env.merge(Coord { x: -1.0, y: 4.0 });
        assert_eq!(env.span(), Coord { x: 2.0, y: 2.0 });
        assert!(env.contains(Coord { x: 0.0, y: 3.0 }));
    }
}
