//! Planar geometry for station placement and wavefront checks
//!
//! The simulated world is a flat square area measured in kilometres.
//! Stations sit at fixed points; a frame's signal is an annulus centered
//! on its sender, so the only geometric primitive the engine needs is
//! Euclidean distance.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point in the simulation area, in kilometres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Draw a uniform random point inside the square `[0, area_size]²`.
pub fn random_point<R: Rng>(area_size: f64, rng: &mut R) -> Point {
    Point::new(
        rng.gen_range(0.0..=area_size),
        rng.gen_range(0.0..=area_size),
    )
}

/// Draw a uniform random point inside the square that also lies within
/// `radius` of `center`. Rejection-sampled; the caller must make sure the
/// disc and the square overlap.
pub fn random_point_within<R: Rng>(
    area_size: f64,
    center: Point,
    radius: f64,
    rng: &mut R,
) -> Point {
    loop {
        let p = random_point(area_size, rng);
        if p.distance_to(&center) <= radius {
            return p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_random_point_in_area() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let p = random_point(50.0, &mut rng);
            assert!(p.x >= 0.0 && p.x <= 50.0);
            assert!(p.y >= 0.0 && p.y <= 50.0);
        }
    }

    #[test]
    fn test_random_point_within_radius() {
        let mut rng = StdRng::seed_from_u64(2);
        let center = Point::new(25.0, 25.0);
        for _ in 0..100 {
            let p = random_point_within(50.0, center, 10.0, &mut rng);
            assert!(p.distance_to(&center) <= 10.0);
        }
    }
}
