use nalgebra::{Point3, Vector3};

/// Computes the weighted centroid of a set of points.
///
/// The weights are assumed to be normalized (summing to one); callers that hold
/// raw weights must normalize first.
pub fn weighted_centroid(points: &[Point3<f64>], weights: &[f64]) -> Point3<f64> {
    let mut acc = Vector3::zeros();
    for (point, &w) in points.iter().zip(weights) {
        acc += point.coords * w;
    }
    Point3::from(acc)
}

/// Shifts every point by the negated centroid, returning coordinates relative to it.
pub fn centered_coords(points: &[Point3<f64>], centroid: &Point3<f64>) -> Vec<Vector3<f64>> {
    points.iter().map(|p| p - centroid).collect()
}

#[inline]
pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn weighted_centroid_with_uniform_weights_is_arithmetic_mean() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 4.0, -2.0),
        ];
        let centroid = weighted_centroid(&points, &[0.5, 0.5]);
        assert!((centroid - Point3::new(1.0, 2.0, -1.0)).norm() < TOLERANCE);
    }

    #[test]
    fn weighted_centroid_follows_dominant_weight() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let centroid = weighted_centroid(&points, &[0.25, 0.75]);
        assert!((centroid.x - 0.75).abs() < TOLERANCE);
    }

    #[test]
    fn centered_coords_sum_to_zero_for_uniform_weights() {
        let points = vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(-3.0, 0.0, 5.0),
            Point3::new(2.0, 1.0, -2.0),
        ];
        let centroid = weighted_centroid(&points, &[1.0 / 3.0; 3]);
        let centered = centered_coords(&points, &centroid);
        let sum: Vector3<f64> = centered.iter().sum();
        assert!(sum.norm() < 1e-10);
    }
}
