//! Sampling

use crate::geometry::{point2, Frame, Point2f, Vector3f};
use crate::pbrt::{abs, max, PI};
use crate::rng::RNG;

/// Returns a 2-D sample point with both coordinates in `[0, 1)`.
///
/// * `rng` - Random number generator.
pub fn sample_2d(rng: &mut RNG) -> Point2f {
    let x = rng.uniform_float();
    point2(x, rng.uniform_float())
}

/// Sample a point on a unit disk by uniformly mapping concentric squares of
/// `[-1, 1]^2` to concentric circles.
///
/// * `u` - The random sample point.
pub fn concentric_sample_disk(u: &Point2f) -> Point2f {
    let ox = 2.0 * u.x - 1.0;
    let oy = 2.0 * u.y - 1.0;

    // Handle degeneracy at the origin.
    if ox == 0.0 && oy == 0.0 {
        return Point2f::zero();
    }

    let (r, theta) = if abs(ox) > abs(oy) {
        (ox, 0.25 * PI * (oy / ox))
    } else {
        (oy, 0.5 * PI - 0.25 * PI * (ox / oy))
    };
    point2(r * theta.cos(), r * theta.sin())
}

/// Sample a direction on the `+z` hemisphere using cosine-weighted sampling.
///
/// * `u` - The random sample point.
#[inline]
pub fn cosine_sample_hemisphere(u: &Point2f) -> Vector3f {
    let d = concentric_sample_disk(u);
    let z = max(0.0, 1.0 - d.x * d.x - d.y * d.y).sqrt();
    Vector3f::new(d.x, d.y, z)
}

/// Returns a cosine-distributed direction about the unit vector `n`.
///
/// * `n`   - Pole of the hemisphere.
/// * `rng` - Random number generator.
pub fn cos_hemi_random(n: &Vector3f, rng: &mut RNG) -> Vector3f {
    Frame::from_z(*n).from_local(&cosine_sample_hemisphere(&sample_2d(rng)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dot;
    use crate::pbrt::Float;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn disk_samples_inside_unit_disk(x in 0.0..1.0f32, y in 0.0..1.0f32) {
            let p = concentric_sample_disk(&point2(x, y));
            prop_assert!(p.x * p.x + p.y * p.y <= 1.0 + 1e-5);
        }

        #[test]
        fn hemisphere_samples_are_unit(x in 0.0..1.0f32, y in 0.0..1.0f32) {
            let v = cosine_sample_hemisphere(&point2(x, y));
            prop_assert!(v.z >= 0.0);
            prop_assert!(approx_eq!(f32, v.length(), 1.0, epsilon = 1e-4));
        }
    }

    #[test]
    fn cos_hemi_mean_cosine() {
        // E[cos] under a cosine distribution is 2/3.
        let n = Vector3f::new(0.0, 1.0, 0.0);
        let mut rng = RNG::new(3);
        let count = 20_000;
        let mean = (0..count)
            .map(|_| cos_hemi_random(&n, &mut rng).dot(&n))
            .sum::<Float>()
            / count as Float;
        assert!(approx_eq!(f32, mean, 2.0 / 3.0, epsilon = 0.01));
    }
}
