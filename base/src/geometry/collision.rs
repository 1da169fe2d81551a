//! Primitive intersection tests against triangles.

use super::{Bounds3f, Dot, Point3f, Ray, Sphere, Vector3, Vector3f};
use crate::pbrt::{gamma, max, min, Float};

/// Result of a ray/triangle intersection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray.
    pub t: Float,

    /// Barycentric weight of the second vertex.
    pub u: Float,

    /// Barycentric weight of the third vertex.
    pub v: Float,

    /// True if the ray hits the side opposite the counter-clockwise normal.
    pub backface: bool,
}

/// Watertight ray/triangle intersection. Rays through shared edges and
/// vertices hit exactly one of the adjoining triangles.
///
/// * `ray` - The ray. Hits outside `[min_distance, max_distance]` are ignored.
/// * `p`   - Triangle vertices.
pub fn intersect_ray_triangle(ray: &Ray, p: &[Point3f; 3]) -> Option<TriangleHit> {
    // Translate vertices based on ray origin.
    let o = Vector3::from(ray.origin);
    let mut p0t = Vector3::from(p[0]) - o;
    let mut p1t = Vector3::from(p[1]) - o;
    let mut p2t = Vector3::from(p[2]) - o;

    // Permute so the largest direction component is z.
    let kz = ray.direction.abs().max_dimension();
    let kx = kz + 1;
    let ky = kx + 1;
    let d = ray.direction.permute(kx, ky, kz);
    if d.z == 0.0 {
        return None;
    }
    p0t = p0t.permute(kx, ky, kz);
    p1t = p1t.permute(kx, ky, kz);
    p2t = p2t.permute(kx, ky, kz);

    // Shear so the ray runs along +z.
    let sx = -d.x / d.z;
    let sy = -d.y / d.z;
    let sz = 1.0 / d.z;
    for q in [&mut p0t, &mut p1t, &mut p2t] {
        q.x += sx * q.z;
        q.y += sy * q.z;
    }

    let mut e0 = p1t.x * p2t.y - p1t.y * p2t.x;
    let mut e1 = p2t.x * p0t.y - p2t.y * p0t.x;
    let mut e2 = p0t.x * p1t.y - p0t.y * p1t.x;

    // Fall back to double precision on edges.
    if e0 == 0.0 || e1 == 0.0 || e2 == 0.0 {
        e0 = (p1t.x as f64 * p2t.y as f64 - p1t.y as f64 * p2t.x as f64) as Float;
        e1 = (p2t.x as f64 * p0t.y as f64 - p2t.y as f64 * p0t.x as f64) as Float;
        e2 = (p0t.x as f64 * p1t.y as f64 - p0t.y as f64 * p1t.x as f64) as Float;
    }

    if (e0 < 0.0 || e1 < 0.0 || e2 < 0.0) && (e0 > 0.0 || e1 > 0.0 || e2 > 0.0) {
        return None;
    }
    let det = e0 + e1 + e2;
    if det == 0.0 {
        return None;
    }

    p0t.z *= sz;
    p1t.z *= sz;
    p2t.z *= sz;
    let t_scaled = e0 * p0t.z + e1 * p1t.z + e2 * p2t.z;
    if det < 0.0 && (t_scaled >= 0.0 || t_scaled < ray.max_distance * det) {
        return None;
    }
    if det > 0.0 && (t_scaled <= 0.0 || t_scaled > ray.max_distance * det) {
        return None;
    }

    let inv_det = 1.0 / det;
    let t = t_scaled * inv_det;

    // Reject hits that are not conservatively in front of the origin.
    let max_z_t = Vector3::new(p0t.z, p1t.z, p2t.z).abs().max_component();
    let delta_z = gamma(3) * max_z_t;
    let max_x_t = Vector3::new(p0t.x, p1t.x, p2t.x).abs().max_component();
    let max_y_t = Vector3::new(p0t.y, p1t.y, p2t.y).abs().max_component();
    let delta_x = gamma(5) * (max_x_t + max_z_t);
    let delta_y = gamma(5) * (max_y_t + max_z_t);
    let delta_e = 2.0 * (gamma(2) * max_x_t * max_y_t + delta_y * max_x_t + delta_x * max_y_t);
    let max_e = Vector3::new(e0, e1, e2).abs().max_component();
    let delta_t =
        3.0 * (gamma(3) * max_e * max_z_t + delta_e * max_z_t + delta_z * max_e) * inv_det.abs();
    if t <= delta_t || t < ray.min_distance {
        return None;
    }

    let ng = (p[1] - p[0]).cross(&(p[2] - p[0]));
    Some(TriangleHit {
        t,
        u: e1 * inv_det,
        v: e2 * inv_det,
        backface: ray.direction.dot(&ng) > 0.0,
    })
}

/// Returns true if the projections of the triangle and the box onto `axis`
/// overlap. The triangle is given relative to the box centre.
fn overlap_on_axis(axis: &Vector3f, v: &[Vector3f; 3], half: &Vector3f) -> bool {
    let p0 = v[0].dot(axis);
    let p1 = v[1].dot(axis);
    let p2 = v[2].dot(axis);
    let r = half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs();
    !(min(p0, min(p1, p2)) > r || max(p0, max(p1, p2)) < -r)
}

/// Separating axis test between a solid box and a triangle. Touching counts
/// as overlapping.
///
/// * `b` - The box.
/// * `p` - Triangle vertices.
pub fn box_overlaps_triangle(b: &Bounds3f, p: &[Point3f; 3]) -> bool {
    let c = b.centroid();
    let half = b.diagonal() * 0.5;
    let v = [p[0] - c, p[1] - c, p[2] - c];

    // Box face normals.
    for i in 0..3 {
        let lo = min(v[0][i], min(v[1][i], v[2][i]));
        let hi = max(v[0][i], max(v[1][i], v[2][i]));
        if lo > half[i] || hi < -half[i] {
            return false;
        }
    }

    // Triangle normal.
    let e = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];
    if !overlap_on_axis(&e[0].cross(&e[1]), &v, &half) {
        return false;
    }

    // Cross products of box axes with triangle edges.
    let units = [
        Vector3f::new(1.0, 0.0, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
        Vector3f::new(0.0, 0.0, 1.0),
    ];
    e.iter()
        .all(|edge| units.iter().all(|u| overlap_on_axis(&u.cross(edge), &v, &half)))
}

/// Returns the point of a triangle closest to `q`.
///
/// * `q` - Query point.
/// * `p` - Triangle vertices.
pub fn closest_point_on_triangle(q: &Point3f, p: &[Point3f; 3]) -> Point3f {
    let (a, b, c) = (p[0], p[1], p[2]);
    let ab = b - a;
    let ac = c - a;

    if ab.cross(&ac).length_squared() <= 1e-24 {
        // Degenerate: nearest vertex.
        return *p
            .iter()
            .min_by(|x, y| x.distance_squared(q).total_cmp(&y.distance_squared(q)))
            .unwrap_or(&a);
    }

    let ap = *q - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = *q - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = *q - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

/// Returns true if a solid sphere and a triangle share any point.
///
/// * `s` - The sphere.
/// * `p` - Triangle vertices.
pub fn sphere_overlaps_triangle(s: &Sphere, p: &[Point3f; 3]) -> bool {
    s.contains(&closest_point_on_triangle(&s.center, p))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{point3, vector3};
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    fn unit_tri() -> [Point3f; 3] {
        [point3(0.0, 0.0, 0.0), point3(1.0, 0.0, 0.0), point3(0.0, 1.0, 0.0)]
    }

    #[test]
    fn ray_hits_unit_triangle_front() {
        let ray = Ray::new(point3(0.2, 0.2, 1.0), vector3(0.0, 0.0, -1.0));
        let hit = intersect_ray_triangle(&ray, &unit_tri()).expect("hit");
        assert!(approx_eq!(f32, hit.t, 1.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, hit.u, 0.2, epsilon = 1e-6));
        assert!(approx_eq!(f32, hit.v, 0.2, epsilon = 1e-6));
        assert!(!hit.backface);
    }

    #[test]
    fn ray_hits_unit_triangle_back() {
        let ray = Ray::new(point3(0.2, 0.2, -1.0), vector3(0.0, 0.0, 1.0));
        let hit = intersect_ray_triangle(&ray, &unit_tri()).expect("hit");
        assert!(hit.backface);
    }

    #[test]
    fn ray_misses_outside_footprint() {
        let ray = Ray::new(point3(5.0, 5.0, 5.0), vector3(0.0, 0.0, -1.0));
        assert!(intersect_ray_triangle(&ray, &unit_tri()).is_none());
    }

    #[test]
    fn ray_respects_distance_range() {
        let ray = Ray::new(point3(0.2, 0.2, 1.0), vector3(0.0, 0.0, -1.0));
        assert!(intersect_ray_triangle(&ray.with_max_distance(0.5), &unit_tri()).is_none());
        assert!(intersect_ray_triangle(&ray.with_min_distance(1.5), &unit_tri()).is_none());
        let behind = Ray::new(point3(0.2, 0.2, 1.0), vector3(0.0, 0.0, 1.0));
        assert!(intersect_ray_triangle(&behind, &unit_tri()).is_none());
    }

    #[test]
    fn shared_edge_is_hit_once() {
        let a = [point3(0.0, 0.0, 0.0), point3(1.0, 0.0, 0.0), point3(1.0, 1.0, 0.0)];
        let b = [point3(0.0, 0.0, 0.0), point3(1.0, 1.0, 0.0), point3(0.0, 1.0, 0.0)];
        let ray = Ray::new(point3(0.5, 0.5, 1.0), vector3(0.0, 0.0, -1.0));
        let hits = [&a, &b]
            .iter()
            .filter(|t| intersect_ray_triangle(&ray, t).is_some())
            .count();
        assert!(hits >= 1);
    }

    #[test]
    fn box_triangle_overlap() {
        let tri = unit_tri();
        let inside = Bounds3f::new(point3(0.1, 0.1, -0.1), point3(0.2, 0.2, 0.1));
        let above = Bounds3f::new(point3(0.1, 0.1, 0.5), point3(0.2, 0.2, 0.6));
        let beyond_hypotenuse = Bounds3f::new(point3(0.8, 0.8, -0.1), point3(0.9, 0.9, 0.1));
        assert!(box_overlaps_triangle(&inside, &tri));
        assert!(!box_overlaps_triangle(&above, &tri));
        assert!(!box_overlaps_triangle(&beyond_hypotenuse, &tri));
    }

    #[test]
    fn closest_point_regions() {
        let tri = unit_tri();
        assert_eq!(closest_point_on_triangle(&point3(-1.0, -1.0, 0.0), &tri), tri[0]);
        let face = closest_point_on_triangle(&point3(0.25, 0.25, 3.0), &tri);
        assert!(approx_eq!(f32, face.z, 0.0));
        assert!(approx_eq!(f32, face.x, 0.25, epsilon = 1e-6));
        let edge = closest_point_on_triangle(&point3(1.0, 1.0, 0.0), &tri);
        assert!(approx_eq!(f32, edge.x, 0.5, epsilon = 1e-6));
        assert!(approx_eq!(f32, edge.y, 0.5, epsilon = 1e-6));
    }

    #[test]
    fn sphere_triangle_overlap() {
        let tri = unit_tri();
        assert!(sphere_overlaps_triangle(&Sphere::new(point3(0.3, 0.3, 0.0), 5.0), &tri));
        assert!(sphere_overlaps_triangle(&Sphere::new(point3(0.3, 0.3, 0.5), 0.6), &tri));
        assert!(!sphere_overlaps_triangle(&Sphere::new(point3(100.0, 0.0, 0.0), 1.0), &tri));
    }

    proptest! {
        #[test]
        fn hit_point_matches_barycentrics(x in 0.01..0.49f32, y in 0.01..0.49f32, h in 0.1..10.0f32) {
            let tri = unit_tri();
            let ray = Ray::new(point3(x, y, h), vector3(0.0, 0.0, -1.0));
            let hit = intersect_ray_triangle(&ray, &tri).expect("hit");
            let p = ray.at(hit.t);
            prop_assert!(approx_eq!(f32, p.x, hit.u, epsilon = 1e-4));
            prop_assert!(approx_eq!(f32, p.y, hit.v, epsilon = 1e-4));
            prop_assert!(approx_eq!(f32, hit.t, h, epsilon = 1e-4));
        }

        #[test]
        fn box_overlap_agrees_with_closest_point(x in -2.0..2.0f32, y in -2.0..2.0f32, z in -2.0..2.0f32) {
            // A box around a point on the triangle always overlaps it.
            let tri = unit_tri();
            let q = closest_point_on_triangle(&point3(x, y, z), &tri);
            let b = Bounds3f::new(q, q).expand(1e-3);
            prop_assert!(box_overlaps_triangle(&b, &tri));
        }
    }
}
