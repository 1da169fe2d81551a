//! Procedural meshes
//!
//! All builders return y-up object space meshes centred on the origin with
//! front faces pointing outwards.

use super::MeshGeometry;
use base::geometry::{point2, Point3f, Vector3f};
use base::mesh::CpuVertex;
use base::pbrt::{Float, PI, TWO_PI};

/// Appends a rectangle spanning `center ± du ± dv` facing `du × dv`.
fn add_face(vertices: &mut Vec<CpuVertex>, indices: &mut Vec<u32>, center: Point3f, du: Vector3f, dv: Vector3f) {
    let base = vertices.len() as u32;
    let normal = du.cross(&dv).normalize();
    let tangent = du.normalize();
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    for (su, sv) in corners {
        vertices.push(CpuVertex {
            position: center + du * su + dv * sv,
            normal,
            tangent,
            tangent_w: 1.0,
            tex_coord0: point2(0.5 * (su + 1.0), 0.5 * (sv + 1.0)),
        });
    }
    indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// Returns a rectangle in the y = 0 plane facing +y.
///
/// * `size_x` - Extent along x.
/// * `size_z` - Extent along z.
pub fn quad(size_x: Float, size_z: Float) -> MeshGeometry {
    let (mut vertices, mut indices) = (vec![], vec![]);
    add_face(
        &mut vertices,
        &mut indices,
        Point3f::zero(),
        Vector3f::new(0.0, 0.0, 0.5 * size_z),
        Vector3f::new(0.5 * size_x, 0.0, 0.0),
    );
    MeshGeometry::new("quad", vertices, indices)
}

/// Returns an axis aligned box with separate vertices per face.
///
/// * `extent` - Edge lengths.
pub fn box_mesh(extent: &Vector3f) -> MeshGeometry {
    let h = *extent * 0.5;
    let (x, y, z) = (
        Vector3f::new(h.x, 0.0, 0.0),
        Vector3f::new(0.0, h.y, 0.0),
        Vector3f::new(0.0, 0.0, h.z),
    );
    let o = Point3f::zero();

    let (mut vertices, mut indices) = (vec![], vec![]);
    for (center, du, dv) in [
        (o + x, y, z),
        (o - x, z, y),
        (o + y, z, x),
        (o - y, x, z),
        (o + z, x, y),
        (o - z, y, x),
    ] {
        add_face(&mut vertices, &mut indices, center, du, dv);
    }
    MeshGeometry::new("box", vertices, indices)
}

/// Returns a latitude/longitude tessellated sphere. The poles are shared by
/// a fan of triangles so no triangle is degenerate.
///
/// * `radius` - Radius.
/// * `slices` - Number of divisions around the y axis; at least 3.
/// * `stacks` - Number of divisions from pole to pole; at least 2.
pub fn sphere(radius: Float, slices: usize, stacks: usize) -> MeshGeometry {
    assert!(slices >= 3 && stacks >= 2, "sphere needs at least 3 slices and 2 stacks");

    let mut vertices = Vec::with_capacity((slices + 1) * (stacks + 1));
    for i in 0..=stacks {
        let theta = PI * i as Float / stacks as Float;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for j in 0..=slices {
            let phi = TWO_PI * j as Float / slices as Float;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let n = Vector3f::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
            vertices.push(CpuVertex {
                position: Point3f::from(n * radius),
                normal: n,
                tangent: Vector3f::new(-sin_phi, 0.0, cos_phi),
                tangent_w: 1.0,
                tex_coord0: point2(j as Float / slices as Float, i as Float / stacks as Float),
            });
        }
    }

    let row = (slices + 1) as u32;
    let mut indices = Vec::with_capacity(6 * slices * stacks);
    for i in 0..stacks as u32 {
        for j in 0..slices as u32 {
            let a = i * row + j;
            let (b, c, d) = (a + 1, a + row, a + row + 1);
            if i != 0 {
                indices.extend_from_slice(&[a, b, c]);
            }
            if i + 1 != stacks as u32 {
                indices.extend_from_slice(&[b, d, c]);
            }
        }
    }
    MeshGeometry::new("sphere", vertices, indices)
}

/// Returns a regular grid displaced along y.
///
/// * `size_x`  - Extent along x.
/// * `size_z`  - Extent along z.
/// * `columns` - Number of samples along x; at least 2.
/// * `heights` - Row-major samples, `columns` per row, rows along +z.
pub fn heightfield(size_x: Float, size_z: Float, columns: usize, heights: &[Float]) -> MeshGeometry {
    assert!(columns >= 2, "heightfield needs at least 2 columns");
    assert!(
        heights.len() % columns == 0 && heights.len() / columns >= 2,
        "heightfield needs at least 2 complete rows"
    );
    let rows = heights.len() / columns;

    let mut vertices = Vec::with_capacity(heights.len());
    for i in 0..rows {
        let v = i as Float / (rows - 1) as Float;
        for j in 0..columns {
            let u = j as Float / (columns - 1) as Float;
            vertices.push(CpuVertex {
                position: Point3f::new((u - 0.5) * size_x, heights[i * columns + j], (v - 0.5) * size_z),
                normal: Vector3f::new(0.0, 1.0, 0.0),
                tangent: Vector3f::new(1.0, 0.0, 0.0),
                tangent_w: 1.0,
                tex_coord0: point2(u, v),
            });
        }
    }

    let cols = columns as u32;
    let mut indices = Vec::with_capacity(6 * (rows - 1) * (columns - 1));
    for i in 0..(rows - 1) as u32 {
        for j in 0..cols - 1 {
            let a = i * cols + j;
            let (b, c, d) = (a + 1, a + cols, a + cols + 1);
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    let mut mesh = MeshGeometry::new("heightfield", vertices, indices);
    mesh.compute_normals();
    mesh
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
