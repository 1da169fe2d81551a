//! Demonstration scene

use base::geometry::{Transform, Vector3f};
use base::gpu::{ImageFormat, Texture};
use base::material::ArcMaterial;
use base::pbrt::{Float, PI};
use base::spectrum::{Color3, Color4};
use materials::{LambertianMaterial, UniversalMaterial};
use shapes::{box_mesh, heightfield, quad, sphere, MeshSurface, ShapeScene};
use std::sync::Arc;

/// Camera placement for the demonstration scene.
pub const EYE: [Float; 3] = [0.0, 1.6, 6.0];

/// Point the camera looks at.
pub const TARGET: [Float; 3] = [0.0, 0.8, 0.0];

/// Position of the point light used for the shadow mask.
pub const LIGHT: [Float; 3] = [2.0, 4.5, 2.0];

/// Returns a checkerboard texture with an opaque alpha channel.
///
/// * `a`    - First colour.
/// * `b`    - Second colour.
/// * `size` - Number of squares along each side.
fn checker(a: Color3, b: Color3, size: usize) -> Texture {
    let texels = (0..size * size)
        .map(|i| if (i / size + i % size) % 2 == 0 { a } else { b })
        .map(|c| Color4::from_rgb(c, 1.0))
        .collect();
    Texture::new("checker", ImageFormat::RGBA32F, size, size, texels)
}

/// Returns a ripple height field sampled on a regular grid.
fn ripples(columns: usize, rows: usize) -> Vec<Float> {
    let mut heights = Vec::with_capacity(columns * rows);
    for i in 0..rows {
        for j in 0..columns {
            let (u, v) = (j as Float / columns as Float, i as Float / rows as Float);
            heights.push(0.05 * (4.0 * PI * u).sin() * (4.0 * PI * v).cos());
        }
    }
    heights
}

/// Builds a small scene exercising each surface and material kind: a
/// rippled floor, a glossy box, a mirror sphere, a glass sphere, a leaf
/// shaped cutout and an emissive panel.
pub fn demo_scene() -> ShapeScene {
    let floor: ArcMaterial = Arc::new(LambertianMaterial::new(
        "floor",
        Arc::new(checker(Color3::gray(0.7), Color3::gray(0.2), 8)),
        Color3::ZERO,
    ));
    let red: ArcMaterial = Arc::new(UniversalMaterial::constant(
        "red plastic",
        Color3::new(0.6, 0.1, 0.1),
        Color3::gray(0.04),
        0.8,
    ));
    let chrome: ArcMaterial = Arc::new(UniversalMaterial::constant(
        "chrome",
        Color3::ZERO,
        Color3::gray(0.9),
        1.0,
    ));
    let glass: ArcMaterial = Arc::new(
        UniversalMaterial::constant("glass", Color3::ZERO, Color3::gray(0.04), 1.0).with_transmission(
            Color3::ONE,
            1.0,
            1.5,
        ),
    );
    let lamp: ArcMaterial = Arc::new(
        UniversalMaterial::constant("lamp", Color3::ZERO, Color3::ZERO, 0.0)
            .with_emission(Arc::new(Texture::constant("lamp", Color4::new(8.0, 7.5, 6.5, 1.0)))),
    );

    // Opaque centre, transparent rim.
    let leaf_texels = (0..16)
        .map(|i| {
            let (x, y) = (i % 4, i / 4);
            let alpha = if (1..3).contains(&x) && (1..3).contains(&y) { 1.0 } else { 0.0 };
            Color4::new(0.2, 0.6, 0.2, alpha)
        })
        .collect();
    let leaf: ArcMaterial = Arc::new(LambertianMaterial::new(
        "leaf",
        Arc::new(Texture::new("leaf", ImageFormat::RGBA32F, 4, 4, leaf_texels)),
        Color3::ZERO,
    ));

    let ball = Arc::new(sphere(0.5, 32, 16));
    let mut scene = ShapeScene::new();
    scene
        .add(Arc::new(
            MeshSurface::new(
                "floor",
                Arc::new(heightfield(10.0, 10.0, 33, &ripples(33, 33))),
                Transform::IDENTITY,
                Some(floor),
            )
            .with_static(),
        ))
        .add(Arc::new(MeshSurface::new(
            "box",
            Arc::new(box_mesh(&Vector3f::new(1.0, 1.0, 1.0))),
            Transform::translate(&Vector3f::new(-1.5, 0.5, -0.5)) * Transform::rotate(30.0, &Vector3f::new(0.0, 1.0, 0.0)),
            Some(red),
        )))
        .add(Arc::new(MeshSurface::new(
            "mirror ball",
            Arc::clone(&ball),
            Transform::translate(&Vector3f::new(0.0, 0.55, -1.0)),
            Some(chrome),
        )))
        .add(Arc::new(MeshSurface::new(
            "glass ball",
            ball,
            Transform::translate(&Vector3f::new(1.3, 0.55, 0.5)),
            Some(glass),
        )))
        .add(Arc::new(
            MeshSurface::new(
                "leaf",
                Arc::new(quad(1.0, 1.0)),
                Transform::translate(&Vector3f::new(-0.2, 1.6, 1.0))
                    * Transform::rotate(90.0, &Vector3f::new(1.0, 0.0, 0.0)),
                Some(leaf),
            )
            .with_two_sided(true),
        ))
        .add(Arc::new(
            MeshSurface::new(
                "lamp",
                Arc::new(quad(2.0, 2.0)),
                Transform::translate(&Vector3f::new(0.0, 4.0, 0.0)) * Transform::scale(1.0, -1.0, 1.0),
                Some(lamp),
            )
            .with_static(),
        ));
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::scene::Scene;

    #[test]
    fn scene_has_every_surface() {
        let scene = demo_scene();
        assert_eq!(scene.len(), 6);
        let mut surfaces = vec![];
        scene.on_pose(&mut surfaces);
        let names: Vec<&str> = surfaces.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["floor", "box", "mirror ball", "glass ball", "leaf", "lamp"]);
    }

    #[test]
    fn lamp_faces_down() {
        let mut surfaces = vec![];
        demo_scene().on_pose(&mut surfaces);
        let extraction = base::surface::get_tris(&surfaces[5..], false);
        for tri in &extraction.tris {
            assert!(tri.geometric_normal(&extraction.vertices).y < 0.0);
        }
    }
}
