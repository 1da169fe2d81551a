//! Pinhole camera

use base::geometry::{Point3f, Ray, Vector3f};
use base::gpu::{ImageFormat, Texture};
use base::pbrt::{Float, PI};
use base::spectrum::Color4;

/// A pinhole camera generating one primary ray per pixel sample.
#[derive(Copy, Clone, Debug)]
pub struct PinholeCamera {
    eye: Point3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    tan_half_fov: Float,
    width: usize,
    height: usize,
}

impl PinholeCamera {
    /// Create a new camera.
    ///
    /// * `eye`    - Centre of projection.
    /// * `target` - Point the camera looks at.
    /// * `up`     - Approximate up direction.
    /// * `fov`    - Vertical field of view in degrees.
    /// * `width`  - Image width in pixels.
    /// * `height` - Image height in pixels.
    pub fn look_at(eye: Point3f, target: Point3f, up: Vector3f, fov: Float, width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "camera image must not be empty");
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward);
        Self {
            eye,
            forward,
            right,
            up,
            tan_half_fov: (0.5 * fov * PI / 180.0).tan(),
            width,
            height,
        }
    }

    /// Returns the image width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the ray through a point on the image plane. Pixel `(0, 0)` is
    /// the top left corner.
    ///
    /// * `x` - Horizontal position in pixels.
    /// * `y` - Vertical position in pixels.
    pub fn ray(&self, x: Float, y: Float) -> Ray {
        let aspect = self.width as Float / self.height as Float;
        let sx = (2.0 * x / self.width as Float - 1.0) * self.tan_half_fov * aspect;
        let sy = (1.0 - 2.0 * y / self.height as Float) * self.tan_half_fov;
        let direction = (self.forward + self.right * sx + self.up * sy).normalize();
        Ray::new(self.eye, direction)
    }

    /// Returns RGBA32F origin and direction textures with one ray through the
    /// centre of each pixel.
    pub fn ray_textures(&self) -> (Texture, Texture) {
        let mut origins = Vec::with_capacity(self.width * self.height);
        let mut directions = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let ray = self.ray(x as Float + 0.5, y as Float + 0.5);
                origins.push(Color4::new(ray.origin.x, ray.origin.y, ray.origin.z, ray.min_distance));
                // A zero maximum distance is unbounded.
                directions.push(Color4::new(ray.direction.x, ray.direction.y, ray.direction.z, 0.0));
            }
        }
        (
            Texture::new("ray origins", ImageFormat::RGBA32F, self.width, self.height, origins),
            Texture::new("ray directions", ImageFormat::RGBA32F, self.width, self.height, directions),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::geometry::Dot;
    use float_cmp::approx_eq;

    fn camera() -> PinholeCamera {
        PinholeCamera::look_at(
            Point3f::new(0.0, 0.0, 5.0),
            Point3f::zero(),
            Vector3f::new(0.0, 1.0, 0.0),
            90.0,
            4,
            2,
        )
    }

    #[test]
    fn centre_ray_looks_at_target() {
        let r = camera().ray(2.0, 1.0);
        assert!(approx_eq!(f32, r.direction.z, -1.0, epsilon = 1e-6));
        assert_eq!(r.origin, Point3f::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn corners_follow_image_orientation() {
        let c = camera();
        let top_left = c.ray(0.0, 0.0).direction;
        assert!(top_left.x < 0.0 && top_left.y > 0.0);
        let bottom_right = c.ray(4.0, 2.0).direction;
        assert!(bottom_right.x > 0.0 && bottom_right.y < 0.0);
        // 90 degree vertical field of view.
        let top = c.ray(2.0, 0.0).direction;
        assert!(approx_eq!(f32, top.dot(&Vector3f::new(0.0, 0.0, -1.0)), (0.25 * PI).cos(), epsilon = 1e-5));
    }

    #[test]
    fn ray_textures_match_rays() {
        let c = camera();
        let (origin, direction) = c.ray_textures();
        assert_eq!((origin.width(), origin.height()), (4, 2));
        let o = origin.sample(&base::geometry::point2(0.125, 0.25));
        assert_eq!(o, Color4::new(0.0, 0.0, 5.0, 0.0));
        let d = direction.sample(&base::geometry::point2(0.125, 0.25));
        let r = c.ray(0.5, 0.5);
        assert!(approx_eq!(f32, d.r, r.direction.x, epsilon = 1e-6));
        assert_eq!(d.a, 0.0);
    }
}
