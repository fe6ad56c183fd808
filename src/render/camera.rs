use crate::foundation::core::{RenderSettings, Vec3};

/// Pinhole camera fixed at the origin, looking down -Z.
///
/// Pixel centers map to normalized device coordinates, scaled by
/// `tan(fov / 2)` and aspect-corrected in x; y grows downward in image
/// space, so it is flipped here.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    inv_width: f32,
    inv_height: f32,
    aspect: f32,
    angle: f32,
}

impl Camera {
    pub fn new(settings: &RenderSettings) -> Self {
        let width = settings.width as f32;
        let height = settings.height as f32;
        Self {
            inv_width: 1.0 / width,
            inv_height: 1.0 / height,
            aspect: width / height,
            angle: (settings.fov.to_radians() * 0.5).tan(),
        }
    }

    /// Normalized direction of the primary ray through pixel `(x, y)`.
    pub fn primary_ray(&self, x: u32, y: u32) -> Vec3 {
        let xx = (2.0 * (x as f32 + 0.5) * self.inv_width - 1.0) * self.angle * self.aspect;
        let yy = (1.0 - 2.0 * (y as f32 + 0.5) * self.inv_height) * self.angle;
        Vec3::new(xx, yy, -1.0).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::RenderSettings;

    #[test]
    fn rays_are_normalized_and_forward() {
        let camera = Camera::new(&RenderSettings::default());
        for &(x, y) in &[(0, 0), (639, 0), (0, 479), (639, 479), (320, 240)] {
            let dir = camera.primary_ray(x, y);
            assert!((dir.length() - 1.0).abs() < 1e-5);
            assert!(dir.z < 0.0);
        }
    }

    #[test]
    fn image_axes_match_screen_conventions() {
        let camera = Camera::new(&RenderSettings::default());
        // Left of center points -x, top of center points +y.
        assert!(camera.primary_ray(0, 240).x < 0.0);
        assert!(camera.primary_ray(639, 240).x > 0.0);
        assert!(camera.primary_ray(320, 0).y > 0.0);
        assert!(camera.primary_ray(320, 479).y < 0.0);
    }

    #[test]
    fn wider_fov_spreads_the_corners() {
        let narrow = Camera::new(&RenderSettings::new(640, 480, 30.0).unwrap());
        let wide = Camera::new(&RenderSettings::new(640, 480, 90.0).unwrap());
        assert!(wide.primary_ray(0, 0).x.abs() > narrow.primary_ray(0, 0).x.abs());
    }
}
