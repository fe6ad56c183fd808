use crate::foundation::error::{SpherecastError, SpherecastResult};

pub use glam::Vec3;

/// Linear, unclamped RGB. Channels may exceed 1.0 until quantization.
pub type Color = Vec3;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Image geometry shared by the camera, the framebuffer and the encoders.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Vertical field of view in degrees; the horizontal extent follows from
    /// the aspect ratio.
    pub fov: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fov: 30.0,
        }
    }
}

impl RenderSettings {
    pub fn new(width: u32, height: u32, fov: f32) -> SpherecastResult<Self> {
        let settings = Self { width, height, fov };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> SpherecastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SpherecastError::validation(
                "render width/height must be non-zero",
            ));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(SpherecastError::validation(
                "render fov must be in (0, 180) degrees",
            ));
        }
        Ok(())
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        assert!(RenderSettings::default().validate().is_ok());
    }

    #[test]
    fn settings_validation_catches_bad_values() {
        assert!(RenderSettings::new(0, 480, 30.0).is_err());
        assert!(RenderSettings::new(640, 0, 30.0).is_err());
        assert!(RenderSettings::new(640, 480, 0.0).is_err());
        assert!(RenderSettings::new(640, 480, 180.0).is_err());
        assert!(RenderSettings::new(640, 480, f32::NAN).is_err());
    }

    #[test]
    fn pixel_count_matches_dimensions() {
        let s = RenderSettings::new(64, 48, 30.0).unwrap();
        assert_eq!(s.pixel_count(), 64 * 48);
    }
}
