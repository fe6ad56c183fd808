use crate::foundation::{
    core::{Color, RenderSettings, Vec3},
    error::{SpherecastError, SpherecastResult},
};

/// One frame's worth of pixels: dense, row-major, linear float RGB.
///
/// Owned exclusively by the job that renders it until it is handed to an
/// encoder. Values are unclamped until [`Framebuffer::to_rgb8`].
#[derive(Clone, Debug, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Framebuffer {
    pub fn new(settings: &RenderSettings) -> SpherecastResult<Self> {
        settings.validate()?;
        Ok(Self {
            width: settings.width,
            height: settings.height,
            pixels: vec![Vec3::ZERO; settings.pixel_count()],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) -> SpherecastResult<()> {
        if x >= self.width || y >= self.height {
            return Err(SpherecastError::validation(format!(
                "pixel ({x}, {y}) out of bounds for {}x{}",
                self.width, self.height
            )));
        }
        self.pixels[(y * self.width + x) as usize] = color;
        Ok(())
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Quantizes to packed RGB8: each channel clamped to [0, 1] then scaled
    /// to 0..=255. This is the only place colors are clamped.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for pixel in &self.pixels {
            out.push((pixel.x.clamp(0.0, 1.0) * 255.0) as u8);
            out.push((pixel.y.clamp(0.0, 1.0) * 255.0) as u8);
            out.push((pixel.z.clamp(0.0, 1.0) * 255.0) as u8);
        }
        out
    }
}
