use std::path::Path;

use anyhow::Context as _;

use crate::foundation::{
    core::{Color, Vec3},
    error::{SpherecastError, SpherecastResult},
};

/// A sphere scene with start/end keyframes, as loaded from the legacy JSON
/// format (`sphereAmount`, `frameCount`, camelCase per-sphere fields).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneFile {
    pub sphere_amount: usize,
    pub frame_count: u64,
    pub spheres: Vec<SphereDesc>,
}

/// One sphere's keyframe record. Every field except `endRadius` and
/// `emissionColor` is required; a missing required field fails the whole
/// load, not just this sphere.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SphereDesc {
    pub start_pos: Vec3,
    pub end_pos: Vec3,
    pub start_radius: f32,
    #[serde(default)]
    pub end_radius: Option<f32>,
    pub surface_color: Color,
    pub reflection: f32,
    pub transparency: f32,
    /// End keyframe of the surface color (legacy spelling on the wire).
    #[serde(rename = "endColour")]
    pub end_colour: Color,
    /// Non-zero marks this sphere as a point light. Absent in legacy files.
    #[serde(default)]
    pub emission_color: Color,
}

impl SceneFile {
    pub fn from_json(json: &str) -> SpherecastResult<Self> {
        let scene: Self = serde_json::from_str(json)
            .map_err(|e| SpherecastError::scene(format!("failed to parse scene JSON: {e}")))?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn from_path(path: impl AsRef<Path>) -> SpherecastResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene file '{}'", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> SpherecastResult<()> {
        if self.frame_count == 0 {
            return Err(SpherecastError::scene("frameCount must be > 0"));
        }
        if self.sphere_amount != self.spheres.len() {
            return Err(SpherecastError::scene(format!(
                "sphereAmount is {} but {} spheres are listed",
                self.sphere_amount,
                self.spheres.len()
            )));
        }
        for (i, sphere) in self.spheres.iter().enumerate() {
            sphere
                .validate()
                .map_err(|e| SpherecastError::scene(format!("sphere {i}: {e}")))?;
        }
        Ok(())
    }

    /// Built-in example: four reflective spheres on a giant ground sphere,
    /// lit by one emissive sphere, with the red sphere drifting and
    /// shrinking over the animation.
    pub fn demo() -> Self {
        fn fixed(pos: [f32; 3], radius: f32, color: [f32; 3], refl: f32, transp: f32) -> SphereDesc {
            SphereDesc {
                start_pos: Vec3::from_array(pos),
                end_pos: Vec3::from_array(pos),
                start_radius: radius,
                end_radius: None,
                surface_color: Vec3::from_array(color),
                reflection: refl,
                transparency: transp,
                end_colour: Vec3::from_array(color),
                emission_color: Vec3::ZERO,
            }
        }

        let mut spheres = vec![
            fixed([0.0, -10004.0, -20.0], 10000.0, [0.20, 0.20, 0.20], 0.0, 0.0),
            fixed([0.0, 0.0, -20.0], 4.0, [1.00, 0.32, 0.36], 1.0, 0.5),
            fixed([5.0, -1.0, -15.0], 2.0, [0.90, 0.76, 0.46], 1.0, 0.0),
            fixed([5.0, 0.0, -25.0], 3.0, [0.65, 0.77, 0.97], 1.0, 0.0),
            fixed([-5.5, 0.0, -15.0], 3.0, [0.90, 0.90, 0.90], 1.0, 0.0),
        ];
        // Animate the red sphere: drift left and shrink away.
        spheres[1].end_pos = Vec3::new(-4.0, 0.0, -20.0);
        spheres[1].end_radius = Some(1.0);
        // The light.
        spheres.push(SphereDesc {
            start_pos: Vec3::new(0.0, 20.0, -30.0),
            end_pos: Vec3::new(0.0, 20.0, -30.0),
            start_radius: 3.0,
            end_radius: None,
            surface_color: Vec3::ZERO,
            reflection: 0.0,
            transparency: 0.0,
            end_colour: Vec3::ZERO,
            emission_color: Vec3::splat(3.0),
        });

        Self {
            sphere_amount: spheres.len(),
            frame_count: 100,
            spheres,
        }
    }
}

impl SphereDesc {
    fn validate(&self) -> SpherecastResult<()> {
        if !(self.start_radius > 0.0) {
            return Err(SpherecastError::scene("startRadius must be > 0"));
        }
        if let Some(end_radius) = self.end_radius
            && !(end_radius > 0.0)
        {
            return Err(SpherecastError::scene("endRadius must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.reflection) {
            return Err(SpherecastError::scene("reflection must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.transparency) {
            return Err(SpherecastError::scene("transparency must be in [0, 1]"));
        }
        Ok(())
    }
}

/// A fully resolved sphere for one frame. Immutable for the duration of a
/// trace; only the sampler mutates sphere state, between frames.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    /// Cached `radius * radius`; kept consistent by every mutation path.
    pub radius2: f32,
    pub surface_color: Color,
    pub emission_color: Color,
    pub reflection: f32,
    pub transparency: f32,
}

impl Sphere {
    pub fn new(
        center: Vec3,
        radius: f32,
        surface_color: Color,
        emission_color: Color,
        reflection: f32,
        transparency: f32,
    ) -> Self {
        Self {
            center,
            radius,
            radius2: radius * radius,
            surface_color,
            emission_color,
            reflection,
            transparency,
        }
    }

    pub fn is_light(&self) -> bool {
        self.emission_color.cmpgt(Vec3::ZERO).any()
    }

    /// Geometric ray/sphere intersection. Returns the near and far ray
    /// parameters; `t0` is negative when the origin is inside the sphere.
    /// A sphere whose center lies behind the ray origin is a miss.
    pub fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<(f32, f32)> {
        let l = self.center - origin;
        let tca = l.dot(dir);
        if tca < 0.0 {
            return None;
        }
        let d2 = l.dot(l) - tca * tca;
        if d2 > self.radius2 {
            return None;
        }
        let thc = (self.radius2 - d2).sqrt();
        Some((tca - thc, tca + thc))
    }
}

impl From<&SphereDesc> for Sphere {
    fn from(desc: &SphereDesc) -> Self {
        Self::new(
            desc.start_pos,
            desc.start_radius,
            desc.surface_color,
            desc.emission_color,
            desc.reflection,
            desc.transparency,
        )
    }
}
