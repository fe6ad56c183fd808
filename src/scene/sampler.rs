use crate::{
    foundation::{
        core::{FrameIndex, Vec3},
        error::SpherecastResult,
    },
    scene::model::{SceneFile, Sphere},
};

/// Per-frame increments for one sphere: `(end - start) / frameCount`.
#[derive(Clone, Copy, Debug)]
struct SphereStep {
    movement: Vec3,
    colour_change: Vec3,
    radius_change: f32,
}

/// The scene snapshot provider. Hands out one value-copied sphere list per
/// frame and advances its internal keyframe interpolation as a side effect.
///
/// `next_frame` is inherently sequential: it must be called once per frame,
/// in frame order, from a single thread. Workers never touch the sampler;
/// they only read snapshots it has already produced.
#[derive(Clone, Debug)]
pub struct SceneSampler {
    spheres: Vec<Sphere>,
    steps: Vec<SphereStep>,
    frame_count: u64,
    next: u64,
}

impl SceneSampler {
    pub fn new(scene: &SceneFile) -> SpherecastResult<Self> {
        scene.validate()?;
        let inv_frames = 1.0 / scene.frame_count as f32;
        let spheres: Vec<Sphere> = scene.spheres.iter().map(Sphere::from).collect();
        let steps = scene
            .spheres
            .iter()
            .map(|desc| SphereStep {
                movement: (desc.end_pos - desc.start_pos) * inv_frames,
                colour_change: (desc.end_colour - desc.surface_color) * inv_frames,
                radius_change: (desc.end_radius.unwrap_or(desc.start_radius)
                    - desc.start_radius)
                    * inv_frames,
            })
            .collect();
        Ok(Self {
            spheres,
            steps,
            frame_count: scene.frame_count,
            next: 0,
        })
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the snapshot for the current frame, then advances the scene
    /// state by one frame's worth of interpolation. Frame 0 is exactly the
    /// start keyframe.
    pub fn next_frame(&mut self) -> (FrameIndex, Vec<Sphere>) {
        let frame = FrameIndex(self.next);
        let snapshot = self.spheres.clone();
        for (sphere, step) in self.spheres.iter_mut().zip(&self.steps) {
            sphere.center += step.movement;
            sphere.surface_color += step.colour_change;
            sphere.radius += step.radius_change;
            sphere.radius2 = sphere.radius * sphere.radius;
        }
        self.next += 1;
        (frame, snapshot)
    }

    /// Resolves the snapshot for `frame` by stepping a fresh sampler, so an
    /// out-of-process worker arrives at bit-identical sphere state.
    pub fn snapshot_at(scene: &SceneFile, frame: FrameIndex) -> SpherecastResult<Vec<Sphere>> {
        let mut sampler = Self::new(scene)?;
        let mut snapshot = sampler.next_frame().1;
        for _ in 0..frame.0 {
            snapshot = sampler.next_frame().1;
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::model::SphereDesc;

    fn moving_scene(frames: u64) -> SceneFile {
        SceneFile {
            sphere_amount: 1,
            frame_count: frames,
            spheres: vec![SphereDesc {
                start_pos: Vec3::new(0.0, 0.0, -20.0),
                end_pos: Vec3::new(10.0, 0.0, -20.0),
                start_radius: 2.0,
                end_radius: Some(4.0),
                surface_color: Vec3::new(1.0, 0.0, 0.0),
                reflection: 0.0,
                transparency: 0.0,
                end_colour: Vec3::new(0.0, 1.0, 0.0),
                emission_color: Vec3::ZERO,
            }],
        }
    }

    #[test]
    fn frame_zero_is_the_start_keyframe() {
        let scene = moving_scene(10);
        let mut sampler = SceneSampler::new(&scene).unwrap();
        let (frame, snapshot) = sampler.next_frame();
        assert_eq!(frame, FrameIndex(0));
        assert_eq!(snapshot[0].center, Vec3::new(0.0, 0.0, -20.0));
        assert_eq!(snapshot[0].radius, 2.0);
    }

    #[test]
    fn accumulated_steps_reach_the_end_keyframe() {
        let scene = moving_scene(10);
        let mut sampler = SceneSampler::new(&scene).unwrap();
        let mut last = Vec::new();
        for _ in 0..scene.frame_count {
            last = sampler.next_frame().1;
        }
        // After F-1 advances past frame 0, the last snapshot is one step
        // short of the end; one more advance lands on it.
        let end = sampler.next_frame().1;
        assert!((end[0].center - Vec3::new(10.0, 0.0, -20.0)).length() < 1e-4);
        assert!((end[0].radius - 4.0).abs() < 1e-4);
        assert!((end[0].surface_color - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-4);
        assert!(last[0].center.x < end[0].center.x);
    }

    #[test]
    fn radius_squared_stays_consistent() {
        let scene = moving_scene(4);
        let mut sampler = SceneSampler::new(&scene).unwrap();
        for _ in 0..6 {
            let (_, snapshot) = sampler.next_frame();
            let sphere = &snapshot[0];
            assert!((sphere.radius2 - sphere.radius * sphere.radius).abs() < 1e-6);
        }
    }

    #[test]
    fn snapshot_at_matches_sequential_stepping() {
        let scene = moving_scene(8);
        let mut sampler = SceneSampler::new(&scene).unwrap();
        for i in 0..8 {
            let (frame, stepped) = sampler.next_frame();
            let resolved = SceneSampler::snapshot_at(&scene, frame).unwrap();
            assert_eq!(stepped, resolved, "frame {i}");
        }
    }
}
