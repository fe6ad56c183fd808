use std::path::PathBuf;

use anyhow::Context as _;
use tracing::debug;

use crate::{
    encode::ppm,
    foundation::{core::RenderSettings, error::SpherecastResult},
    render::{
        camera::Camera,
        dispatch::{FrameJob, FrameScheduler},
        framebuffer::Framebuffer,
        tracer,
    },
    scene::{model::SceneFile, model::Sphere, sampler::SceneSampler},
};

/// Renders one frame from a resolved sphere snapshot: one primary ray per
/// pixel, traced recursively. Pure computation; identical inputs produce
/// identical framebuffers.
pub fn render_frame(spheres: &[Sphere], settings: &RenderSettings) -> SpherecastResult<Framebuffer> {
    let mut frame = Framebuffer::new(settings)?;
    let camera = Camera::new(settings);
    for y in 0..settings.height {
        for x in 0..settings.width {
            let dir = camera.primary_ray(x, y);
            frame.set(x, y, tracer::trace(glam::Vec3::ZERO, dir, spheres, 0))?;
        }
    }
    Ok(frame)
}

#[derive(Clone, Debug)]
pub struct AnimationOpts {
    pub settings: RenderSettings,
    pub out_dir: PathBuf,
    /// Frame files are named `<prefix><index>.ppm`.
    pub prefix: String,
}

impl Default for AnimationOpts {
    fn default() -> Self {
        Self {
            settings: RenderSettings::default(),
            out_dir: PathBuf::from("output"),
            prefix: "spheres".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_total: u64,
    pub frames_rendered: u64,
    pub frames_failed: u64,
}

/// Renders the whole animation.
///
/// Frame advancement is strictly sequential — the sampler mutates scene
/// state, so it is driven from this single loop only — but each frame's
/// snapshot is captured by value at submission time, letting the scheduler
/// execute all renders concurrently and complete them in any order.
/// Blocks until the batch is done.
#[tracing::instrument(skip(scene, scheduler))]
pub fn render_animation(
    scene: &SceneFile,
    opts: &AnimationOpts,
    scheduler: &mut dyn FrameScheduler,
) -> SpherecastResult<RenderStats> {
    // Fail fast: nothing is scheduled unless the whole input is sound.
    scene.validate()?;
    opts.settings.validate()?;
    std::fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("failed to create output directory '{}'", opts.out_dir.display()))?;

    let mut sampler = SceneSampler::new(scene)?;
    for _ in 0..sampler.frame_count() {
        let (frame, spheres) = sampler.next_frame();
        debug!(frame = frame.0, "submitting frame");
        scheduler.submit(FrameJob {
            frame,
            spheres,
            settings: opts.settings,
            out_path: ppm::frame_path(&opts.out_dir, &opts.prefix, frame),
        })?;
    }

    let report = scheduler.wait_all()?;
    Ok(RenderStats {
        frames_total: scene.frame_count,
        frames_rendered: report.completed,
        frames_failed: report.failed,
    })
}
