#![forbid(unsafe_code)]

//! Animated sphere-scene ray tracer.
//!
//! A scene of spheres (some emissive, acting as point lights) is rendered
//! frame by frame: each pixel's color comes from recursively tracing a
//! camera ray through reflections, refractions and shadow tests. Frames are
//! independent once their sphere snapshot has been captured, so the whole
//! animation is farmed out one job per frame to a scheduler — either a
//! shared in-process worker pool or one spawned OS process per frame.

pub mod encode;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod schedule;

pub use foundation::core::{Color, FrameIndex, RenderSettings, Vec3};
pub use foundation::error::{SpherecastError, SpherecastResult};
pub use render::dispatch::{
    BatchReport, FrameJob, FrameScheduler, SchedulerKind, SchedulerOpts, create_scheduler,
    run_frame_job,
};
pub use render::pipeline::{AnimationOpts, RenderStats, render_animation, render_frame};
pub use scene::model::{SceneFile, Sphere, SphereDesc};
pub use scene::sampler::SceneSampler;
