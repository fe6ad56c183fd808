use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use spherecast::{
    AnimationOpts, FrameIndex, FrameJob, RenderSettings, SceneFile, SceneSampler, SchedulerKind,
    SchedulerOpts, create_scheduler,
    encode::{ffmpeg, ppm},
    render_frame, run_frame_job,
};

#[derive(Parser, Debug)]
#[command(name = "spherecast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every frame of an animated scene.
    Render(RenderArgs),
    /// Render a single frame.
    Frame(FrameArgs),
    /// Execute one serialized frame job. Spawned internally by the process
    /// scheduler backend; not for direct use.
    #[command(hide = true)]
    Worker(WorkerArgs),
    /// Write the built-in demo scene as JSON.
    Demo(DemoArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory the frame files are written to.
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Frame files are named `<prefix><index>.ppm`.
    #[arg(long, default_value = "spheres")]
    prefix: String,

    /// Concurrency backend.
    #[arg(long, value_enum, default_value_t = BackendChoice::Pool)]
    backend: BackendChoice,

    /// Worker threads (pool backend only). Defaults to the machine's
    /// available parallelism.
    #[arg(long)]
    workers: Option<usize>,

    /// Image width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Vertical field of view in degrees.
    #[arg(long, default_value_t = 30.0)]
    fov: f32,

    /// Assemble the rendered frames into a video at this path afterwards
    /// (requires `ffmpeg` on PATH).
    #[arg(long)]
    mp4: Option<PathBuf>,

    /// Video frame rate (with --mp4).
    #[arg(long, default_value_t = 25)]
    fps: u32,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output image path. `.ppm` uses the internal encoder; other
    /// extensions go through the `image` crate.
    #[arg(long)]
    out: PathBuf,

    /// Image width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Vertical field of view in degrees.
    #[arg(long, default_value_t = 30.0)]
    fov: f32,
}

#[derive(Parser, Debug)]
struct WorkerArgs {
    /// Serialized frame job file.
    #[arg(long)]
    job: PathBuf,
}

#[derive(Parser, Debug)]
struct DemoArgs {
    /// Output scene JSON path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    /// Shared in-process worker pool.
    Pool,
    /// One independent OS process per frame.
    Process,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Worker(args) => cmd_worker(args),
        Command::Demo(args) => cmd_demo(args),
    }
}

fn load_scene(path: &Path) -> anyhow::Result<SceneFile> {
    SceneFile::from_path(path).with_context(|| format!("load scene '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let scene = load_scene(&args.in_path)?;
    let settings = RenderSettings::new(args.width, args.height, args.fov)?;

    let kind = match args.backend {
        BackendChoice::Pool => SchedulerKind::Pool,
        BackendChoice::Process => SchedulerKind::Process,
    };
    let mut scheduler = create_scheduler(
        kind,
        &SchedulerOpts {
            workers: args.workers,
            worker_exe: None,
        },
    )?;

    let opts = AnimationOpts {
        settings,
        out_dir: args.out_dir.clone(),
        prefix: args.prefix.clone(),
    };

    let start = Instant::now();
    let stats = spherecast::render_animation(&scene, &opts, scheduler.as_mut())?;
    let elapsed = start.elapsed();

    eprintln!(
        "rendered {}/{} frames to {} in {:.2}s",
        stats.frames_rendered,
        stats.frames_total,
        args.out_dir.display(),
        elapsed.as_secs_f64()
    );
    if stats.frames_failed > 0 {
        eprintln!(
            "warning: {} frame(s) failed and are missing from the sequence",
            stats.frames_failed
        );
    }

    if let Some(mp4) = args.mp4 {
        let cfg = ffmpeg::VideoConfig {
            fps: args.fps,
            out_path: mp4.clone(),
            overwrite: true,
        };
        ffmpeg::assemble_video(&args.out_dir, &args.prefix, &cfg)?;
        eprintln!("wrote {}", mp4.display());
    }

    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = load_scene(&args.in_path)?;
    let settings = RenderSettings::new(args.width, args.height, args.fov)?;

    let spheres = SceneSampler::snapshot_at(&scene, FrameIndex(args.frame))?;
    let frame = render_frame(&spheres, &settings)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    if args.out.extension().is_some_and(|ext| ext == "ppm") {
        ppm::write_ppm(&args.out, &frame)?;
    } else {
        image::save_buffer_with_format(
            &args.out,
            &frame.to_rgb8(),
            frame.width(),
            frame.height(),
            image::ColorType::Rgb8,
            image::ImageFormat::from_path(&args.out)
                .with_context(|| format!("unrecognized image format '{}'", args.out.display()))?,
        )
        .with_context(|| format!("write image '{}'", args.out.display()))?;
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_worker(args: WorkerArgs) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&args.job)
        .with_context(|| format!("read job file '{}'", args.job.display()))?;
    let job: FrameJob =
        serde_json::from_str(&json).with_context(|| "parse frame job JSON")?;
    run_frame_job(&job)?;
    Ok(())
}

fn cmd_demo(args: DemoArgs) -> anyhow::Result<()> {
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let f = std::fs::File::create(&args.out)
        .with_context(|| format!("create '{}'", args.out.display()))?;
    serde_json::to_writer_pretty(f, &SceneFile::demo())?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
