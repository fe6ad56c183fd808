use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::foundation::error::{SpherecastError, SpherecastResult};

/// Settings for assembling the rendered PPM sequence into a video with the
/// system `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct VideoConfig {
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl VideoConfig {
    pub fn validate(&self) -> SpherecastResult<()> {
        if self.fps == 0 {
            return Err(SpherecastError::validation("video fps must be non-zero"));
        }
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Assembles `<frames_dir>/<prefix>%d.ppm` into a video file. Requires
/// `ffmpeg` on PATH; checked up front so the error is immediate rather than
/// a spawn failure.
pub fn assemble_video(frames_dir: &Path, prefix: &str, cfg: &VideoConfig) -> SpherecastResult<()> {
    cfg.validate()?;

    if !cfg.overwrite && cfg.out_path.exists() {
        return Err(SpherecastError::validation(format!(
            "output file '{}' already exists",
            cfg.out_path.display()
        )));
    }

    if !is_ffmpeg_on_path() {
        return Err(SpherecastError::encode(
            "ffmpeg is required for video assembly, but was not found on PATH",
        ));
    }

    let pattern = frames_dir.join(format!("{prefix}%d.ppm"));

    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::null()).stdout(Stdio::null());
    cmd.arg(if cfg.overwrite { "-y" } else { "-n" });
    cmd.args(["-loglevel", "error", "-framerate", &cfg.fps.to_string(), "-i"])
        .arg(&pattern)
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .arg(&cfg.out_path);

    let output = cmd.output().map_err(|e| {
        SpherecastError::encode(format!("failed to run ffmpeg: {e}"))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SpherecastError::encode(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}
