use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use crate::{
    foundation::{
        core::FrameIndex,
        error::{SpherecastError, SpherecastResult},
    },
    render::framebuffer::Framebuffer,
};

/// Output path for one frame: `<dir>/<prefix><index>.ppm`.
pub fn frame_path(dir: &Path, prefix: &str, frame: FrameIndex) -> PathBuf {
    dir.join(format!("{prefix}{}.ppm", frame.0))
}

/// Writes `frame` as a binary PPM: `P6\n<width> <height>\n255\n` followed by
/// one RGB byte triple per pixel, row-major. Channels are clamped to [0, 1]
/// and scaled to 0..=255 at this point and nowhere earlier.
pub fn write_ppm(path: &Path, frame: &Framebuffer) -> SpherecastResult<()> {
    let file = std::fs::File::create(path).map_err(|e| {
        SpherecastError::encode(format!("failed to create '{}': {e}", path.display()))
    })?;
    let mut out = std::io::BufWriter::new(file);

    let write = |out: &mut std::io::BufWriter<std::fs::File>, bytes: &[u8]| {
        out.write_all(bytes).map_err(|e| {
            SpherecastError::encode(format!("failed to write '{}': {e}", path.display()))
        })
    };

    let header = format!("P6\n{} {}\n255\n", frame.width(), frame.height());
    write(&mut out, header.as_bytes())?;
    write(&mut out, &frame.to_rgb8())?;
    out.flush()
        .map_err(|e| SpherecastError::encode(format!("failed to flush '{}': {e}", path.display())))
}
