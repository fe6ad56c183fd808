use std::path::PathBuf;

use spherecast::{SceneFile, SphereDesc, Vec3};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_spherecast")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "spherecast.exe"
            } else {
                "spherecast"
            });
            p
        })
}

fn write_scene(dir: &std::path::Path, frames: u64) -> PathBuf {
    let scene = SceneFile {
        sphere_amount: 2,
        frame_count: frames,
        spheres: vec![
            SphereDesc {
                start_pos: Vec3::new(0.0, 0.0, -20.0),
                end_pos: Vec3::new(2.0, 0.0, -20.0),
                start_radius: 4.0,
                end_radius: None,
                surface_color: Vec3::new(1.0, 0.32, 0.36),
                reflection: 0.0,
                transparency: 0.0,
                end_colour: Vec3::new(1.0, 0.32, 0.36),
                emission_color: Vec3::ZERO,
            },
            SphereDesc {
                start_pos: Vec3::new(0.0, 20.0, -30.0),
                end_pos: Vec3::new(0.0, 20.0, -30.0),
                start_radius: 3.0,
                end_radius: None,
                surface_color: Vec3::ZERO,
                reflection: 0.0,
                transparency: 0.0,
                end_colour: Vec3::ZERO,
                emission_color: Vec3::splat(3.0),
            },
        ],
    };

    let path = dir.join("scene.json");
    let f = std::fs::File::create(&path).unwrap();
    serde_json::to_writer_pretty(f, &scene).unwrap();
    path
}

#[test]
fn cli_frame_writes_ppm() {
    let dir = scratch_dir("frame_ppm");
    let scene_path = write_scene(&dir, 1);
    let out_path = dir.join("frame0.ppm");
    let _ = std::fs::remove_file(&out_path);

    let status = std::process::Command::new(exe())
        .args(["frame", "--frame", "0", "--width", "16", "--height", "12", "--in"])
        .arg(&scene_path)
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let bytes = std::fs::read(&out_path).unwrap();
    let header = b"P6\n16 12\n255\n";
    assert_eq!(&bytes[..header.len()], header);
    assert_eq!(bytes.len(), header.len() + 16 * 12 * 3);
}

#[test]
fn cli_frame_writes_png_via_image_crate() {
    let dir = scratch_dir("frame_png");
    let scene_path = write_scene(&dir, 1);
    let out_path = dir.join("frame0.png");
    let _ = std::fs::remove_file(&out_path);

    let status = std::process::Command::new(exe())
        .args(["frame", "--frame", "0", "--width", "16", "--height", "12", "--in"])
        .arg(&scene_path)
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let bytes = std::fs::read(&out_path).unwrap();
    assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
}

#[test]
fn cli_render_process_backend_renders_every_frame() {
    // End to end through the hidden `worker` subcommand: one spawned child
    // per frame, each re-rendering from its own job file.
    let dir = scratch_dir("render_process");
    let scene_path = write_scene(&dir, 2);
    let out_dir = dir.join("frames");

    let status = std::process::Command::new(exe())
        .args(["render", "--backend", "process", "--width", "16", "--height", "12", "--in"])
        .arg(&scene_path)
        .arg("--out-dir")
        .arg(&out_dir)
        .status()
        .unwrap();

    assert!(status.success());
    for i in 0..2 {
        let path = out_dir.join(format!("spheres{i}.ppm"));
        assert!(path.exists(), "missing {}", path.display());
    }
}

#[test]
fn cli_render_fails_fast_on_an_invalid_scene() {
    let dir = scratch_dir("render_invalid");
    let scene_path = dir.join("scene.json");
    std::fs::write(&scene_path, r#"{"sphereAmount": 1, "frameCount": 0, "spheres": []}"#).unwrap();
    let out_dir = dir.join("frames");

    let status = std::process::Command::new(exe())
        .args(["render", "--in"])
        .arg(&scene_path)
        .arg("--out-dir")
        .arg(&out_dir)
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(!out_dir.exists());
}

#[test]
fn cli_demo_scene_parses_back() {
    let dir = scratch_dir("demo");
    let out_path = dir.join("demo.json");
    let _ = std::fs::remove_file(&out_path);

    let status = std::process::Command::new(exe())
        .args(["demo", "--out"])
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let scene = SceneFile::from_path(&out_path).unwrap();
    assert!(scene.frame_count > 0);
}
