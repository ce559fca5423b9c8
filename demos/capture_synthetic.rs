//! Capture a few synthetic frames and write PNG previews next to the
//! archives. Run with `cargo run --example capture_synthetic`.

use std::path::PathBuf;

use nalgebra::{Matrix4, Vector3};
use truthpack::{
    CameraConfig, FrameArchive, FrameIndex, FramePixels, FrameSource, SensorFit,
    TruthpackResult, capture_frame, write_depth_png, write_normal_png,
};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;

struct OrbitScene {
    frame: u64,
}

impl FrameSource for OrbitScene {
    fn camera_config(&mut self) -> TruthpackResult<CameraConfig> {
        Ok(CameraConfig::new(
            50.0,
            36.0,
            24.0,
            SensorFit::Auto,
            WIDTH,
            HEIGHT,
        ))
    }

    fn camera_world(&mut self) -> TruthpackResult<Matrix4<f64>> {
        let angle = self.frame as f64 * 0.1;
        Ok(Matrix4::new_translation(&Vector3::new(
            angle.cos() * 5.0,
            angle.sin() * 5.0,
            2.0,
        )))
    }

    fn pixels(&mut self) -> TruthpackResult<FramePixels> {
        // A tilted plane: constant normal, depth ramping across the frame.
        let mut rgba = Vec::with_capacity((WIDTH * HEIGHT * 4) as usize);
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let depth = 1.0 + (x + y) as f32 / WIDTH as f32;
                rgba.extend_from_slice(&[0.0, 0.6, 0.8, depth]);
            }
        }
        Ok(FramePixels::new(WIDTH, HEIGHT, rgba))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let out = PathBuf::from("target/truthpack-demo");
    for frame in 0..3u64 {
        let mut scene = OrbitScene { frame };
        let path = capture_frame(&mut scene, &out, FrameIndex(frame))?;

        let archive = FrameArchive::read(&path)?;
        write_normal_png(&archive.buffers.normal, &path.with_extension("normal.png"))?;
        write_depth_png(&archive.buffers.z, &path.with_extension("z.png"))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}
