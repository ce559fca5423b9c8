use std::path::{Path, PathBuf};

use nalgebra::Matrix4;

use crate::{
    archive::FrameArchive,
    camera::{CameraConfig, Extrinsics, Intrinsics},
    error::{TruthpackError, TruthpackResult},
    frame::{FrameBuffers, FrameIndex},
};

/// Raw per-frame raster data pulled from the host.
#[derive(Clone, Debug)]
pub struct FramePixels {
    pub width: u32,
    pub height: u32,
    /// RGBA-interleaved floats; RGB = surface normal, A = depth.
    pub rgba: Vec<f32>,
    /// Object-index pass, one float per pixel, when the host captures it.
    pub object_index: Option<Vec<f32>>,
    /// Optical-flow pass, four floats per pixel, when the host captures it.
    pub flow: Option<Vec<f32>>,
}

impl FramePixels {
    pub fn new(width: u32, height: u32, rgba: Vec<f32>) -> Self {
        Self {
            width,
            height,
            rgba,
            object_index: None,
            flow: None,
        }
    }
}

/// Host capability: everything the capture pipeline needs about the scene at
/// the instant a frame finished rendering.
///
/// The host is responsible for having set up whatever render passes produce
/// the documented channel layout before rendering starts; the pipeline only
/// consumes the result. All three methods must describe the same instant, so
/// that matrices and pixels stay paired.
pub trait FrameSource {
    /// Camera/sensor/resolution state for the frame.
    fn camera_config(&mut self) -> TruthpackResult<CameraConfig>;

    /// The camera's world transform (not yet inverted).
    fn camera_world(&mut self) -> TruthpackResult<Matrix4<f64>>;

    /// The rendered pixel buffer for the frame.
    fn pixels(&mut self) -> TruthpackResult<FramePixels>;
}

/// Capture one frame's ground truth from `source` and write its archive
/// under `base_dir`. Returns the path of the written archive.
///
/// Each call is independent: a failure affects only this frame, and
/// re-running for the same frame index overwrites the prior archive.
#[tracing::instrument(skip(source))]
pub fn capture_frame(
    source: &mut dyn FrameSource,
    base_dir: &Path,
    frame: FrameIndex,
) -> TruthpackResult<PathBuf> {
    let config = source.camera_config()?;
    let intrinsics = Intrinsics::from_config(&config)?;
    let extrinsics = Extrinsics::from_world(source.camera_world()?)?;

    let px = source.pixels()?;
    if (px.width, px.height) != (config.resolution_x, config.resolution_y) {
        return Err(TruthpackError::shape(format!(
            "pixel buffer is {}x{} but camera config declares {}x{}",
            px.width, px.height, config.resolution_x, config.resolution_y
        )));
    }

    let mut buffers = FrameBuffers::from_interleaved_rgba(&px.rgba, px.width, px.height)?;
    if let Some(obj_ind) = &px.object_index {
        buffers = buffers.with_object_index(obj_ind)?;
    }
    if let Some(flow) = &px.flow {
        buffers = buffers.with_flow(flow)?;
    }

    FrameArchive::new(&intrinsics, &extrinsics, buffers).write(base_dir, frame)
}
