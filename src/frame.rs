use ndarray::{Array2, Array3, s};

use crate::error::{TruthpackError, TruthpackResult};

/// Zero-based index of a rendered frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Per-frame raster ground truth, split out of the host's interleaved buffer.
///
/// The first axis is the vertical (y) coordinate, matching the row-major
/// layout the host delivers.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffers {
    /// Surface normals, shape (H, W, 3).
    pub normal: Array3<f32>,
    /// Depth ("Z"), shape (H, W).
    pub z: Array2<f32>,
    /// Object-index pass, shape (H, W), when the host captures it.
    pub obj_ind: Option<Array2<f32>>,
    /// Optical-flow pass, shape (H, W, 4), when the host captures it.
    pub flow: Option<Array3<f32>>,
}

impl FrameBuffers {
    /// Split a flat RGBA-interleaved buffer into normal and depth maps.
    ///
    /// Channel convention: RGB = surface normal, A = depth.
    pub fn from_interleaved_rgba(pixels: &[f32], width: u32, height: u32) -> TruthpackResult<Self> {
        let (w, h) = (width as usize, height as usize);
        let expected = w * h * 4;
        if pixels.len() != expected {
            return Err(TruthpackError::shape(format!(
                "rgba buffer for {width}x{height} must have {expected} floats, got {}",
                pixels.len()
            )));
        }

        let full = Array3::from_shape_vec((h, w, 4), pixels.to_vec())
            .map_err(|e| TruthpackError::shape(format!("rgba buffer reshape failed: {e}")))?;

        Ok(Self {
            normal: full.slice(s![.., .., 0..3]).to_owned(),
            z: full.slice(s![.., .., 3]).to_owned(),
            obj_ind: None,
            flow: None,
        })
    }

    /// Attach an object-index pass (one float per pixel).
    pub fn with_object_index(mut self, pixels: &[f32]) -> TruthpackResult<Self> {
        let (h, w) = self.z.dim();
        if pixels.len() != w * h {
            return Err(TruthpackError::shape(format!(
                "object-index buffer for {w}x{h} must have {} floats, got {}",
                w * h,
                pixels.len()
            )));
        }
        let map = Array2::from_shape_vec((h, w), pixels.to_vec())
            .map_err(|e| TruthpackError::shape(format!("object-index reshape failed: {e}")))?;
        self.obj_ind = Some(map);
        Ok(self)
    }

    /// Attach an optical-flow pass (four floats per pixel).
    pub fn with_flow(mut self, pixels: &[f32]) -> TruthpackResult<Self> {
        let (h, w) = self.z.dim();
        if pixels.len() != w * h * 4 {
            return Err(TruthpackError::shape(format!(
                "flow buffer for {w}x{h} must have {} floats, got {}",
                w * h * 4,
                pixels.len()
            )));
        }
        let map = Array3::from_shape_vec((h, w, 4), pixels.to_vec())
            .map_err(|e| TruthpackError::shape(format!("flow reshape failed: {e}")))?;
        self.flow = Some(map);
        Ok(self)
    }

    pub fn width(&self) -> u32 {
        self.z.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.z.dim().0 as u32
    }
}
