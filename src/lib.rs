//! Truthpack derives per-frame ground-truth computer-vision data for a
//! rendered scene and packages it as one compressed archive per frame.
//!
//! # Pipeline overview
//!
//! 1. **Intrinsics**: `CameraConfig -> Intrinsics` (pinhole matrix in pixel
//!    units, handling sensor fit, anisotropic pixel aspect and lens shift)
//! 2. **Extrinsics**: the camera's world transform, inverted
//! 3. **Reshape**: flat RGBA floats -> normal map (HxWx3) + depth map (HxW)
//! 4. **Package**: all arrays into `<base>/<frame:04>.npz` under the fixed
//!    entry names `intr`, `extr`, `normal_map`, `z_map`
//!
//! Every step is a pure function of the current frame's inputs; there is no
//! caching or cross-frame state. The host supplies scene state through the
//! [`FrameSource`] trait and [`capture_frame`] drives one frame end to end.
#![deny(unsafe_code)]

pub mod archive;
pub mod camera;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod preview;

pub use archive::{ARCHIVE_EXT, FrameArchive, archive_path};
pub use camera::{CameraConfig, Extrinsics, Intrinsics, SensorFit, scaled_resolution};
pub use error::{TruthpackError, TruthpackResult};
pub use frame::{FrameBuffers, FrameIndex};
pub use pipeline::{FramePixels, FrameSource, capture_frame};
pub use preview::{write_depth_png, write_normal_png};
