use nalgebra::{Matrix3, Matrix4};

use crate::error::{TruthpackError, TruthpackResult};

/// Which physical sensor dimension governs the pixel-to-mm scale when the
/// render aspect ratio differs from the sensor's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SensorFit {
    /// Pick horizontal or vertical from the apparent pixel extents.
    Auto,
    /// Sensor width is the reference dimension.
    Horizontal,
    /// Sensor height is the reference dimension.
    Vertical,
}

impl SensorFit {
    /// Resolve `Auto` against the apparent pixel extents of each axis.
    ///
    /// `Auto` becomes `Horizontal` when `size_x >= size_y`, else `Vertical`.
    /// The `>=` tie-break is part of the downstream numeric contract; do not
    /// change it.
    pub fn resolve(self, size_x: f64, size_y: f64) -> SensorFit {
        match self {
            SensorFit::Auto => {
                if size_x >= size_y {
                    SensorFit::Horizontal
                } else {
                    SensorFit::Vertical
                }
            }
            explicit => explicit,
        }
    }
}

/// Lens, sensor and render-resolution state for one frame.
///
/// All fields are read-only inputs supplied by the host per frame; resolution
/// is the effective render resolution in pixels (after any resolution scale,
/// see [`scaled_resolution`]). Lens shift is in fractional sensor units.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraConfig {
    pub focal_length_mm: f64,
    pub sensor_width_mm: f64,
    pub sensor_height_mm: f64,
    pub sensor_fit: SensorFit,
    pub shift_x: f64,
    pub shift_y: f64,
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub pixel_aspect_x: f64,
    pub pixel_aspect_y: f64,
}

impl CameraConfig {
    /// Config with no lens shift and square pixels.
    pub fn new(
        focal_length_mm: f64,
        sensor_width_mm: f64,
        sensor_height_mm: f64,
        sensor_fit: SensorFit,
        resolution_x: u32,
        resolution_y: u32,
    ) -> Self {
        Self {
            focal_length_mm,
            sensor_width_mm,
            sensor_height_mm,
            sensor_fit,
            shift_x: 0.0,
            shift_y: 0.0,
            resolution_x,
            resolution_y,
            pixel_aspect_x: 1.0,
            pixel_aspect_y: 1.0,
        }
    }

    pub fn with_shift(mut self, shift_x: f64, shift_y: f64) -> Self {
        self.shift_x = shift_x;
        self.shift_y = shift_y;
        self
    }

    pub fn with_pixel_aspect(mut self, pixel_aspect_x: f64, pixel_aspect_y: f64) -> Self {
        self.pixel_aspect_x = pixel_aspect_x;
        self.pixel_aspect_y = pixel_aspect_y;
        self
    }

    /// Check the invariants the intrinsics derivation relies on.
    pub fn validate(&self) -> TruthpackResult<()> {
        if !(self.focal_length_mm > 0.0) {
            return Err(TruthpackError::config(format!(
                "focal length must be > 0 mm, got {}",
                self.focal_length_mm
            )));
        }
        if !(self.sensor_width_mm > 0.0) || !(self.sensor_height_mm > 0.0) {
            return Err(TruthpackError::config(format!(
                "sensor dimensions must be > 0 mm, got {}x{}",
                self.sensor_width_mm, self.sensor_height_mm
            )));
        }
        if self.resolution_x == 0 || self.resolution_y == 0 {
            return Err(TruthpackError::config(format!(
                "render resolution must be > 0 px, got {}x{}",
                self.resolution_x, self.resolution_y
            )));
        }
        if !(self.pixel_aspect_x > 0.0) || !(self.pixel_aspect_y > 0.0) {
            return Err(TruthpackError::config(format!(
                "pixel aspect must be > 0, got {}:{}",
                self.pixel_aspect_x, self.pixel_aspect_y
            )));
        }
        Ok(())
    }
}

/// Effective render resolution from a base resolution and a percentage scale,
/// truncated to whole pixels.
pub fn scaled_resolution(base_x: u32, base_y: u32, percentage: f64) -> (u32, u32) {
    let scale = percentage / 100.0;
    (
        (f64::from(base_x) * scale) as u32,
        (f64::from(base_y) * scale) as u32,
    )
}

/// Pinhole intrinsics in pixel units: focal lengths and principal point.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Intrinsics {
    /// Derive pinhole intrinsics from a camera configuration.
    ///
    /// The reference sensor dimension follows the declared fit mode (height
    /// for `Vertical`, width otherwise, including `Auto`), while the
    /// reference pixel extent follows the *resolved* fit mode. Lens shift
    /// moves the principal point by a fraction of the reference extent.
    pub fn from_config(cfg: &CameraConfig) -> TruthpackResult<Self> {
        cfg.validate()?;

        let res_x = f64::from(cfg.resolution_x);
        let res_y = f64::from(cfg.resolution_y);

        let sensor_size_mm = match cfg.sensor_fit {
            SensorFit::Vertical => cfg.sensor_height_mm,
            _ => cfg.sensor_width_mm,
        };
        let fit = cfg
            .sensor_fit
            .resolve(cfg.pixel_aspect_x * res_x, cfg.pixel_aspect_y * res_y);

        // Ratio of vertical to horizontal apparent pixel size.
        let pixel_aspect = cfg.pixel_aspect_y / cfg.pixel_aspect_x;

        let view_fac_px = match fit {
            SensorFit::Vertical => pixel_aspect * res_y,
            _ => res_x,
        };

        let mm_per_px = sensor_size_mm / cfg.focal_length_mm / view_fac_px;
        let fx = 1.0 / mm_per_px;
        let fy = fx / pixel_aspect;
        let cx = (res_x - 1.0) / 2.0 - cfg.shift_x * view_fac_px;
        let cy = (res_y - 1.0) / 2.0 + cfg.shift_y * view_fac_px / pixel_aspect;

        Ok(Self { fx, fy, cx, cy })
    }

    /// The 3x3 intrinsic matrix `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]`.
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }
}

/// World-to-camera transform at render time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Extrinsics(Matrix4<f64>);

impl Extrinsics {
    /// Wrap a transform that is already world-to-camera.
    pub fn from_world_to_camera(matrix: Matrix4<f64>) -> Self {
        Self(matrix)
    }

    /// Invert the camera's world transform to get world-to-camera.
    pub fn from_world(world: Matrix4<f64>) -> TruthpackResult<Self> {
        world.try_inverse().map(Self).ok_or_else(|| {
            TruthpackError::config("camera world transform is singular, cannot invert")
        })
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Vector3};

    use super::*;

    fn full_frame_1080p() -> CameraConfig {
        CameraConfig::new(50.0, 36.0, 24.0, SensorFit::Auto, 1920, 1080)
    }

    #[test]
    fn full_frame_1080p_reference_values() {
        let i = Intrinsics::from_config(&full_frame_1080p()).unwrap();
        assert_relative_eq!(i.fx, 1920.0 * 50.0 / 36.0, max_relative = 1e-12);
        assert_relative_eq!(i.fx, 2666.666_666_7, max_relative = 1e-9);
        assert_relative_eq!(i.fy, i.fx, max_relative = 1e-12);
        assert_eq!(i.cx, 959.5);
        assert_eq!(i.cy, 539.5);
    }

    #[test]
    fn auto_matches_explicit_fit_for_square_pixels() {
        let landscape = full_frame_1080p();
        let explicit = CameraConfig {
            sensor_fit: SensorFit::Horizontal,
            ..landscape
        };
        assert_eq!(
            Intrinsics::from_config(&landscape).unwrap(),
            Intrinsics::from_config(&explicit).unwrap()
        );

        // Portrait resolves vertical, but the reference sensor dimension
        // stays the width under Auto, so only the pixel extent changes.
        let portrait = CameraConfig {
            resolution_x: 1080,
            resolution_y: 1920,
            ..landscape
        };
        let i = Intrinsics::from_config(&portrait).unwrap();
        assert_relative_eq!(i.fx, 1920.0 * 50.0 / 36.0, max_relative = 1e-12);
    }

    #[test]
    fn auto_resolution_follows_pixel_extents() {
        assert_eq!(SensorFit::Auto.resolve(1920.0, 1080.0), SensorFit::Horizontal);
        assert_eq!(SensorFit::Auto.resolve(1080.0, 1920.0), SensorFit::Vertical);
        assert_eq!(SensorFit::Auto.resolve(1024.0, 1024.0), SensorFit::Horizontal);
        assert_eq!(SensorFit::Horizontal.resolve(1.0, 2.0), SensorFit::Horizontal);
        assert_eq!(SensorFit::Vertical.resolve(2.0, 1.0), SensorFit::Vertical);
    }

    #[test]
    fn auto_tie_break_prefers_horizontal() {
        let square = CameraConfig::new(35.0, 36.0, 24.0, SensorFit::Auto, 1024, 1024);
        let horizontal = CameraConfig {
            sensor_fit: SensorFit::Horizontal,
            ..square
        };
        assert_eq!(
            Intrinsics::from_config(&square).unwrap(),
            Intrinsics::from_config(&horizontal).unwrap()
        );
    }

    #[test]
    fn explicit_vertical_uses_sensor_height() {
        let cfg = CameraConfig::new(50.0, 36.0, 24.0, SensorFit::Vertical, 1080, 1920);
        let i = Intrinsics::from_config(&cfg).unwrap();
        assert_relative_eq!(i.fx, 1920.0 * 50.0 / 24.0, max_relative = 1e-12);
    }

    #[test]
    fn square_sensor_gives_equal_focals() {
        for fit in [SensorFit::Auto, SensorFit::Horizontal, SensorFit::Vertical] {
            let cfg = CameraConfig::new(35.0, 24.0, 24.0, fit, 800, 600);
            let i = Intrinsics::from_config(&cfg).unwrap();
            assert_relative_eq!(i.fx, i.fy, max_relative = 1e-12);
        }
    }

    #[test]
    fn zero_shift_centers_principal_point() {
        let cfg = CameraConfig::new(85.0, 36.0, 24.0, SensorFit::Auto, 640, 480);
        let i = Intrinsics::from_config(&cfg).unwrap();
        assert_eq!(i.cx, (640.0 - 1.0) / 2.0);
        assert_eq!(i.cy, (480.0 - 1.0) / 2.0);
    }

    #[test]
    fn lens_shift_moves_principal_point() {
        let base = Intrinsics::from_config(&full_frame_1080p()).unwrap();
        let shifted =
            Intrinsics::from_config(&full_frame_1080p().with_shift(0.1, 0.1)).unwrap();
        assert_relative_eq!(shifted.cx, base.cx - 0.1 * 1920.0, max_relative = 1e-12);
        assert_relative_eq!(shifted.cy, base.cy + 0.1 * 1920.0, max_relative = 1e-12);
        assert_eq!(shifted.fx, base.fx);
    }

    #[test]
    fn anisotropic_pixels_scale_fy() {
        let cfg = full_frame_1080p().with_pixel_aspect(1.0, 2.0);
        let i = Intrinsics::from_config(&cfg).unwrap();
        assert_relative_eq!(i.fy, i.fx / 2.0, max_relative = 1e-12);
    }

    #[test]
    fn invalid_configs_fail_fast() {
        let bad_focal = CameraConfig {
            focal_length_mm: 0.0,
            ..full_frame_1080p()
        };
        assert!(matches!(
            Intrinsics::from_config(&bad_focal),
            Err(TruthpackError::Config(_))
        ));

        let bad_res = CameraConfig {
            resolution_x: 0,
            ..full_frame_1080p()
        };
        assert!(matches!(
            Intrinsics::from_config(&bad_res),
            Err(TruthpackError::Config(_))
        ));

        let bad_sensor = CameraConfig {
            sensor_height_mm: -1.0,
            ..full_frame_1080p()
        };
        assert!(matches!(
            Intrinsics::from_config(&bad_sensor),
            Err(TruthpackError::Config(_))
        ));

        let bad_aspect = full_frame_1080p().with_pixel_aspect(0.0, 1.0);
        assert!(matches!(
            Intrinsics::from_config(&bad_aspect),
            Err(TruthpackError::Config(_))
        ));
    }

    #[test]
    fn intrinsic_matrix_layout() {
        let i = Intrinsics::from_config(&full_frame_1080p()).unwrap();
        let m = i.matrix();
        assert_eq!(m[(0, 0)], i.fx);
        assert_eq!(m[(0, 2)], i.cx);
        assert_eq!(m[(1, 1)], i.fy);
        assert_eq!(m[(1, 2)], i.cy);
        assert_eq!(m[(2, 2)], 1.0);
        assert_eq!(m[(1, 0)], 0.0);
    }

    #[test]
    fn scaled_resolution_truncates() {
        assert_eq!(scaled_resolution(1920, 1080, 50.0), (960, 540));
        assert_eq!(scaled_resolution(100, 100, 33.3), (33, 33));
        assert_eq!(scaled_resolution(1920, 1080, 100.0), (1920, 1080));
    }

    #[test]
    fn extrinsics_from_world_inverts() {
        let world = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0));
        let e = Extrinsics::from_world(world).unwrap();
        assert_relative_eq!(e.matrix()[(0, 3)], -1.0, max_relative = 1e-12);
        assert_relative_eq!(e.matrix()[(1, 3)], -2.0, max_relative = 1e-12);
        assert_relative_eq!(e.matrix()[(2, 3)], -3.0, max_relative = 1e-12);
    }

    #[test]
    fn singular_world_transform_is_rejected() {
        assert!(matches!(
            Extrinsics::from_world(Matrix4::zeros()),
            Err(TruthpackError::Config(_))
        ));
    }

    #[test]
    fn config_json_roundtrip() {
        let cfg = full_frame_1080p().with_shift(0.05, -0.02);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: CameraConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
