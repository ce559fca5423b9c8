use std::path::Path;

use anyhow::Context as _;
use image::{ImageBuffer, ImageFormat, Luma, Rgb};
use ndarray::{Array2, Array3};

use crate::error::{TruthpackError, TruthpackResult};

/// Write an 8-bit RGB visualization of a normal map.
///
/// Components are mapped from [-1, 1] to [0, 255]; out-of-range values are
/// clamped.
pub fn write_normal_png(normal: &Array3<f32>, path: &Path) -> TruthpackResult<()> {
    let (h, w, c) = normal.dim();
    if c != 3 {
        return Err(TruthpackError::shape(format!(
            "normal map must have 3 channels, got {c}"
        )));
    }

    let img = ImageBuffer::from_fn(w as u32, h as u32, |x, y| {
        let px = |ch: usize| {
            let v = normal[[y as usize, x as usize, ch]];
            ((f64::from(v) * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8
        };
        Rgb([px(0), px(1), px(2)])
    });
    save_png(&img, path)
}

/// Write a 16-bit grayscale visualization of a depth map, linearly
/// normalized over the finite depth range. A constant (or entirely
/// non-finite) map writes as black.
pub fn write_depth_png(z: &Array2<f32>, path: &Path) -> TruthpackResult<()> {
    let (h, w) = z.dim();

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in z.iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    let range = f64::from(max) - f64::from(min);

    let img = ImageBuffer::from_fn(w as u32, h as u32, |x, y| {
        let v = z[[y as usize, x as usize]];
        if !v.is_finite() || range <= 0.0 {
            return Luma([0u16]);
        }
        let t = (f64::from(v) - f64::from(min)) / range;
        Luma([(t.clamp(0.0, 1.0) * f64::from(u16::MAX)).round() as u16])
    });
    save_png(&img, path)
}

fn save_png<P, C>(img: &ImageBuffer<P, C>, path: &Path) -> TruthpackResult<()>
where
    P: image::PixelWithColorType,
    [P::Subpixel]: image::EncodableLayout,
    C: std::ops::Deref<Target = [P::Subpixel]>,
{
    let tmp = path.with_extension("png.tmp");
    img.save_with_format(&tmp, ImageFormat::Png).map_err(|e| {
        TruthpackError::archive(format!("failed to write preview '{}': {e}", tmp.display()))
    })?;
    std::fs::rename(&tmp, path).with_context(|| {
        format!(
            "failed to move preview into place ({} -> {})",
            tmp.display(),
            path.display()
        )
    })?;
    Ok(())
}
