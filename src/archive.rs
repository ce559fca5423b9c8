use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use ndarray::{Array, Array2, Dimension};
use ndarray_npy::{NpzReader, NpzWriter, ReadableElement, WritableElement};

use crate::{
    camera::{Extrinsics, Intrinsics},
    error::{TruthpackError, TruthpackResult},
    frame::{FrameBuffers, FrameIndex},
};

/// File extension of per-frame archives.
pub const ARCHIVE_EXT: &str = "npz";

/// Archive location for a frame: `<base>/<frame:04>.npz`.
///
/// Frame numbers are zero-padded to four digits; larger indices widen the
/// name without truncation.
pub fn archive_path(base_dir: &Path, frame: FrameIndex) -> PathBuf {
    base_dir.join(format!("{:04}.{ARCHIVE_EXT}", frame.0))
}

/// One frame's ground truth, ready to persist.
///
/// The entry names and shapes (`intr` 3x3, `extr` 4x4, `normal_map` HxWx3,
/// `z_map` HxW) are a compatibility contract with downstream consumers.
/// Optional passes add `obj_ind` (HxW) and `flow` (HxWx4) entries without
/// displacing the required four.
#[derive(Clone, Debug)]
pub struct FrameArchive {
    pub intr: Array2<f64>,
    pub extr: Array2<f64>,
    pub buffers: FrameBuffers,
}

impl FrameArchive {
    pub fn new(intrinsics: &Intrinsics, extrinsics: &Extrinsics, buffers: FrameBuffers) -> Self {
        let intr_mat = intrinsics.matrix();
        let extr_mat = extrinsics.matrix();
        Self {
            intr: Array2::from_shape_fn((3, 3), |(r, c)| intr_mat[(r, c)]),
            extr: Array2::from_shape_fn((4, 4), |(r, c)| extr_mat[(r, c)]),
            buffers,
        }
    }

    /// Write the archive for `frame` under `base_dir`, creating the directory
    /// if needed.
    ///
    /// The archive is assembled in a `.tmp` sibling and renamed into place,
    /// so a partially written file is never observable at the final path.
    /// Re-running for the same frame overwrites the prior archive.
    pub fn write(&self, base_dir: &Path, frame: FrameIndex) -> TruthpackResult<PathBuf> {
        std::fs::create_dir_all(base_dir).with_context(|| {
            format!("failed to create archive directory '{}'", base_dir.display())
        })?;

        let path = archive_path(base_dir, frame);
        let tmp = path.with_extension(format!("{ARCHIVE_EXT}.tmp"));

        let file = File::create(&tmp)
            .with_context(|| format!("failed to create archive '{}'", tmp.display()))?;
        let mut npz = NpzWriter::new_compressed(file);

        write_entry(&mut npz, "intr", &self.intr, &path)?;
        write_entry(&mut npz, "extr", &self.extr, &path)?;
        write_entry(&mut npz, "normal_map", &self.buffers.normal, &path)?;
        write_entry(&mut npz, "z_map", &self.buffers.z, &path)?;
        if let Some(obj_ind) = &self.buffers.obj_ind {
            write_entry(&mut npz, "obj_ind", obj_ind, &path)?;
        }
        if let Some(flow) = &self.buffers.flow {
            write_entry(&mut npz, "flow", flow, &path)?;
        }

        npz.finish().map_err(|e| {
            TruthpackError::archive(format!("failed to finalize '{}': {e}", tmp.display()))
        })?;

        std::fs::rename(&tmp, &path).with_context(|| {
            format!(
                "failed to move archive into place ({} -> {})",
                tmp.display(),
                path.display()
            )
        })?;

        tracing::debug!(path = %path.display(), frame = frame.0, "wrote frame archive");
        Ok(path)
    }

    /// Load an archive previously produced by [`FrameArchive::write`].
    pub fn read(path: &Path) -> TruthpackResult<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open archive '{}'", path.display()))?;
        let mut npz = NpzReader::new(file).map_err(|e| {
            TruthpackError::archive(format!("failed to read archive '{}': {e}", path.display()))
        })?;

        let names = npz.names().map_err(|e| {
            TruthpackError::archive(format!("failed to list entries in '{}': {e}", path.display()))
        })?;
        let has_entry = |name: &str| {
            names
                .iter()
                .any(|n| n.as_str() == name || n.strip_suffix(".npy") == Some(name))
        };

        let intr: Array2<f64> = read_entry(&mut npz, "intr", path)?;
        let extr: Array2<f64> = read_entry(&mut npz, "extr", path)?;
        let normal = read_entry(&mut npz, "normal_map", path)?;
        let z = read_entry(&mut npz, "z_map", path)?;
        let obj_ind = if has_entry("obj_ind") {
            Some(read_entry(&mut npz, "obj_ind", path)?)
        } else {
            None
        };
        let flow = if has_entry("flow") {
            Some(read_entry(&mut npz, "flow", path)?)
        } else {
            None
        };

        Ok(Self {
            intr,
            extr,
            buffers: FrameBuffers {
                normal,
                z,
                obj_ind,
                flow,
            },
        })
    }
}

fn write_entry<A, D>(
    npz: &mut NpzWriter<File>,
    name: &str,
    array: &Array<A, D>,
    path: &Path,
) -> TruthpackResult<()>
where
    A: WritableElement,
    D: Dimension,
{
    npz.add_array(name, array).map_err(|e| {
        TruthpackError::archive(format!(
            "failed to write entry '{name}' to '{}': {e}",
            path.display()
        ))
    })
}

// Entry names are stored with a `.npy` suffix inside the zip (numpy's savez
// convention); accept either spelling from the reader.
fn read_entry<A, D>(npz: &mut NpzReader<File>, name: &str, path: &Path) -> TruthpackResult<Array<A, D>>
where
    A: ReadableElement,
    D: Dimension,
{
    npz.by_name(&format!("{name}.npy"))
        .or_else(|_| npz.by_name(name))
        .map_err(|e| {
            TruthpackError::archive(format!(
                "failed to read entry '{name}' from '{}': {e}",
                path.display()
            ))
        })
}
