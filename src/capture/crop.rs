// capture/crop.rs - Rectangular Crop of Saved Screenshots

use std::path::Path;

use image::GenericImageView;

use super::CaptureError;
use crate::app::CropMargins;

/// Region kept after trimming `margins` from a `width`x`height` image,
/// as `(x, y, width, height)`
pub fn crop_rect(width: u32, height: u32, margins: CropMargins) -> Result<(u32, u32, u32, u32), CaptureError> {
    let invalid = || CaptureError::InvalidCrop { width, height, margins };

    let right_edge = width.checked_sub(margins.right).ok_or_else(invalid)?;
    let bottom_edge = height.checked_sub(margins.bottom).ok_or_else(invalid)?;
    if right_edge <= margins.left || bottom_edge <= margins.top {
        return Err(invalid());
    }

    Ok((
        margins.left,
        margins.top,
        right_edge - margins.left,
        bottom_edge - margins.top,
    ))
}

/// Crop the image at `path` and overwrite it. Returns the new dimensions.
pub fn crop_in_place(path: &Path, margins: CropMargins) -> Result<(u32, u32), CaptureError> {
    let image_err = |source| CaptureError::Image {
        path: path.to_path_buf(),
        source,
    };

    let img = image::open(path).map_err(image_err)?;
    let (width, height) = img.dimensions();
    let (x, y, w, h) = crop_rect(width, height, margins)?;

    img.crop_imm(x, y, w, h).save(path).map_err(image_err)?;
    Ok((w, h))
}
