use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Colour painted over the name plate of a sign.
pub const MASK_FILL: Rgba<u8> = Rgba([255, 255, 150, 255]);

/// Horizontal inset from the left and right edges.
const SIDE_INSET: u32 = 3;
/// Rows above the three-quarter line that are also covered.
const TOP_LIFT: u32 = 5;
/// Rows left uncovered at the bottom edge, counted from the last row.
const BOTTOM_INSET: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("failed to decode photo: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
}

/// Inclusive pixel rectangle covered by the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskBand {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl MaskBand {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.left..=self.right).contains(&x) && (self.top..=self.bottom).contains(&y)
    }
}

/// The band over the bottom quarter of a `width` × `height` photo, or `None`
/// when the photo is too small to hold it.
pub fn mask_band(width: u32, height: u32) -> Option<MaskBand> {
    if width == 0 || height == 0 {
        return None;
    }

    let band = MaskBand {
        left: SIDE_INSET,
        top: (height * 3 / 4).saturating_sub(TOP_LIFT),
        right: width.checked_sub(SIDE_INSET)?.min(width - 1),
        bottom: height.checked_sub(BOTTOM_INSET)?.min(height - 1),
    };

    (band.left <= band.right && band.top <= band.bottom).then_some(band)
}

/// Covers the bottom quarter of `photo`. Pixels outside [`mask_band`] are
/// copied unchanged.
pub fn mask_image(photo: &DynamicImage) -> RgbaImage {
    let mut masked = photo.to_rgba8();

    if let Some(band) = mask_band(masked.width(), masked.height()) {
        let rect = Rect::at(band.left as i32, band.top as i32)
            .of_size(band.right - band.left + 1, band.bottom - band.top + 1);
        draw_filled_rect_mut(&mut masked, rect, MASK_FILL);
    }

    masked
}

/// Decodes an encoded photo and masks it.
///
/// # Errors
/// Returns [`ImageLoadError::Decode`] when `bytes` is not a readable image.
pub fn mask_photo(bytes: &[u8]) -> Result<RgbaImage, ImageLoadError> {
    let photo = image::load_from_memory(bytes)?;
    Ok(mask_image(&photo))
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ImageLoadError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(ImageLoadError::Encode)?;
    Ok(buffer.into_inner())
}
