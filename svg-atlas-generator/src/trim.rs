/// Tight cropping of raster buffers to their non-transparent bounds
use image::RgbaImage;

/// Crops `source` to the minimal bounding box containing any pixel with a
/// non-zero alpha. Returns `None` for a zero-sized or fully transparent
/// buffer; the caller decides whether that is fatal.
///
/// The four directional scans each stop at the first hit, and every scan
/// after the first is restricted to the ranges already established. The box
/// is axis-aligned, so pixels skipped that way are already known to be
/// inside it.
pub fn trim(source: &RgbaImage) -> Option<RgbaImage> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    // Leftmost column with a visible pixel; scanning all columns also
    // answers whether the buffer is empty.
    let x_min = (0..width).find(|&x| (0..height).any(|y| source.get_pixel(x, y)[3] != 0))?;

    let y_min = (0..height).find(|&y| (x_min..width).any(|x| source.get_pixel(x, y)[3] != 0))?;

    let x_max =
        (x_min..width).rev().find(|&x| (y_min..height).any(|y| source.get_pixel(x, y)[3] != 0))?;

    let y_max = (y_min..height)
        .rev()
        .find(|&y| (x_min..=x_max).any(|x| source.get_pixel(x, y)[3] != 0))?;

    // Inclusive bounds converted to a half-open width/height.
    let cropped_width = x_max - x_min + 1;
    let cropped_height = y_max - y_min + 1;

    Some(image::imageops::crop_imm(source, x_min, y_min, cropped_width, cropped_height).to_image())
}
