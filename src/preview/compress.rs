use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ImageBuffer, RgbImage};

use crate::camera::error::{CaptureError, Result};
use crate::camera::types::Resolution;

/// JPEG quality used for captured stills.
pub const CAPTURE_QUALITY: u8 = 92;

fn rgb_image(data: Vec<u8>, resolution: Resolution) -> Result<RgbImage> {
    ImageBuffer::from_raw(resolution.width, resolution.height, data).ok_or_else(|| {
        CaptureError::Encode(format!("buffer does not match {resolution} RGB dimensions"))
    })
}

/// Scale packed RGB data to `target` using `fast_image_resize`.
///
/// Returns the input untouched when it already has the target size.
pub fn resize_rgb(data: &[u8], source: Resolution, target: Resolution) -> Result<Vec<u8>> {
    use fast_image_resize as fr;
    use fr::images::Image;

    if source == target {
        return Ok(data.to_vec());
    }

    let src_image = Image::from_vec_u8(source.width, source.height, data.to_vec(), fr::PixelType::U8x3)
        .map_err(|e| CaptureError::Resize(e.to_string()))?;
    let mut dst_image = Image::new(target.width, target.height, fr::PixelType::U8x3);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, None)
        .map_err(|e| CaptureError::Resize(e.to_string()))?;

    Ok(dst_image.into_vec())
}

/// Flip packed RGB data left-to-right, as a front-facing camera preview shows it.
pub fn mirror_rgb(data: Vec<u8>, resolution: Resolution) -> Result<Vec<u8>> {
    let img = rgb_image(data, resolution)?;
    Ok(imageops::flip_horizontal(&img).into_raw())
}

/// Compress packed RGB data to JPEG at the given quality (1-100).
pub fn compress_jpeg(data: Vec<u8>, resolution: Resolution, quality: u8) -> Result<Vec<u8>> {
    let img = rgb_image(data, resolution)?;

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(buf)
}
