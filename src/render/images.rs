//! Decoding of logo and photo data URIs into raw RGB for embedding.

use image::{DynamicImage, GenericImageView};

use crate::data_url;

/// Longest edge kept for embedded images; larger ones are scaled down.
const MAX_IMAGE_EDGE: u32 = 1200;

/// An image ready to be written as an 8-bit DeviceRGB XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Decode a `data:image/...;base64,` URI. Errors are plain reasons, meant for
/// render warnings.
pub fn decode_data_url(url: &str) -> Result<DecodedImage, String> {
    let (_, bytes) = data_url::decode(url).map_err(|e| e.to_string())?;
    let img = image::load_from_memory(&bytes).map_err(|e| format!("undecodable image: {}", e))?;
    Ok(flatten(downscale(img)))
}

fn downscale(img: DynamicImage) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width > MAX_IMAGE_EDGE || height > MAX_IMAGE_EDGE {
        img.thumbnail(MAX_IMAGE_EDGE, MAX_IMAGE_EDGE)
    } else {
        img
    }
}

/// Composite over white so transparent logos do not print black.
fn flatten(img: DynamicImage) -> DecodedImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);

    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        for channel in [r, g, b] {
            let blended = (channel as u32 * alpha + 255 * (255 - alpha)) / 255;
            rgb.push(blended as u8);
        }
    }

    DecodedImage { width, height, rgb }
}
