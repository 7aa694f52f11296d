use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage, imageops};
use std::io::Cursor;

use crate::capture::error::CaptureError;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// 差异哈希(dHash)
///
/// `resolution` 取 2..=8，结果最多占用 64 位
pub fn dhash(image: &RgbaImage, resolution: u32) -> u64 {
    let resolution = resolution.clamp(2, 8);
    let resized = imageops::resize(
        image,
        resolution + 1,
        resolution,
        imageops::FilterType::Lanczos3,
    );
    let gray = imageops::grayscale(&resized);

    let mut hash = 0u64;
    for y in 0..resolution {
        for x in 0..resolution {
            let left = gray.get_pixel(x, y)[0];
            let right = gray.get_pixel(x + 1, y)[0];
            if left < right {
                hash |= 1 << (y * resolution + x);
            }
        }
    }
    hash
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CaptureError> {
    let mut png_bytes: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(png_bytes)
}

pub fn png_data_url(png_bytes: &[u8]) -> String {
    format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png_bytes))
}

/// 解析 PNG data URL，返回原始 PNG 字节
///
/// 只校验前缀和 base64，不解码图像
pub fn decode_png_data_url(data_url: &str) -> Option<Vec<u8>> {
    let payload = data_url.strip_prefix(PNG_DATA_URL_PREFIX)?;
    STANDARD.decode(payload.trim()).ok()
}
